//! Where the gateway reads backend information from.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::directory::client::{DirectoryClient, DirectoryError};
use crate::registry::RegistryStore;

/// Either a registry living in this process or a remote directory service.
#[derive(Debug, Clone)]
pub enum Directory {
    Embedded(Arc<RegistryStore>),
    Remote(DirectoryClient),
}

impl Directory {
    pub fn embedded_store(&self) -> Option<&Arc<RegistryStore>> {
        match self {
            Directory::Embedded(store) => Some(store),
            Directory::Remote(_) => None,
        }
    }

    /// Healthy backend URLs for capability `name`.
    pub async fn backends_for_model(&self, name: &str) -> Result<Vec<String>, DirectoryError> {
        match self {
            Directory::Embedded(store) => Ok(store.list_by_model(name).await),
            Directory::Remote(client) => client.backends_for_model(name).await,
        }
    }

    pub async fn models_by_type(&self, kind: &str) -> Result<Vec<String>, DirectoryError> {
        match self {
            Directory::Embedded(store) => Ok(store.list_by_type(kind).await),
            Directory::Remote(client) => client.models_by_type(kind).await,
        }
    }

    /// Sorted union of capability names offered by healthy backends.
    pub async fn all_models(&self) -> Result<Vec<String>, DirectoryError> {
        let services = match self {
            Directory::Embedded(store) => store.list_all().await,
            Directory::Remote(client) => client.services().await?,
        };
        let names: BTreeSet<String> = services
            .into_values()
            .filter(|record| record.healthy)
            .flat_map(|record| record.models.into_keys())
            .collect();
        Ok(names.into_iter().collect())
    }
}
