//! Cached directory lookups.
//!
//! Keys:
//! - `model:<name>` → healthy backend URLs for a capability
//! - `type:<type>`  → capability names of a type
//! - `all-models`   → every capability offered by a healthy backend

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::directory::{Directory, DirectoryError};
use crate::observability::metrics;

pub const ALL_MODELS_KEY: &str = "all-models";

/// Value stored in the gateway's response cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedLookup {
    Backends(Vec<String>),
    Models(Vec<String>),
}

#[derive(Debug)]
pub struct Resolver {
    directory: Directory,
    cache: Arc<ResponseCache<CachedLookup>>,
}

impl Resolver {
    pub fn new(directory: Directory, cache: Arc<ResponseCache<CachedLookup>>) -> Self {
        Self { directory, cache }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Healthy backends for `model`. An empty list is cached like any other.
    pub async fn candidates(&self, model: &str) -> Result<Vec<String>, DirectoryError> {
        let key = format!("model:{}", model);
        if let Some(CachedLookup::Backends(urls)) = self.cache.get(&key) {
            metrics::record_cache_lookup(true);
            tracing::debug!(model = %model, backends = urls.len(), "Cache hit");
            return Ok(urls);
        }
        metrics::record_cache_lookup(false);

        let urls = self.directory.backends_for_model(model).await?;
        tracing::debug!(model = %model, backends = urls.len(), "Resolved backends from directory");
        self.cache.set(key, CachedLookup::Backends(urls.clone()));
        Ok(urls)
    }

    pub async fn models_by_type(&self, kind: &str) -> Result<Vec<String>, DirectoryError> {
        let key = format!("type:{}", kind);
        if let Some(models) = self.cached_models(&key) {
            return Ok(models);
        }
        let models = self.directory.models_by_type(kind).await?;
        self.cache.set(key, CachedLookup::Models(models.clone()));
        Ok(models)
    }

    pub async fn all_models(&self) -> Result<Vec<String>, DirectoryError> {
        if let Some(models) = self.cached_models(ALL_MODELS_KEY) {
            return Ok(models);
        }
        let models = self.directory.all_models().await?;
        self.cache.set(ALL_MODELS_KEY, CachedLookup::Models(models.clone()));
        Ok(models)
    }

    fn cached_models(&self, key: &str) -> Option<Vec<String>> {
        let hit = match self.cache.get(key) {
            Some(CachedLookup::Models(models)) => Some(models),
            _ => None,
        };
        metrics::record_cache_lookup(hit.is_some());
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CapabilityDecl, RegistryStore};
    use std::time::Duration;

    fn resolver(store: Arc<RegistryStore>) -> Resolver {
        Resolver::new(
            Directory::Embedded(store),
            Arc::new(ResponseCache::new(Duration::from_secs(30))),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_candidates_are_cached_for_ttl() {
        let store = Arc::new(RegistryStore::new());
        store.register("http://b1", &[CapabilityDecl::new("echo", "chat")]).await.unwrap();
        let resolver = resolver(store.clone());

        assert_eq!(resolver.candidates("echo").await.unwrap(), vec!["http://b1"]);

        // A new backend is invisible until the entry expires.
        store.register("http://b2", &[CapabilityDecl::new("echo", "chat")]).await.unwrap();
        assert_eq!(resolver.candidates("echo").await.unwrap(), vec!["http://b1"]);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(
            resolver.candidates("echo").await.unwrap(),
            vec!["http://b1", "http://b2"]
        );
    }

    #[tokio::test]
    async fn test_empty_result_is_cached() {
        let store = Arc::new(RegistryStore::new());
        let resolver = resolver(store.clone());

        assert!(resolver.candidates("echo").await.unwrap().is_empty());
        store.register("http://b1", &[CapabilityDecl::new("echo", "chat")]).await.unwrap();
        assert!(resolver.candidates("echo").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_listings_use_separate_keys() {
        let store = Arc::new(RegistryStore::new());
        store
            .register("http://b1", &[CapabilityDecl::new("echo", "chat"), CapabilityDecl::new("tldr", "summarize")])
            .await
            .unwrap();
        let resolver = resolver(store);

        assert_eq!(resolver.all_models().await.unwrap(), vec!["echo", "tldr"]);
        assert_eq!(resolver.models_by_type("chat").await.unwrap(), vec!["echo"]);
        assert_eq!(resolver.candidates("tldr").await.unwrap(), vec!["http://b1"]);
        assert_eq!(resolver.cache.len(), 3);
    }
}
