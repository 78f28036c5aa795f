//! HTTP client for a remote directory service.
//!
//! Used by the gateway when it runs against a standalone registry, by
//! backends registering themselves, and by `gatewayctl`.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::directory::wire::{
    BackendList, HealthStatus, ModelList, RegisterRequest, ServicesResponse, StatusMessage,
    UnregisterRequest,
};
use crate::registry::{BackendRecord, CapabilityDecl};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("invalid directory URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Request(#[from] reqwest::Error),

    #[error("Registry returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: Client,
    base: Url,
}

impl DirectoryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|_| DirectoryError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(DirectoryError::InvalidUrl(base_url.to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn register(
        &self,
        service_url: &str,
        models: &[CapabilityDecl],
    ) -> Result<StatusMessage, DirectoryError> {
        let body = RegisterRequest {
            url: Some(service_url.to_string()),
            models: Some(models.to_vec()),
        };
        let response = self
            .http
            .post(self.endpoint(&["register"])?)
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn unregister(&self, service_url: &str) -> Result<StatusMessage, DirectoryError> {
        let body = UnregisterRequest {
            url: Some(service_url.to_string()),
        };
        let response = self
            .http
            .delete(self.endpoint(&["unregister"])?)
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn services(&self) -> Result<BTreeMap<String, BackendRecord>, DirectoryError> {
        let response = self.http.get(self.endpoint(&["services"])?).send().await?;
        let body: ServicesResponse = decode(response).await?;
        Ok(body.services)
    }

    pub async fn models_by_type(&self, kind: &str) -> Result<Vec<String>, DirectoryError> {
        let url = self.endpoint(&["services", "types", kind])?;
        let body: ModelList = decode(self.http.get(url).send().await?).await?;
        Ok(body.available_models)
    }

    /// Healthy backend URLs offering capability `name`.
    pub async fn backends_for_model(&self, name: &str) -> Result<Vec<String>, DirectoryError> {
        let url = self.endpoint(&["services", "models", name])?;
        let body: BackendList = decode(self.http.get(url).send().await?).await?;
        Ok(body.services)
    }

    pub async fn health(&self) -> Result<HealthStatus, DirectoryError> {
        let response = self.http.get(self.endpoint(&["health"])?).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DirectoryError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DirectoryError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}
