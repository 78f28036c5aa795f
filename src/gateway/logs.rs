//! Pass-through to the log store.
//!
//! `/api/logs*` and `/api/query*` are relayed verbatim (method, path, query,
//! body) to the configured log store, without balancing or failover.

use std::time::Duration;

use axum::{
    body::Body,
    http::Response,
};

use crate::gateway::forwarder::{relay, OutboundRequest, UpstreamClient};
use crate::http::ApiError;
use crate::resilience::with_deadline;

#[derive(Debug)]
pub struct LogRelay {
    client: UpstreamClient,
    base_url: Option<String>,
    timeout: Duration,
}

impl LogRelay {
    pub fn new(client: UpstreamClient, base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    pub async fn relay(&self, request: &OutboundRequest) -> Result<Response<Body>, ApiError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| ApiError::ServiceUnavailable("Logger service is not configured".to_string()))?;

        let outbound = request
            .build(base)
            .map_err(|e| ApiError::Internal(format!("Failed to forward to logger: {}", e)))?;

        match with_deadline(self.timeout, self.client.request(outbound)).await {
            Ok(response) => Ok(relay(response)),
            Err(e) => {
                tracing::error!(logger = %base, error = %e, "Log store unreachable");
                Err(ApiError::Internal(format!("Failed to forward to logger: {}", e)))
            }
        }
    }
}
