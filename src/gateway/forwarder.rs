//! Request forwarding with failover.
//!
//! # Data Flow
//! ```text
//! candidates ─▶ balancer.select_backend ─▶ POST <backend><path>
//!                    ▲                            │
//!                    │  5xx / no response         │ 2xx-4xx
//!                    └── mark_failed, drop it ◀───┤
//!                                                 ▼
//!                                         relay status + body
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, Method, Request, Response},
};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::http::{ApiError, X_REQUEST_ID};
use crate::load_balancer::LoadBalancer;
use crate::observability::metrics;
use crate::resilience::{with_deadline, RetryPolicy, UpstreamError};

pub type UpstreamClient = Client<HttpConnector, Body>;

/// The parts of an inbound request that are relayed upstream.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Path and query appended to the backend base URL.
    pub path_and_query: String,
    pub content_type: Option<HeaderValue>,
    pub request_id: Option<HeaderValue>,
    pub body: Bytes,
}

impl OutboundRequest {
    pub(crate) fn build(&self, base_url: &str) -> Result<Request<Body>, UpstreamError> {
        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(format!("{}{}", base_url, self.path_and_query))
            .header(
                header::CONTENT_TYPE,
                self.content_type
                    .clone()
                    .unwrap_or_else(|| HeaderValue::from_static("application/json")),
            );
        if let Some(id) = &self.request_id {
            builder = builder.header(X_REQUEST_ID, id.clone());
        }
        builder
            .body(Body::from(self.body.clone()))
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }
}

#[derive(Debug)]
pub struct Forwarder {
    client: UpstreamClient,
    balancer: Arc<dyn LoadBalancer>,
    policy: RetryPolicy,
    upstream_timeout: Duration,
}

impl Forwarder {
    pub fn new(
        client: UpstreamClient,
        balancer: Arc<dyn LoadBalancer>,
        policy: RetryPolicy,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            client,
            balancer,
            policy,
            upstream_timeout,
        }
    }

    /// Forward `request` to one of `candidates`, failing over on 5xx or
    /// network errors. When attempts or candidates run out, the most recent
    /// backend response is relayed unchanged; only when no backend answered
    /// at all does the gateway produce its own 500.
    pub async fn forward(
        &self,
        model: &str,
        mut candidates: Vec<String>,
        request: &OutboundRequest,
    ) -> Result<Response<Body>, ApiError> {
        let mut last_response: Option<Response<Incoming>> = None;
        let mut last_error = String::new();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let Some(target) = self.balancer.select_backend(model, &candidates) else {
                return Err(ApiError::ServiceUnavailable(format!(
                    "All services for model {} are currently unavailable",
                    model
                )));
            };

            tracing::debug!(model = %model, backend = %target, attempt, "Forwarding request");
            let reason = match self.send(&target, request).await {
                Ok(response) if !RetryPolicy::is_backend_failure(response.status()) => {
                    return Ok(relay(response));
                }
                Ok(response) => {
                    let reason = format!("backend returned {}", response.status());
                    last_response = Some(response);
                    reason
                }
                Err(e) => {
                    last_error = e.to_string();
                    last_error.clone()
                }
            };

            tracing::warn!(model = %model, backend = %target, attempt, reason = %reason, "Backend request failed");
            self.balancer.mark_failed(&target);
            metrics::record_backend_failure(&target);
            candidates.retain(|url| url != &target);

            if !self.policy.should_retry(attempt, candidates.len()) {
                return match last_response {
                    Some(response) => Ok(relay(response)),
                    None => Err(ApiError::Internal(format!(
                        "Failed to process request: {}",
                        last_error
                    ))),
                };
            }
            metrics::record_retry();
        }
    }

    async fn send(
        &self,
        base_url: &str,
        request: &OutboundRequest,
    ) -> Result<Response<Incoming>, UpstreamError> {
        let outbound = request.build(base_url)?;
        with_deadline(self.upstream_timeout, self.client.request(outbound)).await
    }
}

/// Hop-by-hop headers are connection-scoped and never relayed.
const HOP_BY_HOP: [header::HeaderName; 6] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove("keep-alive");
}

/// Relay an upstream response body and status unchanged.
pub fn relay(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
