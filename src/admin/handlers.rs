use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::directory::{wire::StatusMessage, Directory};
use crate::gateway::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub version: &'static str,
    pub status: &'static str,
    /// `embedded` or the remote directory URL.
    pub directory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_backends: Option<usize>,
    pub failed_backends: usize,
    pub cache_entries: usize,
    pub uptime_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct FailedBackends {
    pub failed: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub ttl_ms: u64,
}

pub async fn status(State(state): State<AppState>) -> Json<GatewayStatus> {
    let (directory, registered_backends) = match state.resolver.directory() {
        Directory::Embedded(store) => ("embedded".to_string(), Some(store.len().await)),
        Directory::Remote(client) => (client.base_url().to_string(), None),
    };

    Json(GatewayStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        directory,
        registered_backends,
        failed_backends: state.balancer.failed_backends().len(),
        cache_entries: state.cache.len(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

pub async fn failed_backends(State(state): State<AppState>) -> Json<FailedBackends> {
    Json(FailedBackends {
        failed: state.balancer.failed_backends(),
    })
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(CacheStats {
        entries: state.cache.len(),
        ttl_ms: state.cache.default_ttl().as_millis() as u64,
    })
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<StatusMessage> {
    let removed = state.cache.len();
    state.cache.clear();
    tracing::info!(removed, "Response cache cleared via admin API");
    Json(StatusMessage::ok(format!("Cache cleared ({} entries)", removed)))
}

pub async fn reset_balancer(State(state): State<AppState>) -> Json<StatusMessage> {
    state.balancer.reset();
    Json(StatusMessage::ok("Load balancer reset"))
}
