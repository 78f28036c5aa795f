//! Gateway administration API.
//!
//! Every route sits behind a bearer token (`admin.api_key`) and is only
//! mounted when `admin.enabled` is set.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::gateway::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(handlers::status))
        .route("/admin/failed", get(handlers::failed_backends))
        .route("/admin/cache", get(handlers::cache_stats).delete(handlers::clear_cache))
        .route("/admin/balancer/reset", post(handlers::reset_balancer))
        .route_layer(middleware::from_fn_with_state(state, auth::require_api_key))
}
