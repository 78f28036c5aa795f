//! Forwarding gateway.
//!
//! # Data Flow
//! ```text
//! POST /api/process/{kind}
//!     → handlers.rs (extract modelName / model)
//!     → resolver.rs (cache → directory: healthy backends for the model)
//!     → forwarder.rs (round-robin pick, relay, fail over on 5xx / no response)
//!     → relay backend status + body
//!
//! GET /api/models[/types/{type}] → resolver.rs (cached listings)
//! /api/logs*, /api/query*        → logs.rs (verbatim relay to the log store)
//! /admin/*                       → admin module (bearer token)
//! ```
//!
//! # Design Decisions
//! - Without a remote directory URL the gateway embeds the registry and
//!   serves the directory routes itself
//! - Unknown routes answer with the JSON error shape, not an empty 404

pub mod forwarder;
pub mod handlers;
pub mod logs;
pub mod resolver;
pub mod state;

use axum::{
    routing::{any, get, post},
    Router,
};

use crate::{admin, directory};

pub use forwarder::{Forwarder, OutboundRequest};
pub use resolver::{CachedLookup, Resolver};
pub use state::AppState;

/// All gateway routes, including the directory routes in embedded mode.
pub fn router(state: AppState) -> Router {
    let mut routes = Router::new()
        .route("/api/process/{kind}", post(handlers::process))
        .route("/api/models", get(handlers::list_models))
        .route("/api/models/types/{kind}", get(handlers::list_models_by_type))
        .route("/api/logs", any(handlers::relay_logs))
        .route("/api/logs/{*rest}", any(handlers::relay_logs))
        .route("/api/query", any(handlers::relay_logs))
        .route("/api/query/{*rest}", any(handlers::relay_logs));

    if state.admin_enabled {
        routes = routes.merge(admin::router(state.clone()));
    }

    let routes = routes.with_state(state.clone());
    let routes = match state.resolver.directory().embedded_store() {
        Some(store) => routes.merge(directory::router(store.clone())),
        None => routes.route("/health", get(directory::routes::health)),
    };
    routes.fallback(handlers::not_found)
}
