//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap a role's Axum router with the shared middleware stack
//!   (tracing, request timeout, body limit, request ID)
//! - Bind server to listener
//! - Drain in-flight requests when shutdown is signalled

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};

/// HTTP server for one role (directory or gateway).
pub struct HttpServer {
    name: &'static str,
    router: Router,
}

impl HttpServer {
    /// Wrap `routes` with the middleware stack configured in `config`.
    pub fn new(name: &'static str, routes: Router, config: &AppConfig) -> Self {
        let router = Self::build_router(routes, config);
        Self { name, router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(routes: Router, config: &AppConfig) -> Router {
        routes.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                .map_response(|res: axum::http::Response<_>| res.map(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(config.limits.max_body_size)),
        )
    }

    /// The fully layered router, for in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(server = self.name, address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(server = self.name, "HTTP server stopped");
        Ok(())
    }
}
