//! Minimal model backend for trying the gateway locally.
//!
//! ```text
//! cargo run -- gateway &
//! REGISTRY_URL=http://localhost:3030 cargo run --example echo_backend
//! curl -XPOST localhost:3030/api/process/chat -d '{"modelName":"echo","content":"hi"}' \
//!      -H 'content-type: application/json'
//! ```
//!
//! Environment: `BACKEND_PORT` (default 4000), `REGISTRY_URL`
//! (default http://localhost:3040), `SERVICE_URL` (default
//! http://localhost:<port>).

use std::time::Duration;

use axum::{
    extract::Path,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use model_gateway::config::ObservabilityConfig;
use model_gateway::directory::{DirectoryClient, SelfRegistration};
use model_gateway::lifecycle::signals;
use model_gateway::observability::logging;
use model_gateway::registry::CapabilityDecl;

async fn process(Path(kind): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    let content = body.get("content").cloned().unwrap_or(Value::Null);
    let reply = match kind.as_str() {
        "summarize" => json!({ "summary": content }),
        _ => json!({ "actor": "assistant", "content": content }),
    };
    Json(reply)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(&ObservabilityConfig::default());

    let port: u16 = std::env::var("BACKEND_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4000);
    let registry =
        std::env::var("REGISTRY_URL").unwrap_or_else(|_| "http://localhost:3040".to_string());
    let service_url =
        std::env::var("SERVICE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));

    let app = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/api/process/{kind}", post(process));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Echo backend listening");

    let registration = SelfRegistration::new(
        DirectoryClient::new(&registry, Duration::from_secs(5))?,
        service_url,
        vec![
            CapabilityDecl::new("echo", "chat"),
            CapabilityDecl::new("echo-summary", "summarize"),
        ],
    );
    let announcer = registration.clone();
    tokio::spawn(async move {
        if let Err(e) = announcer.register().await {
            tracing::error!(error = %e, "Could not register with directory");
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(signals::wait_for_shutdown_signal())
        .await?;

    registration.unregister().await;
    Ok(())
}
