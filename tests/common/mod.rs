//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use model_gateway::config::AppConfig;
use model_gateway::lifecycle::{startup, Shutdown};

/// A mock backend listening on an ephemeral port.
#[derive(Clone)]
pub struct MockBackend {
    pub url: String,
    hits: Arc<AtomicU32>,
    last_request_id: Arc<Mutex<Option<String>>>,
}

impl MockBackend {
    /// Requests received outside `/health`.
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_request_id(&self) -> Option<String> {
        self.last_request_id.lock().unwrap().clone()
    }
}

/// Start a backend whose reply is computed from the 1-based hit number and
/// the parsed JSON body.
pub async fn start_programmable_backend<F>(respond: F) -> MockBackend
where
    F: Fn(u32, Value) -> (u16, Value) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicU32::new(0));
    let last_request_id = Arc::new(Mutex::new(None));
    let respond = Arc::new(respond);

    let handler_hits = hits.clone();
    let handler_ids = last_request_id.clone();
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .fallback(move |headers: HeaderMap, body: Bytes| {
            let respond = respond.clone();
            let hits = handler_hits.clone();
            let ids = handler_ids.clone();
            async move {
                let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
                *ids.lock().unwrap() = headers
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
                let (status, reply) = respond(n, parsed);
                (StatusCode::from_u16(status).unwrap(), Json(reply))
            }
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        url,
        hits,
        last_request_id,
    }
}

/// A backend that always answers 200 with its name and the body it received.
pub async fn start_mock_backend(name: &'static str) -> MockBackend {
    start_programmable_backend(move |_, body| (200, json!({ "backend": name, "received": body }))).await
}

/// A backend that always answers with `status`.
pub async fn start_failing_backend(status: u16) -> MockBackend {
    start_programmable_backend(move |_, _| (status, json!({ "error": "backend failure" }))).await
}

/// A URL nothing is listening on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

/// Defaults suitable for tests: no background health checks, admin enabled.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.health_check.enabled = false;
    config.admin.enabled = true;
    config.admin.api_key = "test-key".into();
    config.timeouts.upstream_secs = 5;
    config
}

pub struct RunningServer {
    pub url: String,
    pub shutdown: Shutdown,
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(config: AppConfig) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        startup::run_gateway(&config, listener, &server_shutdown)
            .await
            .unwrap();
    });
    RunningServer { url, shutdown }
}

pub async fn start_registry(config: AppConfig) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        startup::run_registry(&config, listener, &server_shutdown)
            .await
            .unwrap();
    });
    RunningServer { url, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Register `url` offering `models` (name, type) through a directory at `directory`.
pub async fn register(directory: &str, url: &str, models: &[(&str, &str)]) {
    let models: Vec<Value> = models
        .iter()
        .map(|(name, kind)| json!({ "name": name, "type": kind }))
        .collect();
    let res = client()
        .post(format!("{}/register", directory))
        .json(&json!({ "url": url, "models": models }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200, "registration of {} failed", url);
}

pub async fn process(gateway: &str, kind: &str, body: Value) -> reqwest::Response {
    client()
        .post(format!("{}/api/process/{}", gateway, kind))
        .json(&body)
        .send()
        .await
        .unwrap()
}
