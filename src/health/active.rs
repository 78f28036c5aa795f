//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered backend
//! - Feed results back into the registry store

use std::sync::{Arc, Mutex};
#[cfg(test)]
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::registry::RegistryStore;

/// Outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    BadStatus(u16),
    ConnectionError,
    Timeout,
}

impl ProbeOutcome {
    pub fn is_healthy(self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }
}

pub struct HealthChecker {
    store: Arc<RegistryStore>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
    schedule: Mutex<Option<JoinHandle<()>>>,
}

impl HealthChecker {
    pub fn new(store: Arc<RegistryStore>, config: HealthCheckConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeout()));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            store,
            config,
            client,
            schedule: Mutex::new(None),
        }
    }

    /// Start the periodic schedule. Calling it while already running is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut schedule = self.schedule.lock().unwrap_or_else(|p| p.into_inner());
        if schedule.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = ?self.config.interval(),
            timeout = ?self.config.timeout(),
            path = %self.config.path,
            "Health checker starting"
        );

        let checker = Arc::clone(self);
        *schedule = Some(tokio::spawn(async move {
            let interval = checker.config.interval();
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                checker.check_all().await;
            }
        }));
    }

    /// Cancel the periodic schedule without waiting for an in-flight tick.
    /// Calling it while stopped is a no-op.
    pub fn stop(&self) {
        let handle = self.schedule.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("Health checker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.schedule
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Probe every registered backend concurrently and record the results.
    /// Returns the number of backends that failed their check.
    pub async fn check_all(&self) -> usize {
        let urls = self.store.urls().await;
        if urls.is_empty() {
            tracing::debug!("No services to health check");
            return 0;
        }

        // Each verdict is applied as soon as its own check resolves.
        let outcomes = join_all(urls.iter().map(|url| async move {
            let outcome = self.probe(url).await;
            self.store.update_health(url, outcome.is_healthy()).await;
            outcome
        }))
        .await;

        let failed = outcomes.iter().filter(|o| !o.is_healthy()).count();

        if failed > 0 {
            tracing::warn!(failed, total = urls.len(), "Services failed health checks");
        } else {
            tracing::debug!(total = urls.len(), "All services are healthy");
        }
        failed
    }

    /// Probe a single backend's health endpoint.
    pub async fn probe(&self, base_url: &str) -> ProbeOutcome {
        let uri = format!("{}{}", base_url, self.config.path);
        let request = match Request::builder()
            .method(Method::GET)
            .uri(&uri)
            .header("user-agent", "model-gateway-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(url = %uri, error = %e, "Failed to build health check request");
                return ProbeOutcome::ConnectionError;
            }
        };

        match time::timeout(self.config.timeout(), self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => ProbeOutcome::Healthy,
            Ok(Ok(response)) => {
                tracing::warn!(url = %base_url, status = %response.status(), "Health check failed: non-success status");
                ProbeOutcome::BadStatus(response.status().as_u16())
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %base_url, error = %e, "Health check failed: connection error");
                ProbeOutcome::ConnectionError
            }
            Err(_) => {
                tracing::warn!(url = %base_url, "Health check failed: timeout");
                ProbeOutcome::Timeout
            }
        }
    }
}
