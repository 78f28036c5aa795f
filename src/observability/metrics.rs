//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): forwarded requests by kind, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_backend_failures_total` (counter): 5xx/network failures by backend
//! - `gateway_retries_total` (counter): retries against another candidate
//! - `gateway_cache_lookups_total` (counter): directory cache hits/misses
//! - `registry_backend_health` (gauge): 1=healthy, 0=unhealthy
//! - `registry_backends` (gauge): registered backend count

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(kind: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "kind" => kind.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "kind" => kind.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_backend_failure(backend: &str) {
    counter!("gateway_backend_failures_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_retry() {
    counter!("gateway_retries_total").increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("gateway_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("registry_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_registry_size(size: usize) {
    gauge!("registry_backends").set(size as f64);
}
