//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Validate collaborator URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid bind address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: invalid http(s) URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("health_check.path must start with '/' (got '{0}')")]
    InvalidHealthPath(String),

    #[error("health_check.timeout_ms ({timeout_ms}) must be less than interval_ms ({interval_ms})")]
    ProbeTimeoutTooLong { timeout_ms: u64, interval_ms: u64 },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a fully-loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "registry.bind_address", &config.registry.bind_address);
    check_addr(&mut errors, "gateway.bind_address", &config.gateway.bind_address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if let Some(url) = &config.gateway.directory_url {
        check_url(&mut errors, "gateway.directory_url", url);
    }
    if let Some(url) = &config.gateway.log_store_url {
        check_url(&mut errors, "gateway.log_store_url", url);
    }

    let hc = &config.health_check;
    check_nonzero(&mut errors, "health_check.interval_ms", hc.interval_ms);
    check_nonzero(&mut errors, "health_check.timeout_ms", hc.timeout_ms);
    if hc.interval_ms > 0 && hc.timeout_ms >= hc.interval_ms {
        errors.push(ValidationError::ProbeTimeoutTooLong {
            timeout_ms: hc.timeout_ms,
            interval_ms: hc.interval_ms,
        });
    }
    if !hc.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(hc.path.clone()));
    }

    check_nonzero(&mut errors, "cache.ttl_ms", config.cache.ttl_ms);
    check_nonzero(&mut errors, "cache.purge_interval_secs", config.cache.purge_interval_secs);
    check_nonzero(&mut errors, "load_balancer.cooldown_secs", config.load_balancer.cooldown_secs);
    check_nonzero(&mut errors, "retries.max_attempts", config.retries.max_attempts as u64);
    check_nonzero(&mut errors, "timeouts.upstream_secs", config.timeouts.upstream_secs);
    check_nonzero(&mut errors, "timeouts.directory_secs", config.timeouts.directory_secs);
    check_nonzero(&mut errors, "timeouts.request_secs", config.timeouts.request_secs);
    check_nonzero(&mut errors, "limits.max_body_size", config.limits.max_body_size as u64);

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let ok = Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_nonzero(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero { field });
    }
}
