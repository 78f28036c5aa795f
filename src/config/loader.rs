//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidOverride { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration from an optional file, apply process environment
/// overrides, then validate the result.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => AppConfig::default(),
    };

    apply_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply deployment overrides from `lookup` (normally the process environment).
pub fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bind) = lookup("REGISTRY_BIND") {
        config.registry.bind_address = bind;
    } else if let Some(port) = lookup("REGISTRY_PORT") {
        config.registry.bind_address = format!("0.0.0.0:{}", parse::<u16>("REGISTRY_PORT", port)?);
    }

    if let Some(bind) = lookup("GATEWAY_BIND") {
        config.gateway.bind_address = bind;
    } else if let Some(port) = lookup("PROXY_PORT") {
        config.gateway.bind_address = format!("0.0.0.0:{}", parse::<u16>("PROXY_PORT", port)?);
    }

    if let Some(url) = lookup("REGISTRY_URL") {
        config.gateway.directory_url = Some(url);
    }
    if let Some(url) = lookup("LOGGER_URL") {
        config.gateway.log_store_url = Some(url);
    }
    if let Some(ttl) = lookup("SERVICE_CACHE_TTL") {
        config.cache.ttl_ms = parse("SERVICE_CACHE_TTL", ttl)?;
    }
    if let Some(interval) = lookup("HEALTH_CHECK_INTERVAL") {
        config.health_check.interval_ms = parse("HEALTH_CHECK_INTERVAL", interval)?;
    }
    if let Some(cooldown) = lookup("LB_COOLDOWN_SECS") {
        config.load_balancer.cooldown_secs = parse("LB_COOLDOWN_SECS", cooldown)?;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    Ok(())
}

fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { var, value })
}
