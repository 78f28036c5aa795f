//! Startup orchestration for both roles.
//!
//! # Responsibilities
//! - Build the registry or the gateway from configuration
//! - Start background tasks (health checks, cache purge)
//! - Serve until shutdown, then stop background tasks

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::cache::spawn_purge_task;
use crate::config::AppConfig;
use crate::directory::{self, Directory, DirectoryClient, DirectoryError};
use crate::gateway::{self, AppState};
use crate::health::HealthChecker;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::registry::RegistryStore;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("directory client: {0}")]
    Directory(#[from] DirectoryError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Run the standalone directory service until `shutdown` fires.
pub async fn run_registry(
    config: &AppConfig,
    listener: TcpListener,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    let store = Arc::new(RegistryStore::new());
    let checker = Arc::new(HealthChecker::new(store.clone(), config.health_check.clone()));
    checker.start();

    let server = HttpServer::new("registry", directory::router(store), config);
    let result = server.run(listener, shutdown.subscribe()).await;

    checker.stop();
    result.map_err(StartupError::from)
}

/// Pick the directory the gateway reads from.
pub fn gateway_directory(config: &AppConfig) -> Result<Directory, StartupError> {
    match &config.gateway.directory_url {
        Some(url) => {
            let client =
                DirectoryClient::new(url, Duration::from_secs(config.timeouts.directory_secs))?;
            tracing::info!(directory = %client.base_url(), "Using remote directory");
            Ok(Directory::Remote(client))
        }
        None => {
            tracing::info!("No directory URL configured; embedding the registry");
            Ok(Directory::Embedded(Arc::new(RegistryStore::new())))
        }
    }
}

/// Run the forwarding gateway until `shutdown` fires.
pub async fn run_gateway(
    config: &AppConfig,
    listener: TcpListener,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    let directory = gateway_directory(config)?;

    let checker = directory
        .embedded_store()
        .map(|store| Arc::new(HealthChecker::new(store.clone(), config.health_check.clone())));
    if let Some(checker) = &checker {
        checker.start();
    }

    let state = AppState::new(config, directory);
    let purge = spawn_purge_task(
        state.cache.clone(),
        Duration::from_secs(config.cache.purge_interval_secs),
        shutdown.subscribe(),
    );

    let server = HttpServer::new("gateway", gateway::router(state), config);
    let result = server.run(listener, shutdown.subscribe()).await;

    if let Some(checker) = checker {
        checker.stop();
    }
    purge.abort();
    result.map_err(StartupError::from)
}
