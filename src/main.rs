//! Model gateway.
//!
//! ```text
//!                ┌──────────────┐  register / unregister   ┌───────────┐
//!   backends ───▶│  directory   │◀──── health probes ──────│  health   │
//!                │  (registry)  │                          │  checker  │
//!                └──────┬───────┘                          └───────────┘
//!                       │ healthy backends for a model
//!                       ▼
//!   clients ───▶ ┌──────────────┐ cache → round robin → failover ──▶ backend
//!                │   gateway    │
//!                └──────────────┘
//! ```
//!
//! Run `model-gateway registry` for a standalone directory, or
//! `model-gateway gateway` for the gateway (which embeds a directory when
//! `gateway.directory_url` is not set).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use model_gateway::config;
use model_gateway::lifecycle::{signals, startup, Shutdown};
use model_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "model-gateway", version)]
#[command(about = "Capability-based gateway and service directory for model backends", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Role {
    /// Standalone directory service.
    Registry,
    /// Forwarding gateway.
    Gateway,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), role = ?cli.role, "model-gateway starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = match cli.role {
        Role::Registry => &config.registry.bind_address,
        Role::Gateway => &config.gateway.bind_address,
    };
    let listener = startup::bind(bind_address).await?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_shutdown_signal().await;
        trigger.trigger();
    });

    match cli.role {
        Role::Registry => startup::run_registry(&config, listener, &shutdown).await?,
        Role::Gateway => startup::run_gateway(&config, listener, &shutdown).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
