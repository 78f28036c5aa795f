//! Model gateway: a service directory for model backends plus a forwarding
//! gateway that routes requests to them by capability name.

// Directory side
pub mod directory;
pub mod health;
pub mod registry;

// Gateway side
pub mod admin;
pub mod cache;
pub mod gateway;
pub mod load_balancer;

// Shared plumbing
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use directory::{Directory, DirectoryClient};
pub use gateway::AppState;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::RegistryStore;
