//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! POST /register     → store.rs register (replace record, reindex)
//! DELETE /unregister → store.rs unregister (drop record, purge indexes)
//! health checker     → store.rs update_health
//! gateway lookups    → store.rs list_by_model (healthy only)
//!                    → store.rs list_by_type (health ignored)
//! ```
//!
//! # Design Decisions
//! - The store is an owned object shared via Arc, never a global
//! - Indexes are maintained incrementally under the same lock as the records
//! - Unhealthy backends stay registered until explicitly unregistered

pub mod store;
pub mod types;

pub use store::{normalize_url, RegistryStore};
pub use types::{BackendRecord, CapabilityDecl, RegisterOutcome, RegistryError};
