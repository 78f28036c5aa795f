//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (active.rs)
//!     → snapshot registered URLs
//!     → GET <url>/health for every backend, concurrently, each with a timeout
//!     → registry store update_health
//! ```
//!
//! # Design Decisions
//! - 2xx is healthy; any other status, a timeout or a connection error is not
//! - One slow backend never delays the verdict for the others
//! - Health state is per-backend and never removes a registration

pub mod active;

pub use active::{HealthChecker, ProbeOutcome};
