//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build registry / directory → start health checker → bind → serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → server drains in-flight requests
//!               → cache purge task exits
//!               → health checker stopped
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bind or config error is fatal before any traffic arrives
//! - Background tasks are stopped only after the server has drained

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
