//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway → backend:
//!     → timeouts.rs (every upstream call has a deadline)
//!     → retries.rs (5xx / no response → fail over to another candidate)
//!
//! Backend → directory (self-registration):
//!     → backoff.rs (exponential delay with jitter between attempts)
//! ```
//!
//! # Design Decisions
//! - Gateway failover retries immediately against a different backend; the
//!   failing one is already cooling down in the load balancer
//! - Client errors (4xx) are relayed, never retried

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::RetryPolicy;
pub use timeouts::{with_deadline, UpstreamError};
