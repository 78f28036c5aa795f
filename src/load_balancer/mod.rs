//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway resolved candidates for capability
//!     → round_robin.rs (drop cooling-down URLs, rotate per capability)
//!     → nothing left? cooldown.rs releases one failed candidate
//!     → Return URL or None (only when there were no candidates)
//!
//! Backend failed (5xx / no response)
//!     → cooldown.rs (exclude URL, schedule re-admission)
//! ```
//!
//! # Design Decisions
//! - Selection is stateless apart from counters and the failed-set
//! - Counters are scoped per capability name, not global
//! - Health filtering happens upstream in the directory; the balancer only
//!   knows about failures the gateway observed itself

pub mod cooldown;
pub mod round_robin;

pub use cooldown::FailedSet;
pub use round_robin::RoundRobin;

/// Backend selection policy used by the gateway.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick one of `candidates` for `capability`.
    /// Returns `None` only when `candidates` is empty.
    fn select_backend(&self, capability: &str, candidates: &[String]) -> Option<String>;

    /// Take `url` out of rotation for the cooldown period.
    fn mark_failed(&self, url: &str);

    /// URLs currently excluded from selection.
    fn failed_backends(&self) -> Vec<String>;

    /// Forget all counters and failures.
    fn reset(&self);
}
