//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway lookup (model:<name>, type:<type>, all-models)
//!     → ttl.rs get (hit → return, expired → evict → miss)
//!     → on miss: directory query → ttl.rs set
//!
//! Maintenance:
//!     purge task (every purge_interval) → ttl.rs purge_expired
//! ```
//!
//! # Design Decisions
//! - Expiry is enforced on read; the periodic sweep only reclaims memory
//! - No size-based eviction: the key space is bounded by the registry
//! - A stale read within one TTL window is accepted

pub mod ttl;

pub use ttl::{spawn_purge_task, ResponseCache};
