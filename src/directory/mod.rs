//! Directory service subsystem.
//!
//! # Data Flow
//! ```text
//! Backend ── registration.rs ── client.rs ──HTTP──▶ routes.rs ──▶ registry store
//!
//! Gateway lookup
//!     → source.rs Directory
//!         → Embedded: registry store in this process
//!         → Remote:   client.rs against a standalone directory
//! ```
//!
//! # Design Decisions
//! - Wire types live in one place so server and client cannot drift
//! - A missing or malformed registration field is a 400; a capability entry
//!   missing its name or type is skipped and the rest are accepted

pub mod client;
pub mod registration;
pub mod routes;
pub mod source;
pub mod wire;

pub use client::{DirectoryClient, DirectoryError};
pub use registration::SelfRegistration;
pub use routes::router;
pub use source::Directory;
pub use wire::{HealthStatus, ModelList};
