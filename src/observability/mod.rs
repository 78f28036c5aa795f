//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log shipping)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the inbound request to the chosen backend
//! - Metrics are cheap (atomic increments) and recorded unconditionally;
//!   without an installed exporter they are no-ops

pub mod logging;
pub mod metrics;
