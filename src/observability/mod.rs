//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handler produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request counter, latency histogram)
//!
//! Consumers:
//!     → stdout (human or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with request ID on every relay span
//! - Metrics are cheap (atomic increments) and off by default

pub mod logging;
pub mod metrics;
