//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (tracing events: loads, reloads, connections)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stderr via tracing-subscriber fmt layer
//!     → optional Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
