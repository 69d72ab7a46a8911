//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! supervisor + server_config produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!     → SupervisorEvent broadcast (see supervisor::events)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
