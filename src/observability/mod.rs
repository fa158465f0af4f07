//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! breaker / retry queue / backend clients / orchestrator
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
