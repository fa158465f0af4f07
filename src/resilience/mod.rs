//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call to a backend:
//!     → circuit_breaker.rs (check key; blocked → fail fast with CircuitOpen)
//!     → perform call
//!     → circuit_breaker.rs (inc on failure, release on success)
//!
//! Non-critical corrective write failed:
//!     → retries.rs (append to tail; drain loop retries one item per tick)
//! ```
//!
//! # Design Decisions
//! - Breaker and queue are explicitly constructed and injected, never static
//! - Breaker is a trait so another policy can replace the counter model
//! - Retry queue trades durability for simplicity: in-memory only

pub mod circuit_breaker;
pub mod retries;

pub use circuit_breaker::{Breaker, CircuitBreaker, CircuitState};
pub use retries::RetryQueue;
