//! Library lending gateway.
//!
//! Fronts the library, rating and reservation services with per-operation
//! circuit breakers, a deferred retry queue for rating corrections, and the
//! orchestration of the borrow/return workflows.

pub mod backends;
pub mod config;
pub mod domain;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use orchestrator::{Orchestrator, OrchestratorError};
