//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request ID, tracing, timeout)
//!     → request.rs (caller identity, date parsing)
//!     → handlers.rs (JSON ⇄ orchestrator)
//!     → response.rs (error → status code)
//!     → Send to client
//! ```
//!
//! Routing and validation stay thin; every decision lives in the orchestrator.

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{Username, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{build_router, AppState, HttpServer};
