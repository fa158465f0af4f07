//! Orchestration of the lending use cases.
//!
//! # Data Flow
//! ```text
//! list libraries / books / rating ──▶ one backend call (catalog reads degrade)
//!
//! user reservations:
//!     reservations ──┬──▶ books by ids     ──┐
//!                    └──▶ libraries by ids ──┴──▶ join by id
//!
//! take book:   rented list → rating → limit check → add reservation → obtain book
//! return book: rented list → status by date → set status → return to library
//!              → rating penalties / bonus (deferred, never fail the request)
//! ```

pub mod error;
pub mod workflows;

pub use error::{OrchestratorError, OrchestratorResult};
pub use workflows::{Orchestrator, ReturnSummary};
