//! Errors surfaced by the orchestrator.

use thiserror::Error;

use crate::backends::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// A backend failure, classification preserved.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The user already holds as many loans as they have stars.
    #[error("insufficient rating: {active} active reservations, {stars} stars")]
    InsufficientRating { active: usize, stars: u64 },

    /// No rented reservation with this id belongs to the caller.
    #[error("reservation {reservation_id} not found")]
    NotFound { reservation_id: String },
}

impl OrchestratorError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Service(e) if e.is_unavailable())
    }

    /// Metric label.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Service(e) => e.outcome(),
            Self::InsufficientRating { .. } => "insufficient_rating",
            Self::NotFound { .. } => "not_found",
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
