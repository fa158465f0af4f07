//! Error to status mapping.
//!
//! | Failure | Status |
//! |---|---|
//! | backend unreachable / circuit open | 503 Service Unavailable |
//! | backend answered badly | 500 Internal Server Error |
//! | borrow limit reached | 412 Precondition Failed |
//! | reservation not found | 404 Not Found |
//! | malformed input / unusable id | 400 Bad Request |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::backends::ServiceError;
use crate::orchestrator::OrchestratorError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match &err {
            OrchestratorError::Service(e) if e.is_unavailable() => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            OrchestratorError::Service(ServiceError::InvalidResponse { .. }) => {
                tracing::error!(error = %err, "Backend returned an invalid response");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
            OrchestratorError::Service(ServiceError::InvalidRequest { .. }) => {
                Self::bad_request(err.to_string())
            }
            OrchestratorError::Service(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
            OrchestratorError::InsufficientRating { .. } => {
                Self::new(StatusCode::PRECONDITION_FAILED, err.to_string())
            }
            OrchestratorError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}
