//! Failure taxonomy at the backend boundary.

use thiserror::Error;

/// Classified failure of an outbound call.
///
/// Transport detail (reqwest errors, status codes, body text) is folded into
/// `reason` so nothing transport-specific leaks past the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Backend could not be reached (DNS, connect, timeout).
    #[error("{service} service unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },

    /// The operation's circuit is open; no call was made.
    #[error("circuit open for {operation}")]
    CircuitOpen { operation: String },

    /// Backend answered with a non-success status or an unreadable body.
    #[error("invalid response from {service} service: {reason}")]
    InvalidResponse { service: &'static str, reason: String },

    /// The request could not be built from the caller's input; nothing was sent.
    #[error("invalid request to {service} service: {reason}")]
    InvalidRequest { service: &'static str, reason: String },
}

impl ServiceError {
    /// True for the "unavailable" class: unreachable or short-circuited.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::CircuitOpen { .. })
    }

    /// True only when the breaker refused the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// Metric label for this failure.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::InvalidRequest { .. } => "invalid_request",
        }
    }

    pub(crate) fn from_transport(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse {
                service,
                reason: format!("malformed body: {err}"),
            }
        } else {
            Self::Unavailable {
                service,
                reason: err.to_string(),
            }
        }
    }
}
