//! Request handling.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) as early as possible for tracing
//! - Extract the caller identity from `X-User-Name`
//! - Convert API dates (`YYYY-MM-DD`) to timestamps

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::backends::http::USER_HEADER;
use crate::http::response::ApiError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Stamp `x-request-id` on requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Copy `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Authenticated caller, taken from `X-User-Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Username {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Username(v.to_string()))
            .ok_or_else(|| ApiError::bad_request(format!("missing {USER_HEADER} header")))
    }
}

/// Midnight UTC of a calendar date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
