//! Error response construction.
//!
//! # Responsibilities
//! - Build the plain-text rejection/error responses the pipeline emits
//! - Keep rejection responses uncacheable and CORS-readable
//!
//! # Design Decisions
//! - Plain text, UTF-8; no detail beyond the message (internal errors are
//!   logged, never returned)
//! - `Cache-Control: no-cache` so intermediaries never cache a rejection

use axum::body::Body;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;

use crate::policy::Rejection;

/// Build a plain-text error response with the proxy's rejection headers.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CACHE_CONTROL, "no-cache")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from(message.into()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Build the response for a failed policy gate.
pub fn rejection_response(rejection: Rejection) -> Response {
    error_response(rejection.status, rejection.message)
}
