//! Response helpers.
//!
//! # Design Decisions
//! - Gateway-generated errors are short plaintext bodies
//! - Backend responses pass through untouched and streamed

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Plaintext response for a gateway-generated error.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let mut response = (status, message.into()).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
