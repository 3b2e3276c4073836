//! Route guards.
//!
//! # Grammar
//! ```text
//! guard := "" | HeaderName "=" HeaderValue
//! ```
//!
//! # Design Decisions
//! - Empty expression = always matches
//! - Header name matching is case-insensitive, value matching is exact
//! - A malformed expression still compiles; it fails every evaluation, so the
//!   problem surfaces as a 500 on the affected route instead of at startup

use axum::body::Body;
use axum::http::{HeaderName, Request};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("malformed guard expression '{expression}': {reason}")]
    Malformed { expression: String, reason: &'static str },
}

/// Predicate deciding whether a route handles a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteGuard {
    Always,
    HeaderEquals { name: HeaderName, value: String },
    Invalid(GuardError),
}

impl RouteGuard {
    /// Compile a guard expression. Never fails; see [`RouteGuard::Invalid`].
    pub fn parse(expression: &str) -> Self {
        if expression.is_empty() {
            return RouteGuard::Always;
        }

        let malformed = |reason| {
            RouteGuard::Invalid(GuardError::Malformed {
                expression: expression.to_string(),
                reason,
            })
        };

        let parts: Vec<&str> = expression.split('=').collect();
        if parts.len() != 2 {
            return malformed("expected exactly one '='");
        }
        if parts[0].is_empty() {
            return malformed("empty header name");
        }
        match HeaderName::from_bytes(parts[0].as_bytes()) {
            Ok(name) => RouteGuard::HeaderEquals {
                name,
                value: parts[1].to_string(),
            },
            Err(_) => malformed("invalid header name"),
        }
    }

    /// True for everything but the always-true guard.
    pub fn is_guarded(&self) -> bool {
        !matches!(self, RouteGuard::Always)
    }

    pub fn evaluate(&self, request: &Request<Body>) -> Result<bool, GuardError> {
        match self {
            RouteGuard::Always => Ok(true),
            RouteGuard::HeaderEquals { name, value } => Ok(request
                .headers()
                .get(name)
                .is_some_and(|v| v.as_bytes() == value.as_bytes())),
            RouteGuard::Invalid(e) => Err(e.clone()),
        }
    }
}
