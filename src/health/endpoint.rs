//! Per-server liveness cell.
//!
//! # State Transitions
//! ```text
//! up ──probe fails──▶ down
//! down ──probe 200──▶ up
//! ```
//!
//! One writer (the endpoint's health checker), many readers (every request
//! selecting from the owning pool). Transitions are logged once.

use std::sync::atomic::{AtomicBool, Ordering};

use url::Url;

/// A single server instance within a backend pool.
#[derive(Debug)]
pub struct Endpoint {
    address: String,
    ping_uri: String,
    up: AtomicBool,
}

impl Endpoint {
    /// Create an endpoint. Endpoints start up until a probe says otherwise.
    pub fn new(address: impl Into<String>, ping_uri: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ping_uri: ping_uri.into(),
            up: AtomicBool::new(true),
        }
    }

    /// The `host:port` connect address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// URL probed by HTTP health checks.
    pub fn ping_url(&self) -> Result<Url, url::ParseError> {
        let path = if self.ping_uri.starts_with('/') {
            self.ping_uri.clone()
        } else {
            format!("/{}", self.ping_uri)
        };
        Url::parse(&format!("http://{}{}", self.address, path))
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::Acquire)
    }

    /// Set liveness. Returns true when the state actually changed.
    pub fn mark_up(&self, up: bool) -> bool {
        let previous = self.up.swap(up, Ordering::AcqRel);
        if previous != up {
            if up {
                tracing::info!(address = %self.address, "Endpoint is up");
            } else {
                tracing::warn!(address = %self.address, "Endpoint is down");
            }
        }
        previous != up
    }
}
