//! Shared outbound HTTP transport.
//!
//! One keep-alive client is built at startup and cloned into every
//! forwarder and health checker; clones share the connection pool.

use std::time::Duration;

use axum::body::Body;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;

/// Outbound client type used throughout the gateway.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the shared client from timeout settings.
pub fn build_client(timeouts: &TimeoutConfig) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
        .build(connector)
}
