//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → Backend identified
//!     → backend.rs (named handle on one load balancer)
//!     → Apply load balancing policy:
//!         - round_robin.rs (rotate through live endpoints)
//!         - prefer_local.rs (local round robin, remote fallback)
//!     → Return connect address (host:port) or error
//! ```
//!
//! # Design Decisions
//! - Each balancer owns its endpoints and their health checkers
//! - Selection state (cursor) is per balancer instance, never global
//! - Down endpoints are skipped, not removed

pub mod backend;
pub mod prefer_local;
pub mod round_robin;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{LoadBalancerPolicy, ServerConfig};
use crate::health::{Endpoint, HealthContext};

pub use backend::{Backend, BackendError};
pub use prefer_local::{resolve_local_hostname, PreferLocal};
pub use round_robin::RoundRobin;

/// Errors produced by load balancers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadBalancerError {
    #[error("backend name must not be empty")]
    EmptyBackendName,

    #[error("backend '{backend}' has no servers")]
    NoServers { backend: String },

    #[error("no healthy endpoint available for backend '{backend}'")]
    NoHealthyEndpoint { backend: String },

    #[error("backend '{backend}' has no endpoint '{address}'")]
    UnknownEndpoint { backend: String, address: String },

    #[error("invalid endpoint address '{0}' (expected host:port)")]
    InvalidAddress(String),
}

/// Trait for endpoint selection policies.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Select the connect address for the next outbound call.
    fn get_connect_address(&self) -> Result<String, LoadBalancerError>;

    /// Force the endpoint with `address` up.
    fn mark_endpoint_up(&self, address: &str) -> Result<(), LoadBalancerError>;

    /// Force the endpoint with `address` down.
    fn mark_endpoint_down(&self, address: &str) -> Result<(), LoadBalancerError>;

    /// All endpoints, in selection order.
    fn endpoints(&self) -> Vec<Arc<Endpoint>>;

    /// Stop every background health checker owned by this balancer.
    fn stop_health_checks(&self);
}

/// Build the balancer for `policy` over `servers`.
pub fn build_load_balancer(
    policy: LoadBalancerPolicy,
    backend: &str,
    servers: &[ServerConfig],
    health: &HealthContext,
    local_hostname: &str,
) -> Result<Arc<dyn LoadBalancer>, LoadBalancerError> {
    let balancer: Arc<dyn LoadBalancer> = match policy {
        LoadBalancerPolicy::RoundRobin => Arc::new(RoundRobin::new(backend, servers, health)?),
        LoadBalancerPolicy::PreferLocal => {
            Arc::new(PreferLocal::new(backend, servers, health, local_hostname)?)
        }
    };

    tracing::info!(
        backend = %backend,
        policy = %policy,
        servers = servers.len(),
        "Load balancer created"
    );
    Ok(balancer)
}

/// Split `host:port`, rejecting anything else.
pub fn split_host_port(address: &str) -> Result<(&str, u16), LoadBalancerError> {
    let invalid = || LoadBalancerError::InvalidAddress(address.to_string());

    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() || (host.contains(':') && !address.starts_with('[')) {
        return Err(invalid());
    }
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    Ok((host, port))
}
