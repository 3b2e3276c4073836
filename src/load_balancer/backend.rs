//! Backend abstraction.
//!
//! # Responsibilities
//! - Give a load balancer a name routes can refer to
//! - Resolve the backend's servers from the configuration store
//! - Stop the balancer's health checkers on teardown

use std::sync::Arc;

use crate::config::{BackendConfig, ConfigStore, ServerConfig, StoreError};
use crate::health::HealthContext;
use crate::load_balancer::{build_load_balancer, LoadBalancer, LoadBalancerError};

/// Errors building a backend from configuration.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    LoadBalancer(#[from] LoadBalancerError),
}

/// A named pool of endpoints behind one load balancing policy.
#[derive(Debug, Clone)]
pub struct Backend {
    name: String,
    load_balancer: Arc<dyn LoadBalancer>,
}

impl Backend {
    pub fn new(name: impl Into<String>, load_balancer: Arc<dyn LoadBalancer>) -> Self {
        Self {
            name: name.into(),
            load_balancer,
        }
    }

    /// Build a backend, resolving its servers through `store`.
    pub fn from_config(
        config: &BackendConfig,
        store: &dyn ConfigStore,
        health: &HealthContext,
        local_hostname: &str,
    ) -> Result<Self, BackendError> {
        let servers = config
            .servers
            .iter()
            .map(|name| store.read_server(name))
            .collect::<Result<Vec<ServerConfig>, _>>()?;

        let load_balancer = build_load_balancer(
            config.load_balancer,
            &config.name,
            &servers,
            health,
            local_hostname,
        )?;
        Ok(Self::new(config.name.clone(), load_balancer))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load_balancer(&self) -> &Arc<dyn LoadBalancer> {
        &self.load_balancer
    }

    /// Select the connect address for the next call to this backend.
    pub fn connect_address(&self) -> Result<String, LoadBalancerError> {
        self.load_balancer.get_connect_address()
    }

    pub fn shutdown(&self) {
        tracing::debug!(backend = %self.name, "Stopping health checks");
        self.load_balancer.stop_health_checks();
    }
}
