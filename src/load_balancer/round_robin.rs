//! Round-robin load balancing strategy.

use std::sync::{Arc, Mutex};

use crate::config::ServerConfig;
use crate::health::{Endpoint, HealthContext};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{split_host_port, LoadBalancer, LoadBalancerError};

/// Round-robin selector over a fixed ring of endpoints.
///
/// The cursor lock covers the whole scan-and-advance, so concurrent callers
/// observe a strict rotation.
#[derive(Debug)]
pub struct RoundRobin {
    name: String,
    endpoints: Vec<Arc<Endpoint>>,
    cursor: Mutex<usize>,
    probes: Shutdown,
}

impl RoundRobin {
    /// Build the ring and start one health checker per endpoint.
    pub fn new(
        name: &str,
        servers: &[ServerConfig],
        health: &HealthContext,
    ) -> Result<Self, LoadBalancerError> {
        if name.is_empty() {
            return Err(LoadBalancerError::EmptyBackendName);
        }
        if servers.is_empty() {
            return Err(LoadBalancerError::NoServers {
                backend: name.to_string(),
            });
        }

        let probes = Shutdown::new();
        let mut endpoints = Vec::with_capacity(servers.len());
        for server in servers {
            let endpoint = Arc::new(Endpoint::new(&server.address, &server.ping_uri));
            let checker = health.checker_for(server, endpoint.clone());
            if checker.is_active() {
                checker.spawn(health.mode, probes.subscribe());
            }
            endpoints.push(endpoint);
        }

        Ok(Self {
            name: name.to_string(),
            endpoints,
            cursor: Mutex::new(0),
            probes,
        })
    }

    fn find(&self, address: &str) -> Result<&Arc<Endpoint>, LoadBalancerError> {
        split_host_port(address)?;
        self.endpoints
            .iter()
            .find(|e| e.address() == address)
            .ok_or_else(|| LoadBalancerError::UnknownEndpoint {
                backend: self.name.clone(),
                address: address.to_string(),
            })
    }
}

impl LoadBalancer for RoundRobin {
    fn get_connect_address(&self) -> Result<String, LoadBalancerError> {
        let mut cursor = self.cursor.lock().unwrap_or_else(|e| e.into_inner());
        let len = self.endpoints.len();

        for _ in 0..len {
            let endpoint = &self.endpoints[*cursor];
            *cursor = (*cursor + 1) % len;
            if endpoint.is_up() {
                return Ok(endpoint.address().to_string());
            }
        }

        tracing::debug!(backend = %self.name, endpoints = len, "No healthy endpoints in pool");
        Err(LoadBalancerError::NoHealthyEndpoint {
            backend: self.name.clone(),
        })
    }

    fn mark_endpoint_up(&self, address: &str) -> Result<(), LoadBalancerError> {
        self.find(address)?.mark_up(true);
        Ok(())
    }

    fn mark_endpoint_down(&self, address: &str) -> Result<(), LoadBalancerError> {
        self.find(address)?.mark_up(false);
        Ok(())
    }

    fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.endpoints.clone()
    }

    fn stop_health_checks(&self) {
        self.probes.trigger();
    }
}

impl Drop for RoundRobin {
    fn drop(&mut self) {
        self.probes.trigger();
    }
}
