//! Prefer-local load balancing strategy.
//!
//! Servers whose host names this machine are pooled separately from the rest.
//! Selection tries the local pool first and falls back to the remote pool,
//! so co-located servers take the traffic while they are up.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::health::{Endpoint, HealthContext};
use crate::load_balancer::{split_host_port, LoadBalancer, LoadBalancerError, RoundRobin};

/// Environment variable overriding the detected hostname.
pub const HOSTNAME_ENV: &str = "GATEWAY_HOSTNAME";

/// Local-first selector with remote fallback.
#[derive(Debug)]
pub struct PreferLocal {
    name: String,
    local: Option<RoundRobin>,
    remote: Option<RoundRobin>,
}

impl PreferLocal {
    pub fn new(
        name: &str,
        servers: &[ServerConfig],
        health: &HealthContext,
        local_hostname: &str,
    ) -> Result<Self, LoadBalancerError> {
        if name.is_empty() {
            return Err(LoadBalancerError::EmptyBackendName);
        }
        if servers.is_empty() {
            return Err(LoadBalancerError::NoServers {
                backend: name.to_string(),
            });
        }

        let mut local = Vec::new();
        let mut remote = Vec::new();
        for server in servers {
            let (host, _) = split_host_port(&server.address)?;
            if is_local_host(host, local_hostname) {
                local.push(server.clone());
            } else {
                remote.push(server.clone());
            }
        }

        if local.is_empty() {
            tracing::info!(backend = %name, hostname = %local_hostname, "No local servers; all traffic goes remote");
        }
        if remote.is_empty() {
            tracing::info!(backend = %name, "No remote servers; no fallback available");
        }

        let pool = |servers: Vec<ServerConfig>| -> Result<Option<RoundRobin>, LoadBalancerError> {
            if servers.is_empty() {
                Ok(None)
            } else {
                RoundRobin::new(name, &servers, health).map(Some)
            }
        };

        Ok(Self {
            name: name.to_string(),
            local: pool(local)?,
            remote: pool(remote)?,
        })
    }

    fn pools(&self) -> impl Iterator<Item = &RoundRobin> {
        self.local.iter().chain(self.remote.iter())
    }

    fn mark(&self, address: &str, up: bool) -> Result<(), LoadBalancerError> {
        split_host_port(address)?;
        for pool in self.pools() {
            let result = if up {
                pool.mark_endpoint_up(address)
            } else {
                pool.mark_endpoint_down(address)
            };
            if result.is_ok() {
                return result;
            }
        }
        Err(LoadBalancerError::UnknownEndpoint {
            backend: self.name.clone(),
            address: address.to_string(),
        })
    }
}

impl LoadBalancer for PreferLocal {
    fn get_connect_address(&self) -> Result<String, LoadBalancerError> {
        if let Some(local) = &self.local {
            if let Ok(address) = local.get_connect_address() {
                return Ok(address);
            }
        }
        match &self.remote {
            Some(remote) => remote.get_connect_address(),
            None => Err(LoadBalancerError::NoHealthyEndpoint {
                backend: self.name.clone(),
            }),
        }
    }

    fn mark_endpoint_up(&self, address: &str) -> Result<(), LoadBalancerError> {
        self.mark(address, true)
    }

    fn mark_endpoint_down(&self, address: &str) -> Result<(), LoadBalancerError> {
        self.mark(address, false)
    }

    fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.pools().flat_map(|p| p.endpoints()).collect()
    }

    fn stop_health_checks(&self) {
        for pool in self.pools() {
            pool.stop_health_checks();
        }
    }
}

/// Whether `host` names the machine called `local`.
///
/// Case-insensitive; `localhost` is always local; a dot-separated prefix on
/// either side matches (`x` matches `x.domain.com`).
pub fn is_local_host(host: &str, local: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let local = local.to_ascii_lowercase();

    if host == "localhost" || host == local {
        return true;
    }
    is_dotted_prefix(&host, &local) || is_dotted_prefix(&local, &host)
}

fn is_dotted_prefix(short: &str, long: &str) -> bool {
    !short.is_empty()
        && long
            .strip_prefix(short)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Resolve this machine's hostname.
///
/// Order: explicit override, `GATEWAY_HOSTNAME`, `HOSTNAME`, the kernel's
/// hostname file, then `localhost`.
pub fn resolve_local_hostname(override_name: Option<&str>) -> String {
    if let Some(name) = override_name.filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    for var in [HOSTNAME_ENV, "HOSTNAME"] {
        if let Ok(name) = std::env::var(var) {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    for path in ["/proc/sys/kernel/hostname", "/etc/hostname"] {
        if let Ok(name) = std::fs::read_to_string(path) {
            let name = name.trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    "localhost".to_string()
}
