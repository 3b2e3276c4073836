//! Configuration schema definitions.
//!
//! This module defines the complete configuration tree for the gateway:
//! listener → routes → backends → servers, plus the global knobs shared by
//! every subsystem. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listeners, each serving its own set of routes.
    pub listeners: Vec<ListenerConfig>,

    /// Route definitions mapping URIs to backends.
    pub routes: Vec<RouteConfig>,

    /// Named backend pools.
    pub backends: Vec<BackendConfig>,

    /// Individual servers referenced by backends.
    pub servers: Vec<ServerConfig>,

    /// Default health check settings, overridable per server.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Locality settings used by the prefer-local policy.
    pub locality: LocalityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Listener identifier.
    pub name: String,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Names of the routes served by this listener, in configured order.
    pub routes: Vec<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            routes: Vec::new(),
        }
    }
}

/// Route configuration binding a URI root to one or more backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// URI root this route is mounted on.
    pub uri: String,

    /// Backend names, in configured order.
    pub backends: Vec<String>,

    /// Guard expression: empty, or `Header=Value`.
    #[serde(default)]
    pub guard: String,

    /// Plugin names, outermost first.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Adapter used when more than one backend is configured.
    #[serde(default)]
    pub multi_backend_adapter: Option<String>,
}

/// Load balancing policy of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalancerPolicy {
    #[default]
    RoundRobin,
    PreferLocal,
}

impl std::fmt::Display for LoadBalancerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadBalancerPolicy::RoundRobin => write!(f, "round-robin"),
            LoadBalancerPolicy::PreferLocal => write!(f, "prefer-local"),
        }
    }
}

/// Backend pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// Server names, in rotation order.
    pub servers: Vec<String>,

    /// Load balancing policy.
    #[serde(default)]
    pub load_balancer: LoadBalancerPolicy,
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Unique server identifier.
    pub name: String,

    /// Connect address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Path probed by HTTP health checks.
    #[serde(default = "default_ping_uri")]
    pub ping_uri: String,

    /// Per-server override of the global health check settings.
    #[serde(default)]
    pub health_check: Option<HealthCheckConfig>,
}

fn default_ping_uri() -> String {
    "/".to_string()
}

/// Kind of health probe run against each server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HealthCheckKind {
    /// No probing; the server is always considered up.
    None,
    /// Periodic `GET http://{address}{ping_uri}`; only 200 counts as up.
    #[default]
    HttpGet,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Probe kind.
    pub kind: HealthCheckKind,

    /// Delay between probes in milliseconds.
    pub interval_ms: u64,

    /// Probe deadline in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            kind: HealthCheckKind::HttpGet,
            interval_ms: 10_000,
            timeout_ms: 2_000,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Locality configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LocalityConfig {
    /// Hostname treated as "local"; detected from the environment when unset.
    pub hostname: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}
