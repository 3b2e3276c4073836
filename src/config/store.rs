//! Read-only configuration store.
//!
//! The gateway core consumes the configuration tree through this trait,
//! once, while the service is being assembled. It never writes to it and
//! never reads it again during steady-state operation.

use thiserror::Error;

use crate::config::schema::{
    BackendConfig, GatewayConfig, ListenerConfig, RouteConfig, ServerConfig,
};

/// Kind of record looked up in a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Listener,
    Route,
    Backend,
    Server,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            RecordKind::Listener => "listener",
            RecordKind::Route => "route",
            RecordKind::Backend => "backend",
            RecordKind::Server => "server",
        };
        f.write_str(kind)
    }
}

/// Errors returned by a configuration store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: RecordKind, name: String },
}

/// Source of configuration records, keyed by name.
pub trait ConfigStore: Send + Sync {
    fn read_listener(&self, name: &str) -> Result<ListenerConfig, StoreError>;
    fn read_route(&self, name: &str) -> Result<RouteConfig, StoreError>;
    fn read_backend(&self, name: &str) -> Result<BackendConfig, StoreError>;
    fn read_server(&self, name: &str) -> Result<ServerConfig, StoreError>;
}

fn find<T: Clone>(
    records: &[T],
    kind: RecordKind,
    name: &str,
    key: impl Fn(&T) -> &str,
) -> Result<T, StoreError> {
    records
        .iter()
        .find(|r| key(r) == name)
        .cloned()
        .ok_or_else(|| StoreError::NotFound {
            kind,
            name: name.to_string(),
        })
}

impl ConfigStore for GatewayConfig {
    fn read_listener(&self, name: &str) -> Result<ListenerConfig, StoreError> {
        find(&self.listeners, RecordKind::Listener, name, |l| &l.name)
    }

    fn read_route(&self, name: &str) -> Result<RouteConfig, StoreError> {
        find(&self.routes, RecordKind::Route, name, |r| &r.name)
    }

    fn read_backend(&self, name: &str) -> Result<BackendConfig, StoreError> {
        find(&self.backends, RecordKind::Backend, name, |b| &b.name)
    }

    fn read_server(&self, name: &str) -> Result<ServerConfig, StoreError> {
        find(&self.servers, RecordKind::Server, name, |s| &s.name)
    }
}
