//! Plugin subsystem.
//!
//! # Data Flow
//! ```text
//! Route config: plugins = [outer, inner], backends = [a, b], adapter = "x"
//!     → per backend: outer(inner(RequestForwarder))
//!     → one backend:   that handler is the route handler
//!     → many backends: adapter "x" dispatches over {a: .., b: ..}
//! ```
//!
//! # Design Decisions
//! - Plugins and adapters are looked up by name in injected registries
//! - Composition happens once at startup; handlers are immutable afterwards

pub mod builtin;
pub mod registry;

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;

use crate::http::handler::{Handler, HandlerFuture, SharedHandler};

pub use registry::{
    AdapterRegistry, HealthCheckRegistry, PluginRegistry, Registries, Registry, RegistryError,
};

/// A wrapper that observes or transforms traffic around a handler.
pub trait Plugin: Send + Sync + 'static {
    fn wrap(&self, next: SharedHandler) -> SharedHandler;
}

/// Decides how a request fans out over, or chooses among, several backends.
pub trait MultiBackendAdapter: Send + Sync + 'static {
    fn dispatch(&self, handlers: BackendHandlers, request: Request<Body>) -> HandlerFuture;
}

/// Per-backend handlers of one route, in configured order.
#[derive(Clone)]
pub struct BackendHandlers {
    entries: Arc<Vec<(String, SharedHandler)>>,
}

impl BackendHandlers {
    pub fn new(entries: Vec<(String, SharedHandler)>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SharedHandler> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, handler)| handler)
    }

    pub fn first(&self) -> Option<&(String, SharedHandler)> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, SharedHandler)> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Route handler that delegates to a multi-backend adapter.
pub struct MultiBackendHandler {
    adapter: Arc<dyn MultiBackendAdapter>,
    handlers: BackendHandlers,
}

impl MultiBackendHandler {
    pub fn new(adapter: Arc<dyn MultiBackendAdapter>, handlers: BackendHandlers) -> Self {
        Self { adapter, handlers }
    }
}

impl Handler for MultiBackendHandler {
    fn call(&self, request: Request<Body>) -> HandlerFuture {
        self.adapter.dispatch(self.handlers.clone(), request)
    }
}

/// Wrap `base` in `plugins`; the first plugin ends up outermost.
pub fn compose(plugins: &[Arc<dyn Plugin>], base: SharedHandler) -> SharedHandler {
    plugins
        .iter()
        .rev()
        .fold(base, |handler, plugin| plugin.wrap(handler))
}
