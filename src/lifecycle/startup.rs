//! Gateway assembly.
//!
//! # Responsibilities
//! - Read one listener's routes from the configuration store
//! - Build each referenced backend exactly once
//! - Compose plugins around per-backend forwarders
//! - Attach a multi-backend adapter where a route names several backends
//! - Compile the result into a [`RouteTable`]
//!
//! # Design Decisions
//! - Fail fast: any missing record or unknown name aborts the build
//! - Registries are passed in, never looked up globally
//! - Health checkers start as backends are built; [`Gateway::shutdown`]
//!   stops them

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigStore, ListenerConfig, RouteConfig, StoreError};
use crate::health::HealthContext;
use crate::http::handler::SharedHandler;
use crate::http::{HttpClient, RequestForwarder};
use crate::load_balancer::{Backend, BackendError};
use crate::plugin::{compose, BackendHandlers, MultiBackendHandler, Plugin, Registries};
use crate::routing::{Route, RouteError, RouteTable};

/// Errors assembling a gateway.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("backend '{backend}': {source}")]
    Backend {
        backend: String,
        #[source]
        source: BackendError,
    },

    #[error("route '{route}' has no backends")]
    NoBackends { route: String },

    #[error("route '{route}' has {count} backends but no multi_backend_adapter")]
    MissingAdapter { route: String, count: usize },

    #[error("route '{route}' references unknown multi-backend adapter '{adapter}'")]
    UnknownAdapter { route: String, adapter: String },

    #[error("route '{route}' references unknown plugin '{plugin}'")]
    UnknownPlugin { route: String, plugin: String },

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Inputs shared by every backend and route of one gateway.
pub struct GatewayContext<'a> {
    pub store: &'a dyn ConfigStore,
    pub registries: &'a Registries,
    pub client: HttpClient,
    pub health: HealthContext,
    pub local_hostname: String,
}

/// A listener's compiled routes plus the backends they reach.
#[derive(Debug)]
pub struct Gateway {
    listener: ListenerConfig,
    routes: Arc<RouteTable>,
    backends: HashMap<String, Backend>,
}

impl Gateway {
    pub fn listener(&self) -> &ListenerConfig {
        &self.listener
    }

    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.clone()
    }

    pub fn backend(&self, name: &str) -> Option<&Backend> {
        self.backends.get(name)
    }

    /// Backend names, sorted.
    pub fn backend_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Stop every backend's health checkers.
    pub fn shutdown(&self) {
        for backend in self.backends.values() {
            backend.shutdown();
        }
    }
}

/// Build the gateway serving listener `listener_name`.
pub fn build_gateway(ctx: &GatewayContext<'_>, listener_name: &str) -> Result<Gateway, BuildError> {
    let listener = ctx.store.read_listener(listener_name)?;
    let mut backends: HashMap<String, Backend> = HashMap::new();
    let mut routes = Vec::with_capacity(listener.routes.len());

    for route_name in &listener.routes {
        let config = ctx.store.read_route(route_name)?;
        let handler = build_route_handler(ctx, &config, &mut backends)?;
        routes.push(Route::new(&config.name, &config.uri, &config.guard, handler));
    }

    // Dropping the backends on error stops their checkers.
    let table = RouteTable::build(routes)?;

    tracing::info!(
        listener = %listener.name,
        routes = listener.routes.len(),
        backends = backends.len(),
        "Gateway assembled"
    );

    Ok(Gateway {
        listener,
        routes: Arc::new(table),
        backends,
    })
}

fn build_route_handler(
    ctx: &GatewayContext<'_>,
    config: &RouteConfig,
    backends: &mut HashMap<String, Backend>,
) -> Result<SharedHandler, BuildError> {
    if config.backends.is_empty() {
        return Err(BuildError::NoBackends {
            route: config.name.clone(),
        });
    }

    let plugins = config
        .plugins
        .iter()
        .map(|name| {
            ctx.registries
                .plugins
                .get(name)
                .ok_or_else(|| BuildError::UnknownPlugin {
                    route: config.name.clone(),
                    plugin: name.clone(),
                })
        })
        .collect::<Result<Vec<Arc<dyn Plugin>>, _>>()?;

    let adapter = match (&config.multi_backend_adapter, config.backends.len()) {
        (_, 1) => None,
        (None, count) => {
            return Err(BuildError::MissingAdapter {
                route: config.name.clone(),
                count,
            })
        }
        (Some(name), _) => Some(ctx.registries.adapters.get(name).ok_or_else(|| {
            BuildError::UnknownAdapter {
                route: config.name.clone(),
                adapter: name.clone(),
            }
        })?),
    };

    let mut handlers = Vec::with_capacity(config.backends.len());
    for backend_name in &config.backends {
        let backend = backend_for(ctx, backend_name, backends)?;
        let forwarder: SharedHandler = Arc::new(RequestForwarder::new(backend, ctx.client.clone()));
        handlers.push((backend_name.clone(), compose(&plugins, forwarder)));
    }

    match adapter {
        None => Ok(handlers.remove(0).1),
        Some(adapter) => Ok(Arc::new(MultiBackendHandler::new(
            adapter,
            BackendHandlers::new(handlers),
        ))),
    }
}

fn backend_for(
    ctx: &GatewayContext<'_>,
    name: &str,
    backends: &mut HashMap<String, Backend>,
) -> Result<Backend, BuildError> {
    if let Some(backend) = backends.get(name) {
        return Ok(backend.clone());
    }

    let wrap = |source: BackendError| BuildError::Backend {
        backend: name.to_string(),
        source,
    };
    let config = ctx.store.read_backend(name)?;
    let backend = Backend::from_config(&config, ctx.store, &ctx.health, &ctx.local_hostname)
        .map_err(wrap)?;

    tracing::debug!(
        backend = %name,
        policy = %config.load_balancer,
        servers = config.servers.len(),
        "Backend created"
    );
    backends.insert(name.to_string(), backend.clone());
    Ok(backend)
}
