//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (checker.rs):
//!     Interval timer (one task per endpoint)
//!     → Probe: custom check | GET http://{address}{ping_uri} | none
//!     → Race against probe timeout
//!     → Update endpoint.rs liveness flag
//!
//! Load balancers read the flag on every selection.
//! ```
//!
//! # Design Decisions
//! - One writer per endpoint (its checker), many readers
//! - Probe errors are logged, never returned
//! - Checkers stop when their owning load balancer shuts them down

pub mod checker;
pub mod endpoint;

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::http::HttpClient;

pub use checker::{HealthChecker, HealthContext, HealthSettings, ProbeMode};
pub use endpoint::Endpoint;

/// A custom probe: resolves to true when the endpoint is healthy.
pub type HealthCheckFn =
    Arc<dyn Fn(Arc<Endpoint>, HttpClient) -> BoxFuture<'static, bool> + Send + Sync>;
