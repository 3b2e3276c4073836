//! Compiled routes.

use crate::http::handler::SharedHandler;
use crate::routing::guard::RouteGuard;

/// A URI root bound to a handler, optionally behind a guard.
#[derive(Clone)]
pub struct Route {
    pub name: String,
    pub uri: String,
    pub guard: RouteGuard,
    pub handler: SharedHandler,
}

impl Route {
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        guard_expression: &str,
        handler: SharedHandler,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            guard: RouteGuard::parse(guard_expression),
            handler,
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("uri", &self.uri)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
