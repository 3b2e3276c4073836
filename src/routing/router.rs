//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Group routes by URI root
//! - Order each group: guarded routes first, at most one unguarded last
//! - Look up the group for a request path
//! - Evaluate guards in order and hand the request to the first match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) exact lookup via HashMap, longest-prefix scan for subtree roots
//! - Configuration defects in a group are build errors, never panics

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use thiserror::Error;

use crate::http::response::error_response;
use crate::routing::route::Route;

/// Errors detected while assembling the route table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("URI '{uri}' has more than one unguarded route: {}", .routes.join(", "))]
    MultipleUnguarded { uri: String, routes: Vec<String> },

    #[error("route '{route}' has an empty URI")]
    EmptyUri { route: String },
}

/// All routes sharing one URI root, in dispatch order.
#[derive(Debug)]
pub struct RouteGroup {
    uri: String,
    routes: Vec<Route>,
}

impl RouteGroup {
    /// Order `routes` guarded-first, keeping relative order within each half.
    pub fn new(uri: impl Into<String>, routes: Vec<Route>) -> Result<Self, RouteError> {
        let uri = uri.into();
        let (guarded, unguarded): (Vec<Route>, Vec<Route>) =
            routes.into_iter().partition(|r| r.guard.is_guarded());

        if unguarded.len() > 1 {
            return Err(RouteError::MultipleUnguarded {
                uri,
                routes: unguarded.into_iter().map(|r| r.name).collect(),
            });
        }

        let mut routes = guarded;
        routes.extend(unguarded);
        Ok(Self { uri, routes })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Hand the request to the first route whose guard accepts it.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        for route in &self.routes {
            match route.guard.evaluate(&request) {
                Ok(true) => {
                    tracing::debug!(route = %route.name, uri = %self.uri, "Route matched");
                    return route.handler.call(request).await;
                }
                Ok(false) => continue,
                Err(e) => {
                    tracing::error!(route = %route.name, error = %e, "Guard evaluation failed");
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "route guard error");
                }
            }
        }

        tracing::debug!(uri = %self.uri, path = %request.uri().path(), "No guard matched");
        error_response(StatusCode::NOT_FOUND, "no matching route")
    }
}

/// Compiled, read-only dispatch structure for one listener.
#[derive(Debug)]
pub struct RouteTable {
    groups: Vec<RouteGroup>,
    exact: HashMap<String, usize>,
    /// Indices of groups whose URI ends in '/', longest URI first.
    subtrees: Vec<usize>,
}

impl RouteTable {
    /// Group `routes` by URI and compile each group.
    pub fn build(routes: Vec<Route>) -> Result<Self, RouteError> {
        let mut order: Vec<String> = Vec::new();
        let mut by_uri: HashMap<String, Vec<Route>> = HashMap::new();
        for route in routes {
            if route.uri.is_empty() {
                return Err(RouteError::EmptyUri { route: route.name });
            }
            if !by_uri.contains_key(&route.uri) {
                order.push(route.uri.clone());
            }
            by_uri.entry(route.uri.clone()).or_default().push(route);
        }

        let mut groups = Vec::with_capacity(order.len());
        for uri in order {
            let routes = by_uri.remove(&uri).unwrap_or_default();
            groups.push(RouteGroup::new(uri, routes)?);
        }

        let exact = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.uri.clone(), i))
            .collect();
        let mut subtrees: Vec<usize> = groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.uri.ends_with('/'))
            .map(|(i, _)| i)
            .collect();
        subtrees.sort_by_key(|&i| std::cmp::Reverse(groups[i].uri.len()));

        for group in &groups {
            tracing::info!(
                uri = %group.uri,
                routes = ?group.routes.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
                "Route group compiled"
            );
        }

        Ok(Self {
            groups,
            exact,
            subtrees,
        })
    }

    /// Group serving `path`: exact URI first, then the longest '/'-terminated root.
    pub fn lookup(&self, path: &str) -> Option<&RouteGroup> {
        if let Some(&i) = self.exact.get(path) {
            return Some(&self.groups[i]);
        }
        self.subtrees
            .iter()
            .map(|&i| &self.groups[i])
            .find(|g| path.starts_with(&g.uri))
    }

    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        match self.lookup(request.uri().path()) {
            Some(group) => group.dispatch(request).await,
            None => {
                tracing::debug!(path = %request.uri().path(), "No route group for path");
                error_response(StatusCode::NOT_FOUND, "no matching route")
            }
        }
    }

    pub fn groups(&self) -> &[RouteGroup] {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    use crate::http::handler::{handler_fn, SharedHandler};

    fn named(name: &'static str) -> SharedHandler {
        handler_fn(move |_req: Request<Body>| async move { (StatusCode::OK, name).into_response() })
    }

    fn route(name: &'static str, uri: &str, guard: &str) -> Route {
        Route::new(name, uri, guard, named(name))
    }

    async fn body_of(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8_lossy(&body).into_owned()
    }

    fn request(path: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_group_orders_guarded_first() {
        let group = RouteGroup::new(
            "/svc",
            vec![
                route("fallback", "/svc", ""),
                route("foo", "/svc", "SOAPAction=foo"),
                route("bar", "/svc", "SOAPAction=bar"),
            ],
        )
        .unwrap();
        let names: Vec<&str> = group.routes().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar", "fallback"]);
    }

    #[test]
    fn test_two_unguarded_routes_rejected() {
        let err = RouteTable::build(vec![
            route("a", "/svc", ""),
            route("guarded", "/svc", "SOAPAction=foo"),
            route("b", "/svc", ""),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RouteError::MultipleUnguarded {
                uri: "/svc".into(),
                routes: vec!["a".into(), "b".into()],
            }
        );
        assert_eq!(err.to_string(), "URI '/svc' has more than one unguarded route: a, b");
    }

    #[tokio::test]
    async fn test_guard_dispatch() {
        let table = RouteTable::build(vec![
            route("fallback", "/svc", ""),
            route("soap-foo", "/svc", "SOAPAction=foo"),
        ])
        .unwrap();

        let response = table.dispatch(request("/svc", &[("SOAPAction", "foo")])).await;
        assert_eq!(body_of(response).await, "soap-foo");

        let response = table.dispatch(request("/svc", &[("SOAPAction", "other")])).await;
        assert_eq!(body_of(response).await, "fallback");

        let response = table.dispatch(request("/svc", &[])).await;
        assert_eq!(body_of(response).await, "fallback");
    }

    #[tokio::test]
    async fn test_no_guard_matches_is_404() {
        let table = RouteTable::build(vec![route("soap-foo", "/svc", "SOAPAction=foo")]).unwrap();
        let response = table.dispatch(request("/svc", &[])).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_guard_is_500() {
        let table = RouteTable::build(vec![
            route("broken", "/svc", "SOAPAction"),
            route("fallback", "/svc", ""),
        ])
        .unwrap();
        let response = table.dispatch(request("/svc", &[])).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_uri_lookup() {
        let table = RouteTable::build(vec![
            route("root", "/", ""),
            route("api", "/api/", ""),
            route("exact", "/api/health", ""),
        ])
        .unwrap();

        assert_eq!(table.lookup("/api/health").unwrap().uri(), "/api/health");
        assert_eq!(table.lookup("/api/health/deep").unwrap().uri(), "/api/");
        assert_eq!(table.lookup("/api/").unwrap().uri(), "/api/");
        assert_eq!(table.lookup("/api").unwrap().uri(), "/");
        assert_eq!(table.lookup("/other").unwrap().uri(), "/");

        let table = RouteTable::build(vec![route("exact", "/svc", "")]).unwrap();
        assert!(table.lookup("/svc/x").is_none());
        let response = table.dispatch(request("/nothing", &[])).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_empty_uri_rejected() {
        assert_eq!(
            RouteTable::build(vec![route("r", "", "")]).unwrap_err(),
            RouteError::EmptyUri { route: "r".into() }
        );
    }
}
