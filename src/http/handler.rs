//! Request handler abstraction.
//!
//! Everything between route dispatch and the backend call is a [`Handler`]:
//! the forwarder, each plugin layer wrapped around it, and multi-backend
//! dispatchers. Handlers are shared (`Arc`) and composed at startup.

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;

pub type HandlerFuture = BoxFuture<'static, Response>;

/// Something that turns a request into a response.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: Request<Body>) -> HandlerFuture;
}

pub type SharedHandler = Arc<dyn Handler>;

/// Adapter turning an async closure into a [`Handler`].
pub struct HandlerFn<F>(F);

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, request: Request<Body>) -> HandlerFuture {
        Box::pin((self.0)(request))
    }
}

/// Wrap an async closure as a shared handler.
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(HandlerFn(f))
}
