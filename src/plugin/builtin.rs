//! Built-in plugins and multi-backend adapters.

use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{Request, StatusCode};

use crate::http::handler::{handler_fn, HandlerFuture, SharedHandler};
use crate::http::response::error_response;
use crate::http::request_id;
use crate::plugin::registry::{Registries, RegistryError};
use crate::plugin::{BackendHandlers, MultiBackendAdapter, Plugin};

/// Header naming the backend chosen by [`HeaderSelect`].
pub const BACKEND_HEADER: &str = "x-backend";

/// Largest request body [`Failover`] buffers for replay.
pub const FAILOVER_BODY_LIMIT: usize = 1024 * 1024;

/// Register every built-in under its well-known name.
pub fn register_all(registries: &mut Registries) -> Result<(), RegistryError> {
    registries.plugins.register("access-log", Arc::new(AccessLog))?;
    registries
        .adapters
        .register("failover", Arc::new(Failover::new(FAILOVER_BODY_LIMIT)))?;
    registries.adapters.register("header-select", Arc::new(HeaderSelect))?;
    Ok(())
}

/// Logs one line per request: method, path, status, latency.
#[derive(Debug, Default)]
pub struct AccessLog;

impl Plugin for AccessLog {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        handler_fn(move |request: Request<Body>| {
            let next = next.clone();
            async move {
                let start = Instant::now();
                let method = request.method().clone();
                let path = request.uri().path().to_string();
                let id = request_id(request.headers()).to_string();

                let response = next.call(request).await;

                tracing::info!(
                    request_id = %id,
                    method = %method,
                    path = %path,
                    status = response.status().as_u16(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Request handled"
                );
                response
            }
        })
    }
}

/// Tries backends in configured order until one answers with something
/// other than 503.
#[derive(Debug)]
pub struct Failover {
    max_body_bytes: usize,
}

impl Failover {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }
}

impl MultiBackendAdapter for Failover {
    fn dispatch(&self, handlers: BackendHandlers, request: Request<Body>) -> HandlerFuture {
        let limit = self.max_body_bytes;
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let bytes = match axum::body::to_bytes(body, limit).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, limit, "Request body not replayable");
                    return error_response(StatusCode::PAYLOAD_TOO_LARGE, "request body too large");
                }
            };

            let mut last = None;
            for (name, handler) in handlers.iter() {
                let response = handler.call(replay(&parts, &bytes)).await;
                if response.status() != StatusCode::SERVICE_UNAVAILABLE {
                    return response;
                }
                tracing::debug!(backend = %name, "Backend unavailable, failing over");
                last = Some(response);
            }
            last.unwrap_or_else(|| {
                error_response(StatusCode::SERVICE_UNAVAILABLE, "no backends configured")
            })
        })
    }
}

fn replay(parts: &Parts, body: &Bytes) -> Request<Body> {
    let mut request = Request::new(Body::from(body.clone()));
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    request
}

/// Routes to the backend named by the `X-Backend` header, else the first.
#[derive(Debug, Default)]
pub struct HeaderSelect;

impl MultiBackendAdapter for HeaderSelect {
    fn dispatch(&self, handlers: BackendHandlers, request: Request<Body>) -> HandlerFuture {
        let requested = request
            .headers()
            .get(BACKEND_HEADER)
            .and_then(|v| v.to_str().ok());

        let chosen = requested
            .and_then(|name| handlers.get(name))
            .or_else(|| handlers.first().map(|(_, handler)| handler))
            .cloned();

        match chosen {
            Some(handler) => handler.call(request),
            None => Box::pin(async {
                error_response(StatusCode::SERVICE_UNAVAILABLE, "no backends configured")
            }),
        }
    }
}
