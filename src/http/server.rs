//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router that funnels every path into the route table
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve a bound listener until shutdown, draining in-flight requests

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::TimeoutConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::Gateway;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
}

/// HTTP front end for one listener.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(gateway: &Gateway, timeouts: &TimeoutConfig) -> Self {
        let state = AppState {
            routes: gateway.routes(),
        };
        Self {
            router: Self::build_router(state, Duration::from_secs(timeouts.request_secs)),
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: trace, set request ID, propagate request ID, timeout.
    fn build_router(state: AppState, request_timeout: Duration) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            ))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Every request goes through the route table.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    tracing::debug!(method = %request.method(), path = %request.uri().path(), "Dispatching request");
    state.routes.dispatch(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use tower::ServiceExt;

    use crate::http::handler::handler_fn;
    use crate::http::X_REQUEST_ID;
    use crate::routing::Route;

    fn router_with(handler: crate::http::SharedHandler, timeout: Duration) -> Router {
        let table = RouteTable::build(vec![Route::new("echo", "/echo/", "", handler)]).unwrap();
        HttpServer::build_router(
            AppState {
                routes: Arc::new(table),
            },
            timeout,
        )
    }

    fn router() -> Router {
        let handler = handler_fn(|req: Request<Body>| async move {
            let id = req
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            (StatusCode::OK, id).into_response()
        });
        router_with(handler, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_request_id_assigned_and_echoed() {
        let response = router()
            .oneshot(Request::builder().uri("/echo/x").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let header = response.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body, header.as_bytes());
        assert_eq!(header.len(), 36);
    }

    #[tokio::test]
    async fn test_client_request_id_kept() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/echo/")
                    .header(X_REQUEST_ID, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn test_unrouted_path_is_404() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let slow = handler_fn(|_req: Request<Body>| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            StatusCode::OK.into_response()
        });
        let response = router_with(slow, Duration::from_millis(50))
            .oneshot(Request::builder().uri("/echo/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(response.headers().contains_key(X_REQUEST_ID));
    }
}
