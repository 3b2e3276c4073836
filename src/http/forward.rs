//! Request forwarding to a backend.
//!
//! # Responsibilities
//! - Ask the backend's load balancer for a connect address
//! - Rewrite the request URI to that address and send it upstream
//! - Stream the upstream response back verbatim
//! - Map selection and transport failures to 503

use std::str::FromStr;

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderMap, HeaderName, Request, StatusCode, Uri, Version};
use axum::response::Response;

use crate::http::handler::{Handler, HandlerFuture};
use crate::http::response::error_response;
use crate::http::HttpClient;
use crate::load_balancer::Backend;

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Base handler of every route: forwards to one backend.
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    backend: Backend,
    client: HttpClient,
}

impl RequestForwarder {
    pub fn new(backend: Backend, client: HttpClient) -> Self {
        Self { backend, client }
    }

    async fn forward(self, request: Request<Body>) -> Response {
        let address = match self.backend.connect_address() {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(backend = %self.backend.name(), error = %e, "No endpoint selected");
                return error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string());
            }
        };

        let (mut parts, body) = request.into_parts();
        parts.uri = match rewrite_uri(&parts.uri, &address) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(backend = %self.backend.name(), address = %address, error = %e, "Cannot build upstream URI");
                return error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("backend '{}' unavailable", self.backend.name()),
                );
            }
        };
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);

        tracing::debug!(
            backend = %self.backend.name(),
            method = %parts.method,
            uri = %parts.uri,
            "Forwarding request"
        );

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(backend = %self.backend.name(), address = %address, error = %e, "Upstream error");
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("backend '{}' request failed: {}", self.backend.name(), e),
                )
            }
        }
    }
}

impl Handler for RequestForwarder {
    fn call(&self, request: Request<Body>) -> HandlerFuture {
        Box::pin(self.clone().forward(request))
    }
}

/// Point `uri` at `http://{address}`, keeping path and query.
pub fn rewrite_uri(uri: &Uri, address: &str) -> Result<Uri, axum::http::Error> {
    let mut parts = uri.clone().into_parts();
    parts.scheme = Some(Scheme::HTTP);
    parts.authority = Some(Authority::from_str(address)?);
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    Ok(Uri::from_parts(parts)?)
}

/// Remove hop-by-hop headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_str(name.trim()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::config::TimeoutConfig;
    use crate::http::build_client;
    use crate::load_balancer::round_robin::tests::{no_probes, server};
    use crate::load_balancer::{LoadBalancer, RoundRobin};

    async fn hello_backend() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let response = "HTTP/1.1 200 OK\r\nX-Backend-Id: one\r\nContent-Type: text/plain\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello";
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr.to_string()
    }

    async fn closed_port() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    fn forwarder(address: &str) -> (RequestForwarder, Arc<RoundRobin>) {
        let lb = Arc::new(RoundRobin::new("be1", &[server("s1", address)], &no_probes()).unwrap());
        let backend = Backend::new("be1", lb.clone());
        (RequestForwarder::new(backend, build_client(&TimeoutConfig::default())), lb)
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header("host", "gateway.local")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (forwarder, _lb) = forwarder(&hello_backend().await);
        let response = forwarder.call(get("/greet?x=1")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-backend-id"], "one");
        assert_eq!(response.headers()["content-type"], "text/plain");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_no_healthy_endpoint_is_503() {
        let address = hello_backend().await;
        let (forwarder, lb) = forwarder(&address);
        lb.mark_endpoint_down(&address).unwrap();

        let response = forwarder.call(get("/")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(
            String::from_utf8_lossy(&body),
            "no healthy endpoint available for backend 'be1'"
        );
    }

    #[tokio::test]
    async fn test_transport_error_is_503() {
        let (forwarder, _lb) = forwarder(&closed_port().await);
        let response = forwarder.call(get("/")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(String::from_utf8_lossy(&body).starts_with("backend 'be1' request failed"));
    }

    #[test]
    fn test_rewrite_uri() {
        let uri: Uri = "/a/b?c=d".parse().unwrap();
        assert_eq!(rewrite_uri(&uri, "s1:3000").unwrap(), "http://s1:3000/a/b?c=d");

        let uri: Uri = "http://front.example/x".parse().unwrap();
        assert_eq!(rewrite_uri(&uri, "10.0.0.2:80").unwrap(), "http://10.0.0.2:80/x");
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", "keep-alive, x-private".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert("x-private", "1".parse().unwrap());
        headers.insert("soapaction", "foo".parse().unwrap());

        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["soapaction"], "foo");
    }
}
