//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use route_gateway::config::{
    BackendConfig, GatewayConfig, HealthCheckConfig, HealthCheckKind, ListenerConfig,
    LoadBalancerPolicy, RouteConfig, ServerConfig,
};
use route_gateway::health::{HealthContext, ProbeMode};
use route_gateway::http::{build_client, HttpServer};
use route_gateway::lifecycle::{build_gateway, BuildError, Gateway, GatewayContext, Shutdown};
use route_gateway::plugin::Registries;

/// Start a mock backend on an ephemeral port.
///
/// `respond` sees the raw request head and returns status and body.
pub async fn start_programmable_backend<F>(respond: F) -> SocketAddr
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&head).into_owned();
                let (status, body) = respond(head.as_str());
                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    500 => "Internal Server Error",
                    503 => "Service Unavailable",
                    _ => "Unknown",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nX-Mock: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len(),
                    addr.port(),
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Mock backend that always answers 200 with `body`.
pub async fn start_mock_backend(body: &'static str) -> SocketAddr {
    start_programmable_backend(move |_| (200, body.to_string())).await
}

/// Value of request header `name` in a raw request head.
pub fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

pub fn server(name: &str, address: impl Into<String>) -> ServerConfig {
    ServerConfig {
        name: name.into(),
        address: address.into(),
        ping_uri: "/".into(),
        health_check: None,
    }
}

pub fn backend(name: &str, servers: &[&str], policy: LoadBalancerPolicy) -> BackendConfig {
    BackendConfig {
        name: name.into(),
        servers: servers.iter().map(|s| s.to_string()).collect(),
        load_balancer: policy,
    }
}

pub fn route(name: &str, uri: &str, backends: &[&str], guard: &str) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        uri: uri.into(),
        backends: backends.iter().map(|b| b.to_string()).collect(),
        guard: guard.into(),
        plugins: Vec::new(),
        multi_backend_adapter: None,
    }
}

/// Config with a single listener serving `routes`, probes disabled.
pub fn config(
    servers: Vec<ServerConfig>,
    backends: Vec<BackendConfig>,
    routes: Vec<RouteConfig>,
) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listeners.push(ListenerConfig {
        bind_address: "127.0.0.1:0".into(),
        routes: routes.iter().map(|r| r.name.clone()).collect(),
        ..Default::default()
    });
    config.servers = servers;
    config.backends = backends;
    config.routes = routes;
    config.health_check = HealthCheckConfig {
        kind: HealthCheckKind::None,
        ..Default::default()
    };
    config
}

pub fn try_build(
    config: &GatewayConfig,
    mode: ProbeMode,
    local_hostname: &str,
) -> Result<Gateway, BuildError> {
    let client = build_client(&config.timeouts);
    let registries = Registries::with_builtins().unwrap();
    let ctx = GatewayContext {
        store: config,
        registries: &registries,
        client: client.clone(),
        health: HealthContext::new(
            config.health_check.clone(),
            client,
            registries.health_checks.clone(),
            mode,
        ),
        local_hostname: local_hostname.into(),
    };
    build_gateway(&ctx, "default")
}

/// A gateway serving on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub gateway: Gateway,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
        self.gateway.shutdown();
    }
}

pub async fn spawn_gateway(config: &GatewayConfig, mode: ProbeMode, local_hostname: &str) -> TestGateway {
    let gateway = try_build(config, mode, local_hostname).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&gateway, &config.timeouts);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestGateway {
        addr,
        gateway,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
