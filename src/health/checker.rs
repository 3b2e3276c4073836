//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe one endpoint
//! - Update the endpoint's liveness from the probe result
//!
//! Probe failures never leave this module; they only flip the endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::{HealthCheckConfig, HealthCheckKind, ServerConfig};
use crate::health::endpoint::Endpoint;
use crate::health::HealthCheckFn;
use crate::http::HttpClient;
use crate::plugin::registry::HealthCheckRegistry;

const USER_AGENT: &str = "route-gateway-health-check";

/// Whether a checker keeps probing or runs a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    Loop,
    Once,
}

/// Resolved probe parameters for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSettings {
    pub kind: HealthCheckKind,
    pub interval: Duration,
    pub timeout: Duration,
}

impl From<&HealthCheckConfig> for HealthSettings {
    fn from(config: &HealthCheckConfig) -> Self {
        Self {
            kind: config.kind,
            interval: Duration::from_millis(config.interval_ms),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Probe loop bound to a single endpoint.
pub struct HealthChecker {
    endpoint: Arc<Endpoint>,
    settings: HealthSettings,
    client: HttpClient,
    custom: Option<HealthCheckFn>,
}

impl HealthChecker {
    pub fn new(endpoint: Arc<Endpoint>, settings: HealthSettings, client: HttpClient) -> Self {
        Self {
            endpoint,
            settings,
            client,
            custom: None,
        }
    }

    /// Use a custom probe instead of the built-in kinds.
    pub fn with_custom(mut self, check: HealthCheckFn) -> Self {
        self.custom = Some(check);
        self
    }

    /// False for `kind = "none"` without a custom probe: nothing to run.
    pub fn is_active(&self) -> bool {
        self.custom.is_some() || self.settings.kind != HealthCheckKind::None
    }

    /// Run one probe and record the outcome on the endpoint.
    pub async fn check_once(&self) -> bool {
        if !self.is_active() {
            return self.endpoint.is_up();
        }

        let healthy = match &self.custom {
            Some(check) => {
                let probe = check(self.endpoint.clone(), self.client.clone());
                match time::timeout(self.settings.timeout, probe).await {
                    Ok(healthy) => healthy,
                    Err(_) => {
                        tracing::debug!(address = %self.endpoint.address(), "Custom health check timed out");
                        false
                    }
                }
            }
            None => self.http_get().await,
        };

        self.endpoint.mark_up(healthy);
        healthy
    }

    async fn http_get(&self) -> bool {
        let address = self.endpoint.address();
        let url = match self.endpoint.ping_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Invalid health check URL");
                return false;
            }
        };

        let request = match Request::builder()
            .method("GET")
            .uri(url.as_str())
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Failed to build health check request");
                return false;
            }
        };

        match time::timeout(self.settings.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let ok = response.status() == StatusCode::OK;
                if !ok {
                    tracing::debug!(address = %address, status = %response.status(), "Health check failed: non-200 status");
                }
                ok
            }
            Ok(Err(e)) => {
                tracing::debug!(address = %address, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(address = %address, "Health check failed: timeout");
                false
            }
        }
    }

    /// Probe until shutdown (or once, in [`ProbeMode::Once`]).
    pub async fn run(self, mode: ProbeMode, mut shutdown: broadcast::Receiver<()>) {
        if !self.is_active() {
            return;
        }

        tracing::debug!(
            address = %self.endpoint.address(),
            interval = ?self.settings.interval,
            timeout = ?self.settings.timeout,
            "Health checker starting"
        );

        loop {
            tokio::select! {
                _ = self.check_once() => {}
                _ = shutdown.recv() => break,
            }

            if mode == ProbeMode::Once {
                break;
            }

            tokio::select! {
                _ = time::sleep(self.settings.interval) => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::debug!(address = %self.endpoint.address(), "Health checker stopped");
    }

    /// Spawn [`HealthChecker::run`] on the current runtime.
    pub fn spawn(self, mode: ProbeMode, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(mode, shutdown))
    }
}

/// Everything a load balancer needs to attach checkers to its endpoints.
#[derive(Clone)]
pub struct HealthContext {
    pub defaults: HealthCheckConfig,
    pub client: HttpClient,
    pub custom: HealthCheckRegistry,
    pub mode: ProbeMode,
}

impl HealthContext {
    pub fn new(
        defaults: HealthCheckConfig,
        client: HttpClient,
        custom: HealthCheckRegistry,
        mode: ProbeMode,
    ) -> Self {
        Self {
            defaults,
            client,
            custom,
            mode,
        }
    }

    /// Checker for `server`, honouring its override and any custom probe.
    pub fn checker_for(&self, server: &ServerConfig, endpoint: Arc<Endpoint>) -> HealthChecker {
        let config = server.health_check.as_ref().unwrap_or(&self.defaults);
        let checker = HealthChecker::new(endpoint, HealthSettings::from(config), self.client.clone());
        match self.custom.get(&server.name) {
            Some(check) => checker.with_custom(check),
            None => checker,
        }
    }
}

impl std::fmt::Debug for HealthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthContext")
            .field("defaults", &self.defaults)
            .field("custom", &self.custom)
            .field("mode", &self.mode)
            .finish()
    }
}
