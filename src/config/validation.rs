//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (listeners → routes → backends → servers)
//! - Validate value ranges (probe intervals > 0, addresses are `host:port`)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, HealthCheckConfig};
use crate::load_balancer::split_host_port;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} '{name}' references unknown {target} '{reference}'")]
    UnknownReference {
        kind: &'static str,
        name: String,
        target: &'static str,
        reference: String,
    },

    #[error("server '{server}' has invalid address '{address}' (expected host:port)")]
    InvalidServerAddress { server: String, address: String },

    #[error("listener '{listener}' has invalid bind address '{address}'")]
    InvalidBindAddress { listener: String, address: String },

    #[error("{context}: health check {field} must be greater than zero")]
    ZeroDuration { context: String, field: &'static str },

    #[error("route '{route}' has {count} backends but no multi_backend_adapter")]
    MissingAdapter { route: String, count: usize },

    #[error("{kind} '{name}' has an empty {field} list")]
    EmptyList {
        kind: &'static str,
        name: String,
        field: &'static str,
    },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    unique_names(config.listeners.iter().map(|l| l.name.as_str()), "listener", &mut errors);
    let routes = unique_names(config.routes.iter().map(|r| r.name.as_str()), "route", &mut errors);
    let backends = unique_names(config.backends.iter().map(|b| b.name.as_str()), "backend", &mut errors);
    let servers = unique_names(config.servers.iter().map(|s| s.name.as_str()), "server", &mut errors);

    for listener in &config.listeners {
        if split_host_port(&listener.bind_address).is_err() {
            errors.push(ValidationError::InvalidBindAddress {
                listener: listener.name.clone(),
                address: listener.bind_address.clone(),
            });
        }
        check_references(&mut errors, "listener", &listener.name, "route", &listener.routes, &routes);
    }

    for route in &config.routes {
        if route.backends.is_empty() {
            errors.push(ValidationError::EmptyList {
                kind: "route",
                name: route.name.clone(),
                field: "backends",
            });
        }
        if route.backends.len() > 1 && route.multi_backend_adapter.is_none() {
            errors.push(ValidationError::MissingAdapter {
                route: route.name.clone(),
                count: route.backends.len(),
            });
        }
        check_references(&mut errors, "route", &route.name, "backend", &route.backends, &backends);
    }

    for backend in &config.backends {
        if backend.servers.is_empty() {
            errors.push(ValidationError::EmptyList {
                kind: "backend",
                name: backend.name.clone(),
                field: "servers",
            });
        }
        check_references(&mut errors, "backend", &backend.name, "server", &backend.servers, &servers);
    }

    check_health(&mut errors, "health_check".to_string(), &config.health_check);
    for server in &config.servers {
        if split_host_port(&server.address).is_err() {
            errors.push(ValidationError::InvalidServerAddress {
                server: server.name.clone(),
                address: server.address.clone(),
            });
        }
        if let Some(check) = &server.health_check {
            check_health(&mut errors, format!("server '{}'", server.name), check);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn unique_names<'a>(
    names: impl Iterator<Item = &'a str>,
    kind: &'static str,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
    }
    seen
}

fn check_references(
    errors: &mut Vec<ValidationError>,
    kind: &'static str,
    name: &str,
    target: &'static str,
    references: &[String],
    known: &HashSet<&str>,
) {
    for reference in references {
        if !known.contains(reference.as_str()) {
            errors.push(ValidationError::UnknownReference {
                kind,
                name: name.to_string(),
                target,
                reference: reference.clone(),
            });
        }
    }
}

fn check_health(errors: &mut Vec<ValidationError>, context: String, check: &HealthCheckConfig) {
    if check.interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration {
            context: context.clone(),
            field: "interval_ms",
        });
    }
    if check.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration {
            context,
            field: "timeout_ms",
        });
    }
}
