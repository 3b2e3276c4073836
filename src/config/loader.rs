//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config file extension: {0:?}")]
    UnsupportedFormat(Option<String>),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML or JSON file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let extension = path.extension().and_then(|e| e.to_str());

    let config = match extension {
        Some("toml") => parse_toml(&content)?,
        Some("json") => serde_json::from_str(&content)?,
        other => return Err(ConfigError::UnsupportedFormat(other.map(str::to_string))),
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        path = %path.display(),
        listeners = config.listeners.len(),
        routes = config.routes.len(),
        backends = config.backends.len(),
        servers = config.servers.len(),
        "Configuration parsed"
    );
    Ok(config)
}

/// Parse a TOML document without validating it.
pub fn parse_toml(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_toml() {
        let path = write_temp(
            "gateway.toml",
            r#"
            [[listeners]]
            name = "main"
            bind_address = "127.0.0.1:8080"
            routes = ["r1"]

            [[routes]]
            name = "r1"
            uri = "/"
            backends = ["be1"]

            [[backends]]
            name = "be1"
            servers = ["s1"]

            [[servers]]
            name = "s1"
            address = "127.0.0.1:3000"
            "#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.listeners[0].name, "main");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_json() {
        let path = write_temp(
            "gateway.json",
            r#"{
                "backends": [{"name": "be1", "servers": ["s1"], "load_balancer": "prefer-local"}],
                "servers": [{"name": "s1", "address": "localhost:3000"}]
            }"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.backends[0].servers, vec!["s1"]);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_validation_failure_surfaces() {
        let path = write_temp(
            "broken.toml",
            r#"
            [[backends]]
            name = "be1"
            servers = ["nope"]
            "#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("unknown server 'nope'"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_unsupported_extension() {
        let path = write_temp("gateway.yaml", "");
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::UnsupportedFormat(Some(ext))) if ext == "yaml"
        ));
        fs::remove_file(path).unwrap();
    }
}
