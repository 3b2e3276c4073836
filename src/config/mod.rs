//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → store.rs (read once by name while the gateway is assembled)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the core never re-reads it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, GatewayConfig, HealthCheckConfig, HealthCheckKind, ListenerConfig,
    LoadBalancerPolicy, LocalityConfig, LogFormat, ObservabilityConfig, RouteConfig,
    ServerConfig, TimeoutConfig,
};
pub use store::{ConfigStore, RecordKind, StoreError};
