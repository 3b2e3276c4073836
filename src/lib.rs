//! HTTP routing and load-balancing gateway library.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod plugin;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::{build_gateway, Gateway, GatewayContext, Shutdown};
