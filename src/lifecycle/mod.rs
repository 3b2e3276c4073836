//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     ConfigStore → backends (health checkers start) → routes → RouteTable
//!
//! Shutdown (shutdown.rs):
//!     Signal received → stop accepting → drain → stop health checkers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then backends, then the listener
//! - One broadcast channel fans the stop signal out to every task

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{trigger_on_signal, wait_for_signal};
pub use startup::{build_gateway, BuildError, Gateway, GatewayContext};
