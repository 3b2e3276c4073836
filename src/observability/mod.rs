//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit `tracing` events
//!     → request ID attached by the HTTP layer (x-request-id)
//!     → logging.rs subscriber (pretty, compact or JSON on stdout)
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings
//! - Request ID flows through every per-request event

pub mod logging;

pub use logging::init_logging;
