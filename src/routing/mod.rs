//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, headers)
//!     → router.rs (URI group lookup)
//!     → guard.rs (evaluate guards, guarded routes first)
//!     → Return: route handler response | 404 | 500
//!
//! Route Compilation (at startup):
//!     Route[]
//!     → Group by URI root
//!     → Order guarded before the single unguarded fallback
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (header equality only)
//! - Deterministic: same input always matches same route
//! - First match wins

pub mod guard;
pub mod route;
pub mod router;

pub use guard::{GuardError, RouteGuard};
pub use route::Route;
pub use router::{RouteError, RouteGroup, RouteTable};
