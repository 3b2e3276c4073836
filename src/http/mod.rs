//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → routing::RouteTable (URI group → guard → route handler)
//!     → plugin chain (handler.rs composition)
//!     → forward.rs (load balancer picks endpoint, upstream call)
//!     → response streamed back to client
//! ```

pub mod client;
pub mod forward;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use client::{build_client, HttpClient};
pub use forward::RequestForwarder;
pub use handler::{handler_fn, Handler, HandlerFuture, SharedHandler};
pub use request::{request_id, X_REQUEST_ID};
pub use response::error_response;
pub use server::HttpServer;
