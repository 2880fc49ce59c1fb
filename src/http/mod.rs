//! HTTP server subsystem.
//!
//! # Data Flow
//! ```text
//! ServerFactory (defaults)
//!     → ServerBuilder (overrides, health endpoints, swagger)
//!     → Server
//!         → middleware (timeouts, latency, tracing)
//!         → Handler (ServeMux by default)
//! ```

pub mod factory;
pub mod handler;
pub mod middleware;
pub mod server;
pub mod swagger;

pub use factory::{ServerBuilder, ServerFactory};
pub use handler::{handler_fn, route_any, BoxHandler, Handler, ServeMux};
pub use server::{ServeError, Server};
