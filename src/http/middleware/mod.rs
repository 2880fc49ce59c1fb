//! Request middleware pipeline.
//!
//! # Data Flow
//! ```text
//! request
//!     → body read/write timeouts (tower-http)
//!     → latency.rs (debug log + request metrics)
//!     → trace.rs (extract traceparent, server span)
//!     → timeout.rs (503 "timeout" past request_timeout_sec)
//!     → router
//! ```

pub mod latency;
pub mod timeout;
pub mod trace;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer};

use crate::config::ServerConfig;
use crate::observability::{Logger, Tracer};

pub use timeout::TIMEOUT_BODY;
pub use trace::{span_context, SERVER_OPERATION};

/// Wrap `router` in the full pipeline. The last layer added is outermost.
pub fn apply(
    router: Router,
    config: &ServerConfig,
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
) -> Router {
    router
        .layer(from_fn_with_state(config.request_timeout(), timeout::request_timeout))
        .layer(from_fn_with_state(tracer, trace::trace_request))
        .layer(from_fn_with_state(logger, latency::log_latency))
        .layer(RequestBodyTimeoutLayer::new(config.read_timeout()))
        .layer(ResponseBodyTimeoutLayer::new(config.write_timeout()))
}
