//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Server and client produce:
//!     → tracing.rs (spans, trace-context propagation)
//!     → logging.rs (structured log events, trace-correlated)
//!     → metrics.rs (request counters and latency histograms)
//! ```
//!
//! # Design Decisions
//! - `Tracer` and `Logger` are capabilities shared via `Arc<dyn _>`
//! - Both default to no-op implementations
//! - Trace ids flow from the tracer into every log entry

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::logging::{Field, Logger, LoggerBuilder, LoggerError, NoopLogger, TracingLogger};
pub use self::tracing::{
    Format, NoopTracer, Span, SpanContext, SpanKind, TraceContextTracer, Tracer,
};
