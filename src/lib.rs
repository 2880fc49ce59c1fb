//! Composable building blocks for instrumented HTTP services.
//!
//! # Architecture Overview
//!
//! ```text
//!   AppConfig (file + env) ──▶ ServerConfig / ClientConfig
//!                                   │                │
//!                                   ▼                ▼
//!   ServerFactory ─▶ ServerBuilder ─▶ Server    ClientFactory ─▶ Client
//!                                   │                │
//!                 /health /live /ready, swagger      │ span + traceparent
//!                 timeout → tracing → latency        │ retry with backoff
//!                                   │                │
//!                                   ▼                ▼
//!                        Tracer / Logger (observability)
//! ```

pub mod client;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use client::{Client, ClientBuilder, ClientError, ClientFactory};
pub use config::{AppConfig, ClientConfig, ConfigError, ServerConfig};
pub use http::{handler_fn, BoxHandler, Handler, ServeError, ServeMux, Server, ServerBuilder, ServerFactory};
pub use lifecycle::Shutdown;
pub use observability::{Logger, NoopLogger, NoopTracer, SpanContext, TraceContextTracer, Tracer};
