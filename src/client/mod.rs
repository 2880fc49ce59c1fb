//! Outgoing HTTP.
//!
//! # Data Flow
//! ```text
//! ClientFactory → ClientBuilder → Client
//!     → span "http-request" + traceparent injection
//!     → reqwest (per-attempt timeout)
//!     → retry policy (resilience)
//! ```

#[allow(clippy::module_inception)]
pub mod client;
pub mod factory;

pub use client::{Client, ClientError, CLIENT_OPERATION};
pub use factory::{ClientBuilder, ClientFactory};
