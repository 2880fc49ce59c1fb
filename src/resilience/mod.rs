//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing request:
//!     → attempt
//!     → On failure: retries.rs (retryable? within retry_max?)
//!     → backoff.rs (exponential wait with jitter) → next attempt
//! ```

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{is_retryable_error, is_retryable_status, retry_after, RetryPolicy};
