//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! signals.rs: SIGTERM/SIGINT → Shutdown::trigger
//! shutdown.rs: Shutdown::signalled → Server::serve → stop accepting → drain
//! ```
//!
//! # Design Decisions
//! - Signals are subscribed at the entry point and passed into `serve`
//! - Drain is bounded by the server's shutdown delay

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{terminate, Signal};
