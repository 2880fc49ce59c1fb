//! Health checking subsystem.
//!
//! # Endpoints
//! ```text
//! GET /health → 200 "OK!"      (or the health check's replacement)
//! GET /live   → 204            (or the liveness check's replacement)
//! GET /ready  → 204            (or the readiness check's replacement)
//! ```
//!
//! # Design Decisions
//! - Paths are fixed and registered when the server is built
//! - A check decorates the default handler: it may run preconditions and
//!   fall through, or answer on its own
//! - No retries; a failing check signals failure through its status code

pub mod endpoints;

pub use endpoints::{
    default_health_handler, no_content_handler, register, Check, Checks, HEALTHY_BODY, HEALTH_PATH,
    LIVENESS_PATH, READINESS_PATH,
};
