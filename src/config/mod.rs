//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML) + environment
//!     → loader.rs (parse, merge layers, environment wins)
//!     → AppConfig::value (typed section, field-wise overlay)
//!     → schema.rs (ServerConfig / ClientConfig with optional fields)
//!     → factories merge overrides, then named setters, last applied wins
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a server or client is built from it
//! - All fields are optional; defaults apply at the point of use
//! - Loading is separate from the factories so either can be used alone

pub mod loader;
pub mod schema;

pub use loader::{AppConfig, ConfigError, ConfigSection};
pub use schema::{ClientConfig, ServerConfig};
