//! Configuration schema definitions.
//!
//! Every field is optional: an unset field falls back to its documented
//! default at the point of use. Overrides are merged field by field, so a
//! partial config only replaces what it sets.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 10;
pub const DEFAULT_SHUTDOWN_DELAY_SECONDS: u64 = 5;
pub const DEFAULT_SWAGGER_FILE: &str = "/swagger.json";

pub const DEFAULT_CLIENT_TIMEOUT_MS: u64 = 3_000;
pub const DEFAULT_RETRY_WAIT_MIN_MS: u64 = 3_000;
pub const DEFAULT_RETRY_WAIT_MAX_MS: u64 = 30_000;
pub const DEFAULT_RETRY_MAX: u32 = 5;

/// Server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Listen port. 0 means unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Maximum time to read a request body, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,

    /// Maximum time to write a response body, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_timeout_ms: Option<u64>,

    /// Wall-clock bound on handling a single request, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_sec: Option<u64>,

    /// Drain bound after a shutdown signal, in seconds. 0 means unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_delay_seconds: Option<u64>,

    /// Swagger document location, on disk and as a route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swagger_file: Option<String>,
}

impl ServerConfig {
    /// A config with every field set to its documented default.
    pub fn with_defaults() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            read_timeout_ms: Some(DEFAULT_READ_TIMEOUT_MS),
            write_timeout_ms: Some(DEFAULT_WRITE_TIMEOUT_MS),
            request_timeout_sec: Some(DEFAULT_REQUEST_TIMEOUT_SEC),
            shutdown_delay_seconds: Some(DEFAULT_SHUTDOWN_DELAY_SECONDS),
            swagger_file: Some(DEFAULT_SWAGGER_FILE.to_string()),
        }
    }

    /// Replace the fields that `overrides` sets.
    pub fn merge(&mut self, overrides: &ServerConfig) {
        if overrides.port.is_some() {
            self.port = overrides.port;
        }
        if overrides.read_timeout_ms.is_some() {
            self.read_timeout_ms = overrides.read_timeout_ms;
        }
        if overrides.write_timeout_ms.is_some() {
            self.write_timeout_ms = overrides.write_timeout_ms;
        }
        if overrides.request_timeout_sec.is_some() {
            self.request_timeout_sec = overrides.request_timeout_sec;
        }
        if overrides.shutdown_delay_seconds.is_some() {
            self.shutdown_delay_seconds = overrides.shutdown_delay_seconds;
        }
        if overrides.swagger_file.is_some() {
            self.swagger_file = overrides.swagger_file.clone();
        }
    }

    pub fn port(&self) -> u16 {
        self.port.filter(|p| *p > 0).unwrap_or(DEFAULT_PORT)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS))
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms.unwrap_or(DEFAULT_WRITE_TIMEOUT_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .request_timeout_sec
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SEC);
        Duration::from_secs(secs)
    }

    pub fn shutdown_delay(&self) -> Duration {
        let secs = self
            .shutdown_delay_seconds
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_SHUTDOWN_DELAY_SECONDS);
        Duration::from_secs(secs)
    }

    pub fn swagger_file(&self) -> &str {
        self.swagger_file
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_SWAGGER_FILE)
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Total time allowed for a single attempt, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Minimum wait before a retry, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_wait_min_ms: Option<u64>,

    /// Maximum wait before a retry, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_wait_max_ms: Option<u64>,

    /// Maximum number of retries after the first attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_max: Option<u32>,
}

impl ClientConfig {
    /// A config with every field set to its documented default.
    pub fn with_defaults() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_CLIENT_TIMEOUT_MS),
            retry_wait_min_ms: Some(DEFAULT_RETRY_WAIT_MIN_MS),
            retry_wait_max_ms: Some(DEFAULT_RETRY_WAIT_MAX_MS),
            retry_max: Some(DEFAULT_RETRY_MAX),
        }
    }

    /// Replace the fields that `overrides` sets.
    pub fn merge(&mut self, overrides: &ClientConfig) {
        if overrides.timeout_ms.is_some() {
            self.timeout_ms = overrides.timeout_ms;
        }
        if overrides.retry_wait_min_ms.is_some() {
            self.retry_wait_min_ms = overrides.retry_wait_min_ms;
        }
        if overrides.retry_wait_max_ms.is_some() {
            self.retry_wait_max_ms = overrides.retry_wait_max_ms;
        }
        if overrides.retry_max.is_some() {
            self.retry_max = overrides.retry_max;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_CLIENT_TIMEOUT_MS))
    }

    pub fn retry_wait_min(&self) -> Duration {
        Duration::from_millis(self.retry_wait_min_ms.unwrap_or(DEFAULT_RETRY_WAIT_MIN_MS))
    }

    /// Never below `retry_wait_min`.
    pub fn retry_wait_max(&self) -> Duration {
        let max = Duration::from_millis(self.retry_wait_max_ms.unwrap_or(DEFAULT_RETRY_WAIT_MAX_MS));
        max.max(self.retry_wait_min())
    }

    pub fn retry_max(&self) -> u32 {
        self.retry_max.unwrap_or(DEFAULT_RETRY_MAX)
    }
}
