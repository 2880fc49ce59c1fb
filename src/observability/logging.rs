//! Structured logging.
//!
//! # Responsibilities
//! - Define the `Logger` capability used by the server and the client
//! - Correlate log entries with the active trace
//! - Initialize the `tracing-subscriber` registry for the process
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and `RUST_LOG`

use std::fmt;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::observability::tracing::{Format, SpanContext, Tracer, SPAN_ID_FIELD, TRACE_ID_FIELD};

/// A key/value pair attached to a log entry.
pub type Field<'a> = (&'a str, &'a dyn fmt::Display);

/// Leveled logging capability.
///
/// Every method takes the span context of the operation being logged, if
/// any, so implementations can attach trace ids.
pub trait Logger: Send + Sync + 'static {
    fn log(&self, level: Level, context: Option<&SpanContext>, msg: &str, fields: &[Field<'_>]);

    fn debug(&self, context: Option<&SpanContext>, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::DEBUG, context, msg, fields);
    }

    fn info(&self, context: Option<&SpanContext>, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::INFO, context, msg, fields);
    }

    fn warn(&self, context: Option<&SpanContext>, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::WARN, context, msg, fields);
    }

    fn error(&self, context: Option<&SpanContext>, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::ERROR, context, msg, fields);
    }
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: Level, _context: Option<&SpanContext>, _msg: &str, _fields: &[Field<'_>]) {}
}

/// Logger emitting `tracing` events, enriched with trace ids and initial
/// fields such as host and pid.
#[derive(Clone)]
pub struct TracingLogger {
    tracer: Arc<dyn Tracer>,
    initial_fields: Vec<(String, String)>,
}

impl TracingLogger {
    pub fn initial_fields(&self) -> &[(String, String)] {
        &self.initial_fields
    }

    fn render(&self, fields: &[Field<'_>]) -> String {
        self.initial_fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .chain(fields.iter().map(|(k, v)| format!("{k}={v}")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for TracingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingLogger")
            .field("initial_fields", &self.initial_fields)
            .finish_non_exhaustive()
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, context: Option<&SpanContext>, msg: &str, fields: &[Field<'_>]) {
        let mut ids: Vec<(String, String)> = Vec::new();
        if let Some(context) = context {
            self.tracer.inject(context, Format::TextMap, &mut ids);
        }
        let trace_id = lookup(&ids, TRACE_ID_FIELD);
        let span_id = lookup(&ids, SPAN_ID_FIELD);
        let fields = self.render(fields);

        // Event levels must be constants.
        match level {
            Level::ERROR => tracing::error!(trace_id, span_id, fields = %fields, "{}", msg),
            Level::WARN => tracing::warn!(trace_id, span_id, fields = %fields, "{}", msg),
            Level::INFO => tracing::info!(trace_id, span_id, fields = %fields, "{}", msg),
            Level::DEBUG => tracing::debug!(trace_id, span_id, fields = %fields, "{}", msg),
            Level::TRACE => tracing::trace!(trace_id, span_id, fields = %fields, "{}", msg),
        }
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Error returned when the global subscriber cannot be installed.
#[derive(Debug, thiserror::Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct LoggerError(#[from] TryInitError);

/// Builder for `TracingLogger` and the process-wide subscriber.
pub struct LoggerBuilder {
    tracer: Arc<dyn Tracer>,
    level: Level,
    json: bool,
    initial_fields: Vec<(String, String)>,
}

impl LoggerBuilder {
    /// Defaults: info level, JSON output, no initial fields.
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self {
            tracer,
            level: Level::INFO,
            json: true,
            initial_fields: Vec::new(),
        }
    }

    /// Minimum level logged when `RUST_LOG` is not set.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.initial_fields.push((key.into(), value.to_string()));
        self
    }

    /// Add the hostname under `key`. Skipped when it cannot be determined.
    pub fn with_host(self, key: impl Into<String>) -> Self {
        match hostname() {
            Some(host) => self.with_field(key, host),
            None => self,
        }
    }

    /// Add the process id under `key`.
    pub fn with_pid(self, key: impl Into<String>) -> Self {
        self.with_field(key, std::process::id())
    }

    /// Build the logger without touching the global subscriber.
    pub fn build(self) -> TracingLogger {
        TracingLogger {
            tracer: self.tracer,
            initial_fields: self.initial_fields,
        }
    }

    /// Install the global subscriber and build the logger.
    pub fn init(self) -> Result<TracingLogger, LoggerError> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy();
        let registry = tracing_subscriber::registry().with(filter);

        if self.json {
            // Trace ids become top-level keys next to the message.
            registry
                .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
                .try_init()?;
        } else {
            registry.with(tracing_subscriber::fmt::layer()).try_init()?;
        }

        Ok(self.build())
    }
}

fn hostname() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}
