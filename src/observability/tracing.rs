//! Distributed tracing capability.
//!
//! # Responsibilities
//! - Define the `Tracer` capability shared by the server and the client
//! - Start spans and carry their `SpanContext` across process boundaries
//! - Bridge spans onto the `tracing` crate so log output is correlated
//!
//! # Design Decisions
//! - `NoopTracer` is the default everywhere: no ids, no propagation
//! - Supports W3C Trace Context (`traceparent`) for HTTP propagation
//! - Carriers are abstracted (`Injector`/`Extractor`) so the same tracer
//!   writes HTTP headers and structured log fields

use std::fmt;
use std::time::Instant;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use rand::Rng;
use tracing::field;
use uuid::Uuid;

/// The W3C Trace Context header for trace propagation.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Log field carrying the trace id in `Format::TextMap` carriers.
pub const TRACE_ID_FIELD: &str = "trace_id";

/// Log field carrying the span id in `Format::TextMap` carriers.
pub const SPAN_ID_FIELD: &str = "span_id";

/// Role of a span in an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Handling an incoming request.
    Server,
    /// Issuing an outgoing request.
    Client,
    Internal,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Server => "server",
            SpanKind::Client => "client",
            SpanKind::Internal => "internal",
        }
    }
}

/// Carrier format used by `Tracer::inject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// HTTP headers (`traceparent`).
    HttpHeaders,
    /// Flat key/value pairs, used for log correlation.
    TextMap,
}

/// Identity of a span that can cross process boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanContext {
    /// 128-bit trace id, 32 lowercase hex chars.
    pub trace_id: String,
    /// 64-bit span id, 16 lowercase hex chars.
    pub span_id: String,
    pub sampled: bool,
}

impl SpanContext {
    /// The empty context handed out by `NoopTracer`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true when both ids are present.
    pub fn is_valid(&self) -> bool {
        !self.trace_id.is_empty() && !self.span_id.is_empty()
    }

    /// Format as a `traceparent` header value.
    pub fn to_traceparent(&self) -> String {
        let flags = if self.sampled { "01" } else { "00" };
        format!("00-{}-{}-{}", self.trace_id, self.span_id, flags)
    }

    /// Parse a `traceparent` header value.
    ///
    /// Format: `{version}-{trace-id}-{parent-span-id}-{flags}`
    /// Example: `00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let parts: Vec<&str> = value.trim().split('-').collect();
        if parts.len() != 4 || parts[0] != "00" {
            return None;
        }

        let (trace_id, span_id, flags) = (parts[1], parts[2], parts[3]);
        if !is_hex_id(trace_id, 32) || !is_hex_id(span_id, 16) || flags.len() != 2 {
            return None;
        }
        let flags = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_ascii_lowercase(),
            span_id: span_id.to_ascii_lowercase(),
            sampled: flags & 0x01 != 0,
        })
    }
}

// All-zero ids are invalid per W3C Trace Context.
fn is_hex_id(value: &str, len: usize) -> bool {
    value.len() == len
        && value.chars().all(|c| c.is_ascii_hexdigit())
        && value.chars().any(|c| c != '0')
}

/// Write side of a propagation carrier.
pub trait Injector {
    fn set(&mut self, key: &str, value: String);
}

/// Read side of a propagation carrier.
pub trait Extractor {
    fn get(&self, key: &str) -> Option<&str>;
}

impl Injector for HeaderMap {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.insert(name, value);
        }
    }
}

impl Extractor for HeaderMap {
    fn get(&self, key: &str) -> Option<&str> {
        HeaderMap::get(self, key).and_then(|v| v.to_str().ok())
    }
}

impl Injector for Vec<(String, String)> {
    fn set(&mut self, key: &str, value: String) {
        self.push((key.to_string(), value));
    }
}

/// A single traced operation.
///
/// Tags are mirrored onto the bridged `tracing` span when the field was
/// declared there (`http.method`, `http.url`, `http.status_code`, `error`).
#[derive(Debug)]
pub struct Span {
    context: SpanContext,
    parent_span_id: Option<String>,
    operation: String,
    kind: SpanKind,
    started: Instant,
    tags: Vec<(String, String)>,
    inner: tracing::Span,
}

impl Span {
    /// A span that records tags locally but propagates nothing.
    pub fn noop(operation: &str, kind: SpanKind) -> Self {
        Self {
            context: SpanContext::empty(),
            parent_span_id: None,
            operation: operation.to_string(),
            kind,
            started: Instant::now(),
            tags: Vec::new(),
            inner: tracing::Span::none(),
        }
    }

    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    pub fn parent_span_id(&self) -> Option<&str> {
        self.parent_span_id.as_deref()
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn kind(&self) -> SpanKind {
        self.kind
    }

    /// The `tracing` span this span is bridged onto.
    pub fn tracing_span(&self) -> &tracing::Span {
        &self.inner
    }

    pub fn set_tag(&mut self, key: &str, value: impl fmt::Display) {
        let value = value.to_string();
        self.inner.record(key, value.as_str());
        self.tags.push((key.to_string(), value));
    }

    /// Last value recorded for `key`.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_error(&mut self) {
        self.set_tag("error", true);
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if self.context.is_valid() {
            tracing::trace!(
                parent: &self.inner,
                operation = %self.operation,
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "span finished"
            );
        }
    }
}

/// Tracing capability consumed by the server and the client.
pub trait Tracer: Send + Sync + 'static {
    /// Start a span, continuing `parent`'s trace when given.
    fn start_span(&self, operation: &str, kind: SpanKind, parent: Option<&SpanContext>) -> Span;

    /// Write `context` into `carrier`.
    fn inject(&self, context: &SpanContext, format: Format, carrier: &mut dyn Injector);

    /// Read a propagated context from HTTP headers.
    fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext>;

    /// Finish `span` once its operation completed. Exporters hook in here.
    fn finish(&self, span: Span) {
        drop(span);
    }
}

/// Tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn start_span(&self, operation: &str, kind: SpanKind, _parent: Option<&SpanContext>) -> Span {
        Span::noop(operation, kind)
    }

    fn inject(&self, _context: &SpanContext, _format: Format, _carrier: &mut dyn Injector) {}

    fn extract(&self, _carrier: &dyn Extractor) -> Option<SpanContext> {
        None
    }
}

/// W3C Trace Context tracer backed by `tracing` spans.
#[derive(Debug, Clone)]
pub struct TraceContextTracer {
    service_name: String,
}

impl TraceContextTracer {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn generate_trace_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn generate_span_id() -> String {
        format!("{:016x}", rand::thread_rng().gen_range(1..=u64::MAX))
    }
}

impl Default for TraceContextTracer {
    fn default() -> Self {
        Self::new("unknown")
    }
}

impl Tracer for TraceContextTracer {
    fn start_span(&self, operation: &str, kind: SpanKind, parent: Option<&SpanContext>) -> Span {
        let parent = parent.filter(|p| p.is_valid());
        let context = SpanContext {
            trace_id: parent
                .map(|p| p.trace_id.clone())
                .unwrap_or_else(Self::generate_trace_id),
            span_id: Self::generate_span_id(),
            sampled: parent.map(|p| p.sampled).unwrap_or(true),
        };

        let inner = tracing::info_span!(
            "span",
            service = %self.service_name,
            operation = %operation,
            kind = kind.as_str(),
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            http.method = field::Empty,
            http.url = field::Empty,
            http.status_code = field::Empty,
            error = field::Empty,
        );

        Span {
            context,
            parent_span_id: parent.map(|p| p.span_id.clone()),
            operation: operation.to_string(),
            kind,
            started: Instant::now(),
            tags: Vec::new(),
            inner,
        }
    }

    fn inject(&self, context: &SpanContext, format: Format, carrier: &mut dyn Injector) {
        if !context.is_valid() {
            return;
        }
        match format {
            Format::HttpHeaders => carrier.set(TRACEPARENT_HEADER, context.to_traceparent()),
            Format::TextMap => {
                carrier.set(TRACE_ID_FIELD, context.trace_id.clone());
                carrier.set(SPAN_ID_FIELD, context.span_id.clone());
            }
        }
    }

    fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext> {
        carrier
            .get(TRACEPARENT_HEADER)
            .and_then(SpanContext::from_traceparent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

    #[test]
    fn test_parse_traceparent() {
        let cx = SpanContext::from_traceparent(TRACEPARENT).unwrap();
        assert_eq!(cx.trace_id, "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(cx.span_id, "b7ad6b7169203331");
        assert!(cx.sampled);
        assert_eq!(cx.to_traceparent(), TRACEPARENT);
    }

    #[test]
    fn test_parse_traceparent_invalid() {
        assert!(SpanContext::from_traceparent("").is_none());
        assert!(SpanContext::from_traceparent("invalid").is_none());
        assert!(SpanContext::from_traceparent("00-abc-def-01").is_none());
        assert!(SpanContext::from_traceparent(
            "01-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"
        )
        .is_none());
        assert!(SpanContext::from_traceparent(
            "00-00000000000000000000000000000000-b7ad6b7169203331-01"
        )
        .is_none());
    }

    #[test]
    fn test_child_span_continues_trace() {
        let tracer = TraceContextTracer::new("test");
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT_HEADER, HeaderValue::from_static(TRACEPARENT));

        let parent = tracer.extract(&headers).unwrap();
        let span = tracer.start_span("http-request", SpanKind::Server, Some(&parent));

        assert_eq!(span.context().trace_id, parent.trace_id);
        assert_ne!(span.context().span_id, parent.span_id);
        assert_eq!(span.parent_span_id(), Some("b7ad6b7169203331"));
    }

    #[test]
    fn test_root_span_has_fresh_ids() {
        let tracer = TraceContextTracer::default();
        let span = tracer.start_span("op", SpanKind::Internal, None);

        assert_eq!(span.context().trace_id.len(), 32);
        assert_eq!(span.context().span_id.len(), 16);
        assert!(span.parent_span_id().is_none());
    }

    #[test]
    fn test_inject_formats() {
        let tracer = TraceContextTracer::default();
        let span = tracer.start_span("op", SpanKind::Client, None);

        let mut headers = HeaderMap::new();
        tracer.inject(span.context(), Format::HttpHeaders, &mut headers);
        let injected = Extractor::get(&headers, TRACEPARENT_HEADER).unwrap();
        assert_eq!(injected, span.context().to_traceparent());

        let mut fields: Vec<(String, String)> = Vec::new();
        tracer.inject(span.context(), Format::TextMap, &mut fields);
        assert_eq!(fields[0], (TRACE_ID_FIELD.to_string(), span.context().trace_id.clone()));
        assert_eq!(fields[1], (SPAN_ID_FIELD.to_string(), span.context().span_id.clone()));
    }

    #[test]
    fn test_noop_tracer_propagates_nothing() {
        let tracer = NoopTracer;
        let mut span = tracer.start_span("op", SpanKind::Server, None);
        assert!(!span.context().is_valid());

        let mut headers = HeaderMap::new();
        tracer.inject(span.context(), Format::HttpHeaders, &mut headers);
        assert!(headers.is_empty());

        span.set_tag("http.method", "GET");
        assert_eq!(span.tag("http.method"), Some("GET"));
    }
}
