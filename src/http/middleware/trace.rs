//! Trace-context propagation for incoming requests.
//!
//! Continues the caller's trace when a `traceparent` header is present,
//! otherwise starts a new one. The span context is stored in the request
//! extensions so handlers and the logger can correlate with it.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::observability::tracing::{SpanContext, SpanKind, Tracer};

/// Operation name of server spans.
pub const SERVER_OPERATION: &str = "http-request";

pub async fn trace_request(
    State(tracer): State<Arc<dyn Tracer>>,
    mut request: Request,
    next: Next,
) -> Response {
    let parent = tracer.extract(request.headers());
    let mut span = tracer.start_span(SERVER_OPERATION, SpanKind::Server, parent.as_ref());
    span.set_tag("http.method", request.method());
    span.set_tag("http.url", request.uri());

    request.extensions_mut().insert(span.context().clone());

    let instrumented = span.tracing_span().clone();
    let response = next.run(request).instrument(instrumented).await;

    let status = response.status();
    span.set_tag("http.status_code", status.as_u16());
    if status.is_server_error() {
        span.set_error();
    }
    tracer.finish(span);
    response
}

/// Span context attached by `trace_request`, if the request went through it.
pub fn span_context(request: &Request) -> Option<&SpanContext> {
    request.extensions().get::<SpanContext>()
}
