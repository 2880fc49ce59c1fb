//! Request latency logging.
//!
//! Outermost stage of the pipeline: observes the complete response,
//! including one produced by the timeout stage.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::observability::logging::Logger;
use crate::observability::metrics;
use crate::observability::tracing::SpanContext;

pub async fn log_latency(
    State(logger): State<Arc<dyn Logger>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_string();
    let method = request.method().clone();
    let context = request.extensions().get::<SpanContext>().cloned();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let time = format!("{elapsed:?}");
    logger.debug(
        context.as_ref(),
        "http path response time",
        &[("path", &path), ("method", &method), ("time", &time)],
    );
    metrics::record_request(method.as_str(), response.status().as_u16(), elapsed);

    response
}
