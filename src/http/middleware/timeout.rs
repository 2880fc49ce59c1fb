//! Request timeout enforcement.
//!
//! Bounds the wall-clock time spent handling a request. On expiry the
//! inner future is dropped, cancelling the handler at its next await
//! point, and the caller gets 503 with body `timeout`.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Body of a timed-out response.
pub const TIMEOUT_BODY: &str = "timeout";

pub async fn request_timeout(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, TIMEOUT_BODY).into_response(),
    }
}
