//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_server_requests_total` (counter): requests by method, status
//! - `http_server_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op
//! - Status and method labels only, paths are unbounded

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    let method = method.to_string();
    let status = status.to_string();

    metrics::counter!(
        "http_server_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_server_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(elapsed.as_secs_f64());
}
