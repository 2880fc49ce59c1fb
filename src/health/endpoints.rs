//! Health, liveness and readiness endpoints.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::http::handler::{handler_fn, BoxHandler, Handler};

pub const HEALTH_PATH: &str = "/health";
pub const LIVENESS_PATH: &str = "/live";
pub const READINESS_PATH: &str = "/ready";

/// Body of the default health response.
pub const HEALTHY_BODY: &str = "OK!";

/// Decorator turning an endpoint's default handler into its replacement.
pub type Check = Arc<dyn Fn(BoxHandler) -> BoxHandler + Send + Sync>;

/// Optional decorators for the three endpoints.
#[derive(Clone, Default)]
pub struct Checks {
    pub health: Option<Check>,
    pub liveness: Option<Check>,
    pub readiness: Option<Check>,
}

impl std::fmt::Debug for Checks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checks")
            .field("health", &self.health.is_some())
            .field("liveness", &self.liveness.is_some())
            .field("readiness", &self.readiness.is_some())
            .finish()
    }
}

/// 200 with body `OK!`.
pub fn default_health_handler() -> BoxHandler {
    handler_fn(|_request| async { (StatusCode::OK, HEALTHY_BODY).into_response() })
}

/// 204 with an empty body.
pub fn no_content_handler() -> BoxHandler {
    handler_fn(|_request| async { StatusCode::NO_CONTENT.into_response() })
}

fn decorate(default: BoxHandler, check: Option<&Check>) -> BoxHandler {
    match check {
        Some(check) => check(default),
        None => default,
    }
}

/// Register the three health routes on `router`.
pub fn register(router: &mut dyn Handler, checks: &Checks) {
    let endpoints = [
        (HEALTH_PATH, decorate(default_health_handler(), checks.health.as_ref())),
        (LIVENESS_PATH, decorate(no_content_handler(), checks.liveness.as_ref())),
        (READINESS_PATH, decorate(no_content_handler(), checks.readiness.as_ref())),
    ];

    for (path, handler) in endpoints {
        router.handle(
            path,
            get(move |request: Request| {
                let handler = handler.clone();
                async move { handler(request).await }
            }),
        );
    }
}
