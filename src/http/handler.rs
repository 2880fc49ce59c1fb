//! Handler capability: route registration plus request dispatch.
//!
//! Any router satisfying `Handler` can back a `Server`. The default is
//! `ServeMux`, a thin wrapper around an axum `Router`.

use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::response::Response;
use axum::routing::{any, MethodRouter};
use axum::Router;
use futures_util::future::BoxFuture;
use tower::ServiceExt;

/// A shareable request handler.
pub type BoxHandler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wrap an async function as a `BoxHandler`.
pub fn handler_fn<F, Fut>(f: F) -> BoxHandler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |request: Request| -> BoxFuture<'static, Response> { Box::pin(f(request)) })
}

/// Adapt a `BoxHandler` into an axum route accepting every method.
pub fn route_any(handler: BoxHandler) -> MethodRouter {
    any(move |request: Request| {
        let handler = handler.clone();
        async move { handler(request).await }
    })
}

/// Route registration and dispatch.
pub trait Handler: Send + Sync + 'static {
    /// Register `handler` for every method on `pattern`.
    fn handle_func(&mut self, pattern: &str, handler: BoxHandler);

    /// Register a method-aware axum route on `pattern`.
    fn handle(&mut self, pattern: &str, route: MethodRouter);

    /// Dispatch one request through the registered routes.
    fn serve_http(&self, request: Request) -> BoxFuture<'static, Response>;

    /// Snapshot of the current routes, served while the original stays
    /// open to registration.
    fn box_clone(&self) -> Box<dyn Handler>;
}

/// Default `Handler` backed by an axum `Router`.
///
/// # Panics
///
/// Registration panics on an invalid or duplicate pattern, as axum does.
#[derive(Debug, Clone, Default)]
pub struct ServeMux {
    router: Router,
}

impl ServeMux {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Handler for ServeMux {
    fn handle_func(&mut self, pattern: &str, handler: BoxHandler) {
        self.handle(pattern, route_any(handler));
    }

    fn handle(&mut self, pattern: &str, route: MethodRouter) {
        self.router = std::mem::take(&mut self.router).route(pattern, route);
    }

    fn serve_http(&self, request: Request) -> BoxFuture<'static, Response> {
        let router = self.router.clone();
        Box::pin(async move {
            match router.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            }
        })
    }

    fn box_clone(&self) -> Box<dyn Handler> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;

    fn request(method: Method, uri: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_handle_func_accepts_any_method() {
        let mut mux = ServeMux::new();
        mux.handle_func(
            "/echo",
            handler_fn(|req: Request| async move { req.method().to_string().into_response() }),
        );

        let response = mux.serve_http(request(Method::DELETE, "/echo")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"DELETE");
    }

    #[tokio::test]
    async fn test_handle_is_method_aware() {
        let mut mux = ServeMux::new();
        mux.handle("/only-get", get(|| async { "ok" }));

        let ok = mux.serve_http(request(Method::GET, "/only-get")).await;
        assert_eq!(ok.status(), StatusCode::OK);

        let rejected = mux.serve_http(request(Method::POST, "/only-get")).await;
        assert_eq!(rejected.status(), StatusCode::METHOD_NOT_ALLOWED);

        let missing = mux.serve_http(request(Method::GET, "/nope")).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_box_clone_is_a_snapshot() {
        let mut mux = ServeMux::new();
        mux.handle("/before", get(|| async { "ok" }));
        let snapshot = mux.box_clone();
        mux.handle("/after", get(|| async { "ok" }));

        let before = snapshot.serve_http(request(Method::GET, "/before")).await;
        assert_eq!(before.status(), StatusCode::OK);
        let after = snapshot.serve_http(request(Method::GET, "/after")).await;
        assert_eq!(after.status(), StatusCode::NOT_FOUND);
    }
}
