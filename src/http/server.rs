//! HTTP server lifecycle.
//!
//! # Responsibilities
//! - Own the router, tracer, logger and resolved config
//! - Wrap the router in the middleware pipeline
//! - Bind, serve, and race the listen loop against the shutdown signal
//! - Drain in-flight requests within `shutdown_delay_seconds`
//!
//! # Design Decisions
//! - The shutdown signal is any future, subscribed to by the caller
//! - A drain that outlives the delay is reported, not hidden

use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::response::Response;
use axum::Router;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceExt;

use crate::config::ServerConfig;
use crate::http::handler::{BoxHandler, Handler};
use crate::http::middleware;
use crate::observability::{Logger, Tracer};

/// Errors ending a `serve` call.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server failed: {0}")]
    Serve(#[source] io::Error),

    #[error("in-flight requests did not drain within {0:?}")]
    ShutdownTimeout(Duration),
}

/// An HTTP server built by `ServerFactory`.
pub struct Server {
    router: Box<dyn Handler>,
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
    config: ServerConfig,
}

impl Server {
    pub(crate) fn new(
        router: Box<dyn Handler>,
        tracer: Arc<dyn Tracer>,
        logger: Arc<dyn Logger>,
        config: ServerConfig,
    ) -> Self {
        Self {
            router,
            tracer,
            logger,
            config,
        }
    }

    /// Resolved configuration snapshot.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Router for registering application routes.
    pub fn router_mut(&mut self) -> &mut dyn Handler {
        self.router.as_mut()
    }

    /// Register `handler` for every method on `pattern`.
    pub fn handle_func(&mut self, pattern: &str, handler: BoxHandler) {
        self.router.handle_func(pattern, handler);
    }

    /// The router's dispatch wrapped in the middleware pipeline.
    ///
    /// Routes registered afterwards are not part of the returned service.
    pub fn service(&self) -> Router {
        middleware::apply(
            dispatch(Arc::from(self.router.box_clone())),
            &self.config,
            self.tracer.clone(),
            self.logger.clone(),
        )
    }

    /// Dispatch one request through the pipeline without a socket.
    pub fn serve_http(&self, request: Request) -> BoxFuture<'static, Response> {
        let service = self.service();
        Box::pin(async move {
            match service.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            }
        })
    }

    /// Bind `0.0.0.0:<port>` and serve until `signal` resolves.
    pub async fn serve<S>(self, signal: S) -> Result<(), ServeError>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port()));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                self.logger.error(
                    None,
                    "server failed to start",
                    &[("address", &addr), ("error", &source)],
                );
                return Err(ServeError::Bind { addr, source });
            }
        };
        self.serve_on(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves, then
    /// drain for at most `shutdown_delay_seconds`.
    pub async fn serve_on<S>(self, listener: TcpListener, signal: S) -> Result<(), ServeError>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let port = listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or_else(|_| self.config.port());
        let delay = self.config.shutdown_delay();
        let app = self.service();
        let logger = self.logger;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let serving = axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .into_future();
        tokio::pin!(serving);
        tokio::pin!(signal);

        logger.info(None, "server started successfully", &[("port", &port)]);

        tokio::select! {
            result = &mut serving => {
                // The listen loop only returns early on failure.
                return match result {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        logger.error(None, "server failed", &[("error", &e)]);
                        Err(ServeError::Serve(e))
                    }
                };
            }
            _ = &mut signal => {
                logger.info(None, "signal received", &[]);
            }
        }

        let _ = stop_tx.send(());

        match tokio::time::timeout(delay, serving).await {
            Ok(Ok(())) => {
                logger.info(None, "server exited successfully", &[]);
                Ok(())
            }
            Ok(Err(e)) => {
                logger.error(None, "server failed while draining", &[("error", &e)]);
                Err(ServeError::Serve(e))
            }
            Err(_) => {
                let waited = format!("{delay:?}");
                logger.error(
                    None,
                    "server shutdown timed out",
                    &[("delay", &waited)],
                );
                Err(ServeError::ShutdownTimeout(delay))
            }
        }
    }
}

/// Every request falls through to `handler`, which does its own routing.
fn dispatch(handler: Arc<dyn Handler>) -> Router {
    Router::new().fallback(move |request: Request| {
        let handler = handler.clone();
        async move { handler.serve_http(request).await }
    })
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
