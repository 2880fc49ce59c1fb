//! Server construction.
//!
//! `ServerFactory` holds shared defaults. `create()` starts a
//! `ServerBuilder` whose setters apply in call order, so the last one to
//! touch a field wins.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::health::{self, Check, Checks};
use crate::http::handler::{BoxHandler, Handler, ServeMux};
use crate::http::server::Server;
use crate::http::swagger;
use crate::observability::{Logger, NoopLogger, NoopTracer, Tracer};

type RouterFactory = Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>;

/// Defaults shared by every server it creates.
#[derive(Clone)]
pub struct ServerFactory {
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
    config: ServerConfig,
    router: RouterFactory,
}

impl Default for ServerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerFactory {
    /// No-op tracer and logger, default config, `ServeMux` router.
    pub fn new() -> Self {
        Self {
            tracer: Arc::new(NoopTracer),
            logger: Arc::new(NoopLogger),
            config: ServerConfig::with_defaults(),
            router: Arc::new(|| Box::new(ServeMux::new()) as Box<dyn Handler>),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Merge the fields `config` sets over the factory defaults.
    pub fn with_config(mut self, config: &ServerConfig) -> Self {
        self.config.merge(config);
        self
    }

    /// Supply a fresh router for each server.
    pub fn with_router<F>(mut self, router: F) -> Self
    where
        F: Fn() -> Box<dyn Handler> + Send + Sync + 'static,
    {
        self.router = Arc::new(router);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn create(&self) -> ServerBuilder {
        ServerBuilder {
            tracer: self.tracer.clone(),
            logger: self.logger.clone(),
            config: self.config.clone(),
            router: None,
            router_factory: self.router.clone(),
            checks: Checks::default(),
        }
    }
}

impl std::fmt::Debug for ServerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Per-server overrides on top of a factory's defaults.
pub struct ServerBuilder {
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
    config: ServerConfig,
    router: Option<Box<dyn Handler>>,
    router_factory: RouterFactory,
    checks: Checks,
}

impl ServerBuilder {
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Merge the fields `config` sets.
    pub fn config(mut self, config: &ServerConfig) -> Self {
        self.config.merge(config);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = Some(port);
        self
    }

    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = Some(ms);
        self
    }

    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = Some(ms);
        self
    }

    pub fn request_timeout_sec(mut self, secs: u64) -> Self {
        self.config.request_timeout_sec = Some(secs);
        self
    }

    pub fn shutdown_delay_seconds(mut self, secs: u64) -> Self {
        self.config.shutdown_delay_seconds = Some(secs);
        self
    }

    pub fn swagger_file(mut self, file: impl Into<String>) -> Self {
        self.config.swagger_file = Some(file.into());
        self
    }

    /// Decorate the default `/health` handler.
    pub fn health_check<F>(mut self, check: F) -> Self
    where
        F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
    {
        self.checks.health = Some(Arc::new(check) as Check);
        self
    }

    /// Decorate the default `/live` handler.
    pub fn liveness_check<F>(mut self, check: F) -> Self
    where
        F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
    {
        self.checks.liveness = Some(Arc::new(check) as Check);
        self
    }

    /// Decorate the default `/ready` handler.
    pub fn readiness_check<F>(mut self, check: F) -> Self
    where
        F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
    {
        self.checks.readiness = Some(Arc::new(check) as Check);
        self
    }

    /// Use `router` instead of one from the factory.
    pub fn router(mut self, router: Box<dyn Handler>) -> Self {
        self.router = Some(router);
        self
    }

    /// Register the health endpoints and, if its file exists, swagger.
    pub fn build(self) -> Server {
        let mut router = self.router.unwrap_or_else(|| (self.router_factory)());

        health::register(router.as_mut(), &self.checks);
        swagger::register(router.as_mut(), self.config.swagger_file(), self.logger.as_ref());

        Server::new(router, self.tracer, self.logger, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_factory_defaults() {
        let server = ServerFactory::new().create().build();
        assert_eq!(server.config(), &ServerConfig::with_defaults());
    }

    #[test]
    fn test_factory_config_merges_over_defaults() {
        let factory = ServerFactory::new().with_config(&ServerConfig {
            port: Some(9000),
            ..ServerConfig::default()
        });
        let server = factory.create().build();

        assert_eq!(server.config().port(), 9000);
        assert_eq!(server.config().request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_builder_setters_last_wins() {
        let server = ServerFactory::new()
            .create()
            .port(9001)
            .config(&ServerConfig {
                port: Some(9002),
                shutdown_delay_seconds: Some(2),
                ..ServerConfig::default()
            })
            .shutdown_delay_seconds(7)
            .build();

        assert_eq!(server.config().port(), 9002);
        assert_eq!(server.config().shutdown_delay(), Duration::from_secs(7));
    }

    #[test]
    fn test_builders_do_not_share_overrides() {
        let factory = ServerFactory::new();
        let first = factory.create().port(9100).build();
        let second = factory.create().build();

        assert_eq!(first.config().port(), 9100);
        assert_eq!(second.config().port(), 8080);
    }
}
