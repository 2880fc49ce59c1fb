//! Client construction, mirroring the server factory.

use std::sync::Arc;

use crate::client::client::{Client, ClientError};
use crate::config::ClientConfig;
use crate::observability::{Logger, NoopLogger, NoopTracer, Tracer};
use crate::resilience::RetryPolicy;

/// Defaults shared by every client it creates.
#[derive(Clone)]
pub struct ClientFactory {
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
    config: ClientConfig,
}

impl Default for ClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory {
    pub fn new() -> Self {
        Self {
            tracer: Arc::new(NoopTracer),
            logger: Arc::new(NoopLogger),
            config: ClientConfig::with_defaults(),
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
    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.config.merge(config);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn create(&self) -> ClientBuilder {
        ClientBuilder {
            tracer: self.tracer.clone(),
            logger: self.logger.clone(),
            config: self.config.clone(),
        }
    }
}

impl std::fmt::Debug for ClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Per-client overrides. Setters apply in call order.
pub struct ClientBuilder {
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.config.merge(config);
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = Some(ms);
        self
    }

    pub fn retry_wait_min_ms(mut self, ms: u64) -> Self {
        self.config.retry_wait_min_ms = Some(ms);
        self
    }

    pub fn retry_wait_max_ms(mut self, ms: u64) -> Self {
        self.config.retry_wait_max_ms = Some(ms);
        self
    }

    pub fn retry_max(mut self, retries: u32) -> Self {
        self.config.retry_max = Some(retries);
        self
    }

    pub fn build(self) -> Result<Client, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(self.config.timeout())
            .build()?;

        Ok(Client::new(
            http,
            RetryPolicy::from_config(&self.config),
            self.tracer,
            self.logger,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder_overrides_factory_config() {
        let factory = ClientFactory::new().with_config(&ClientConfig {
            retry_max: Some(2),
            ..ClientConfig::default()
        });

        let client = factory.create().retry_wait_min_ms(10).build().unwrap();
        assert_eq!(client.policy().max_retries, 2);
        assert_eq!(client.policy().wait_min, Duration::from_millis(10));

        let client = factory.create().retry_max(0).build().unwrap();
        assert_eq!(client.policy().max_retries, 0);
        assert_eq!(client.policy().wait_min, Duration::from_millis(3_000));
    }
}
