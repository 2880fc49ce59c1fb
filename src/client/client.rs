//! Instrumented HTTP client.
//!
//! Each call opens a client-kind span, injects its trace context into the
//! outgoing headers, and runs the retry loop inside it.

use std::sync::Arc;

use reqwest::{Method, Request, RequestBuilder, Response, StatusCode, Url};
use tracing::Instrument;

use crate::observability::{Format, Logger, SpanContext, SpanKind, Tracer};
use crate::resilience::{is_retryable_error, is_retryable_status, retry_after, RetryPolicy};

/// Operation name of client spans.
pub const CLIENT_OPERATION: &str = "http-request";

/// Errors returned by `Client`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(#[source] reqwest::Error),

    #[error("{method} {url} failed after {attempts} attempt(s): {source}")]
    Request {
        method: Method,
        url: Url,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} giving up after {attempts} attempt(s), last status {status}")]
    RetriesExhausted {
        method: Method,
        url: Url,
        attempts: u32,
        status: StatusCode,
    },
}

/// HTTP client built by `ClientFactory`. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    policy: RetryPolicy,
    tracer: Arc<dyn Tracer>,
    logger: Arc<dyn Logger>,
}

impl Client {
    pub(crate) fn new(
        http: reqwest::Client,
        policy: RetryPolicy,
        tracer: Arc<dyn Tracer>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            http,
            policy,
            tracer,
            logger,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Start a request. Send it with `send` to get tracing and retries.
    pub fn request(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.http.request(method, url)
    }

    pub fn get(&self, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.http.get(url)
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let request = builder.build().map_err(ClientError::InvalidRequest)?;
        self.execute(request).await
    }

    pub async fn execute(&self, request: Request) -> Result<Response, ClientError> {
        self.execute_with_parent(None, request).await
    }

    /// Execute `request` as a child of `parent`, typically the span context
    /// of the server request being handled.
    pub async fn execute_with_parent(
        &self,
        parent: Option<&SpanContext>,
        mut request: Request,
    ) -> Result<Response, ClientError> {
        let mut span = self
            .tracer
            .start_span(CLIENT_OPERATION, SpanKind::Client, parent);
        span.set_tag("http.method", request.method());
        span.set_tag("http.url", request.url());
        self.tracer
            .inject(span.context(), Format::HttpHeaders, request.headers_mut());

        let instrumented = span.tracing_span().clone();
        let result = self
            .run(request, span.context())
            .instrument(instrumented)
            .await;

        match &result {
            Ok(response) => {
                span.set_tag("http.status_code", response.status().as_u16());
                if response.status().is_server_error() {
                    span.set_error();
                }
            }
            Err(_) => span.set_error(),
        }
        self.tracer.finish(span);
        result
    }

    async fn run(&self, request: Request, context: &SpanContext) -> Result<Response, ClientError> {
        let method = request.method().clone();
        let url = request.url().clone();
        let mut current = request;
        let mut attempts = 0;

        loop {
            attempts += 1;
            // Bodies that cannot be cloned, such as streams, get one attempt.
            let spare = current.try_clone();

            let wait = match self.http.execute(current).await {
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) {
                        return Ok(response);
                    }
                    let Some(spare) = spare else {
                        return Ok(response);
                    };
                    if !self.policy.allows(attempts) {
                        self.logger.warn(
                            Some(context),
                            "giving up on request",
                            &[("url", &url), ("status", &status), ("attempts", &attempts)],
                        );
                        return Err(ClientError::RetriesExhausted {
                            method,
                            url,
                            attempts,
                            status,
                        });
                    }
                    current = spare;
                    self.policy
                        .backoff(attempts, retry_after(status, response.headers()))
                }
                Err(source) => {
                    let spare = match spare {
                        Some(spare)
                            if is_retryable_error(&source) && self.policy.allows(attempts) =>
                        {
                            spare
                        }
                        _ => {
                            self.logger.warn(
                                Some(context),
                                "request failed",
                                &[("url", &url), ("attempts", &attempts), ("error", &source)],
                            );
                            return Err(ClientError::Request {
                                method,
                                url,
                                attempts,
                                source,
                            });
                        }
                    };
                    self.logger.debug(
                        Some(context),
                        "request error",
                        &[("url", &url), ("error", &source)],
                    );
                    current = spare;
                    self.policy.backoff(attempts, None)
                }
            };

            let delay = format!("{wait:?}");
            self.logger.debug(
                Some(context),
                "retrying request",
                &[("url", &url), ("attempt", &attempts), ("delay", &delay)],
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
