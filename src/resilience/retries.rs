//! Retry policy for outgoing requests.
//!
//! # Responsibilities
//! - Decide whether a response status or transport error is retryable
//! - Compute the wait before the next attempt
//!
//! # Design Decisions
//! - Connection errors, 429 and 5xx are retryable; 501 is not, since the
//!   server will never implement the method
//! - `Retry-After` from a 429 or 503 overrides the computed backoff, still
//!   capped at `wait_max`

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

use crate::config::ClientConfig;
use crate::resilience::backoff::calculate_backoff;

/// Retry limits for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub wait_min: Duration,
    pub wait_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.retry_max(),
            wait_min: config.retry_wait_min(),
            wait_max: config.retry_wait_max(),
        }
    }

    /// Whether another attempt is allowed after `attempts` have been made.
    pub fn allows(&self, attempts: u32) -> bool {
        attempts <= self.max_retries
    }

    /// Wait before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(wait) => wait.min(self.wait_max),
            None => calculate_backoff(retry, self.wait_min, self.wait_max),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::with_defaults())
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

/// Transport failures worth another attempt. Invalid requests and redirect
/// loops fail the same way every time.
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    !(error.is_builder() || error.is_redirect() || error.is_body() || error.is_decode())
}

/// `Retry-After` in delay-seconds form, for 429 and 503 only.
pub fn retry_after(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
        return None;
    }
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));

        assert!(!is_retryable_status(StatusCode::NOT_IMPLEMENTED));
        assert!(!is_retryable_status(StatusCode::OK));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_retry_after_only_for_429_and_503() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));

        assert_eq!(
            retry_after(StatusCode::SERVICE_UNAVAILABLE, &headers),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            retry_after(StatusCode::TOO_MANY_REQUESTS, &headers),
            Some(Duration::from_secs(2))
        );
        assert_eq!(retry_after(StatusCode::BAD_GATEWAY, &headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(StatusCode::SERVICE_UNAVAILABLE, &headers), None);
    }

    #[test]
    fn test_policy_limits() {
        let policy = RetryPolicy {
            max_retries: 2,
            wait_min: Duration::from_millis(10),
            wait_max: Duration::from_millis(50),
        };
        assert!(policy.allows(1));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));

        assert_eq!(
            policy.backoff(1, Some(Duration::from_secs(10))),
            Duration::from_millis(50)
        );
        assert!(policy.backoff(1, None) >= Duration::from_millis(10));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from_config(&ClientConfig {
            retry_max: Some(1),
            retry_wait_min_ms: Some(20),
            ..ClientConfig::default()
        });
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.wait_min, Duration::from_millis(20));
        assert_eq!(policy.wait_max, Duration::from_millis(30_000));
    }
}
