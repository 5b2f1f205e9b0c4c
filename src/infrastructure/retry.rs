//! Bounded retry with exponential backoff
//!
//! Only transport-class failures are retried. After `max_attempts` the last
//! transport error is returned to the caller.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::domain::events::{PipelineEvent, RunObserver};
use crate::infrastructure::config::RetryConfig;
use crate::infrastructure::http_client::{FetchError, PageFetcher};

/// Backoff schedule for one request
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            multiplier: multiplier.max(1.0),
        }
    }

    /// One attempt, no waiting
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO, 1.0)
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.base_delay(),
            config.max_delay(),
            config.backoff_multiplier,
        )
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt following `failed_attempt` (1-based):
    /// `base * multiplier^(failed_attempt - 1)`, capped at `max_delay`.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = i32::try_from(failed_attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        #[allow(clippy::cast_precision_loss)]
        let millis = self.base_delay.as_millis() as f64 * factor;
        let max_millis = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        if !millis.is_finite() {
            return self.max_delay;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = millis.round() as u64;
        Duration::from_millis(millis.min(max_millis))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Fetch `url`, retrying transport failures with backoff.
///
/// Status errors and invalid URLs return immediately.
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    url: &str,
    policy: &RetryPolicy,
    observer: &dyn RunObserver,
) -> Result<String, FetchError> {
    let mut attempt = 1;
    loop {
        match fetcher.fetch(url).await {
            Ok(body) => {
                if attempt > 1 {
                    debug!("Fetched {} on attempt {}", url, attempt);
                }
                return Ok(body);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_attempts() => {
                let delay = policy.backoff(attempt);
                observer.on_event(&PipelineEvent::RequestRetry {
                    url: url.to_string(),
                    attempt,
                    delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    reason: e.to_string(),
                });
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::CollectingObserver;
    use crate::infrastructure::http_client::TransportKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyFetcher {
        failures_before_success: u32,
        calls: AtomicU32,
        error: FetchError,
    }

    #[async_trait]
    impl PageFetcher for FlakyFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                Err(self.error.clone())
            } else {
                Ok("<html></html>".to_string())
            }
        }
    }

    fn timeout() -> FetchError {
        FetchError::transport(TransportKind::Timeout, "https://example.com", "timed out")
    }

    fn instant_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO, Duration::ZERO, 2.0)
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(500), 2.0);
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(500));
        assert_eq!(policy.backoff(40), Duration::from_millis(500));
    }

    #[test]
    fn test_zero_attempts_is_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO, 2.0);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_recovers_from_transient_timeout() {
        let fetcher = FlakyFetcher {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
            error: timeout(),
        };
        let observer = CollectingObserver::new();

        let body = fetch_with_retry(&fetcher, "https://example.com", &instant_policy(3), &observer)
            .await
            .unwrap();

        assert_eq!(body, "<html></html>");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert_eq!(observer.count("request-retry"), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_cap() {
        let fetcher = FlakyFetcher {
            failures_before_success: u32::MAX,
            calls: AtomicU32::new(0),
            error: timeout(),
        };
        let observer = CollectingObserver::new();

        let err = fetch_with_retry(&fetcher, "https://example.com", &instant_policy(4), &observer)
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
        assert_eq!(observer.count("request-retry"), 3);
    }

    #[tokio::test]
    async fn test_status_error_is_not_retried() {
        let fetcher = FlakyFetcher {
            failures_before_success: 1,
            calls: AtomicU32::new(0),
            error: FetchError::HttpStatus {
                status: 404,
                url: "https://example.com".into(),
            },
        };
        let observer = CollectingObserver::new();

        let err = fetch_with_retry(&fetcher, "https://example.com", &instant_policy(5), &observer)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::HttpStatus { status: 404, .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(observer.events().is_empty());
    }
}
