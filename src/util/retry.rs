//! Retry policy for prompt exchanges.
//!
//! Attempt numbers start at zero. The connector sends attempt 0 as a single
//! request and every later attempt as a streamed request.

use std::time::Duration;

use crate::error::ConnectorError;

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            delay: Duration::from_secs(crate::config::DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Total number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Whether `error`, raised by attempt number `attempt`, warrants another
    /// attempt.
    pub fn should_retry(&self, error: &ConnectorError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_retries
    }

    /// Sleep before the next attempt.
    pub async fn pause(&self, agent: &str, attempt: u32, error: &ConnectorError) {
        tracing::warn!(
            agent,
            attempt = attempt + 1,
            max_attempts = self.max_attempts(),
            delay_ms = self.delay.as_millis() as u64,
            error = %error,
            "retrying after transient error"
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retried_within_budget() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let transient = ConnectorError::transient("server");
        let permanent = ConnectorError::permanent("auth");

        assert!(policy.should_retry(&transient, 0));
        assert!(policy.should_retry(&transient, 1));
        assert!(!policy.should_retry(&transient, 2));
        assert!(!policy.should_retry(&permanent, 0));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_waits_for_configured_delay() {
        let policy = RetryPolicy::new(1, Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        policy
            .pause("ada", 0, &ConnectorError::transient("server"))
            .await;
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
