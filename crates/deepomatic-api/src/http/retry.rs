//! Transport-level retry policy

use std::time::Duration;

use deepomatic_core::retry::RetryIfStatus;
use deepomatic_core::types::{Deadline, RetryPolicy, WaitPolicy};
use serde::{Deserialize, Serialize};

/// Status codes retried by default
pub const RETRY_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

const RETRY_TIMEOUT: Duration = Duration::from_secs(60);
const RETRY_EXP_MULTIPLIER: Duration = Duration::from_millis(500);
const RETRY_EXP_MAX: Duration = Duration::from_secs(10);

/// Retry applied to every HTTP request
///
/// A response whose status is in `status_codes` is retried, and so is any
/// transport error classified as transient. The default waits 50ms, 100ms,
/// then 100ms plus a randomized exponential delay, for up to 60 seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpRetry {
    pub policy: RetryPolicy,
    pub status_codes: Vec<u16>,
}

impl HttpRetry {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            status_codes: RETRY_STATUS_CODES.to_vec(),
        }
    }

    pub fn with_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.status_codes = codes;
        self
    }

    /// Keep the default schedule, change the deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.policy.deadline = Deadline::after(timeout);
        self
    }

    pub(crate) fn status_predicate(&self) -> RetryIfStatus {
        RetryIfStatus::with_codes(self.status_codes.clone())
    }

    fn default_wait() -> WaitPolicy {
        WaitPolicy::chain(vec![
            WaitPolicy::fixed(Duration::from_millis(50)),
            WaitPolicy::fixed(Duration::from_millis(100)),
            WaitPolicy::sum(vec![
                WaitPolicy::fixed(Duration::from_millis(100)),
                WaitPolicy::random_exponential(RETRY_EXP_MULTIPLIER, RETRY_EXP_MAX),
            ]),
        ])
    }
}

impl Default for HttpRetry {
    fn default() -> Self {
        Self::new(RetryPolicy::new(
            Self::default_wait(),
            Deadline::after(RETRY_TIMEOUT),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_http_retry() {
        let retry = HttpRetry::default();
        assert_eq!(retry.status_codes, vec![500, 502, 503, 504]);
        assert_eq!(retry.policy.deadline.limit(), Some(Duration::from_secs(60)));
        assert_eq!(retry.policy.wait.delay(1), Duration::from_millis(50));
        assert_eq!(retry.policy.wait.delay(2), Duration::from_millis(100));
        assert_eq!(retry.policy.wait.max_delay(), Duration::from_millis(10_100));
    }

    #[test]
    fn test_status_predicate() {
        let retry = HttpRetry::default().with_status_codes(vec![429]);
        let predicate = retry.status_predicate();
        assert!(predicate.is_retryable_code(429));
        assert!(!predicate.is_retryable_code(503));
    }

    #[test]
    fn test_with_timeout() {
        let retry = HttpRetry::default().with_timeout(Duration::from_secs(5));
        assert_eq!(retry.policy.deadline.limit(), Some(Duration::from_secs(5)));
        assert_eq!(retry.policy.wait, HttpRetry::default().policy.wait);
    }
}
