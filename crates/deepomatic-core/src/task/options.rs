//! Polling options for task waits

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Deadline, RetryPolicy, WaitPolicy};

const SINGLE_TIMEOUT: Duration = Duration::from_secs(60);
const BATCH_TIMEOUT: Duration = Duration::from_secs(300);
const EXP_MULTIPLIER: Duration = Duration::from_millis(50);
const EXP_MAX: Duration = Duration::from_secs(1);

/// Deadline and backoff used while polling tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WaitOptions {
    pub timeout: Deadline,
    pub wait: WaitPolicy,
}

impl WaitOptions {
    /// Default polling schedule under the given deadline
    pub fn new(timeout: Deadline) -> Self {
        Self {
            timeout,
            wait: WaitPolicy::task_polling(timeout.limit(), EXP_MULTIPLIER, EXP_MAX),
        }
    }

    /// Defaults for waiting on one task: 60 second deadline
    pub fn single() -> Self {
        Self::new(Deadline::after(SINGLE_TIMEOUT))
    }

    /// Defaults for waiting on a batch: 300 second deadline
    pub fn batch() -> Self {
        Self::new(Deadline::after(BATCH_TIMEOUT))
    }

    /// Poll until every task is terminal, however long it takes
    pub fn unbounded() -> Self {
        Self::new(Deadline::Never)
    }

    /// Replace the deadline, keeping the default schedule capped to it
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self::new(Deadline::after(timeout))
    }

    /// Tune the randomized exponential part of the default schedule
    pub fn with_backoff(mut self, multiplier: Duration, max: Duration) -> Self {
        self.wait = WaitPolicy::task_polling(self.timeout.limit(), multiplier, max);
        self
    }

    /// Use an arbitrary wait schedule
    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.wait.clone(), self.timeout)
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::single()
    }
}
