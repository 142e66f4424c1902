//! Declarative retry policy configuration
//!
//! A [`RetryPolicy`] is an immutable value: callers build one per call site
//! (or clone a configured one) and hand it to the executor. Nothing in the
//! engine mutates a policy after construction.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Wait schedule between attempts
    pub wait: WaitPolicy,

    /// When to stop retrying
    pub deadline: Deadline,
}

impl RetryPolicy {
    /// Create a policy from a wait schedule and a deadline
    pub fn new(wait: WaitPolicy, deadline: Deadline) -> Self {
        Self { wait, deadline }
    }
}

impl Default for RetryPolicy {
    /// Task-polling schedule with a 60 second deadline
    fn default() -> Self {
        let timeout = Duration::from_secs(60);
        Self {
            wait: WaitPolicy::task_polling(
                Some(timeout),
                Duration::from_millis(50),
                Duration::from_secs(1),
            ),
            deadline: Deadline::after(timeout),
        }
    }
}

/// Maximum elapsed time after which no further attempt is started
///
/// There is no implicit unbounded deadline: [`Deadline::Never`] has to be
/// chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum Deadline {
    /// Stop once this many milliseconds have elapsed since the first attempt
    After { timeout_ms: u64 },

    /// Retry until the predicate is satisfied, however long it takes
    Never,
}

impl Deadline {
    /// Deadline after the given duration
    pub fn after(timeout: Duration) -> Self {
        Deadline::After {
            timeout_ms: millis(timeout),
        }
    }

    /// The time limit, or `None` for [`Deadline::Never`]
    pub fn limit(&self) -> Option<Duration> {
        match self {
            Deadline::After { timeout_ms } => Some(Duration::from_millis(*timeout_ms)),
            Deadline::Never => None,
        }
    }
}

/// Wait schedule: maps an attempt number (1-indexed) to the delay before the
/// next attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum WaitPolicy {
    /// Constant delay
    Fixed { delay_ms: u64 },

    /// Uniformly random delay in `[0, min(max, multiplier * 2^(attempt - 1))]`
    RandomExponential { multiplier_ms: u64, max_ms: u64 },

    /// Attempt `n` uses step `min(n, len) - 1`; the last step repeats
    Chain { steps: Vec<WaitPolicy> },

    /// Sum of every part's delay
    Sum { parts: Vec<WaitPolicy> },
}

impl WaitPolicy {
    /// Constant delay
    pub fn fixed(delay: Duration) -> Self {
        WaitPolicy::Fixed {
            delay_ms: millis(delay),
        }
    }

    /// Randomized exponential delay capped at `max`
    pub fn random_exponential(multiplier: Duration, max: Duration) -> Self {
        WaitPolicy::RandomExponential {
            multiplier_ms: millis(multiplier),
            max_ms: millis(max),
        }
    }

    /// Chain of schedules, one per attempt, the last one repeating
    pub fn chain(steps: Vec<WaitPolicy>) -> Self {
        WaitPolicy::Chain { steps }
    }

    /// Sum of schedules
    pub fn sum(parts: Vec<WaitPolicy>) -> Self {
        WaitPolicy::Sum { parts }
    }

    /// Schedule used while polling tasks: 50ms, then 100ms plus a randomized
    /// exponential delay whose cap never exceeds the timeout
    pub fn task_polling(timeout: Option<Duration>, multiplier: Duration, max: Duration) -> Self {
        let cap = match timeout {
            Some(timeout) => timeout.min(max),
            None => max,
        };
        WaitPolicy::chain(vec![
            WaitPolicy::fixed(Duration::from_millis(50)),
            WaitPolicy::sum(vec![
                WaitPolicy::fixed(Duration::from_millis(100)),
                WaitPolicy::random_exponential(multiplier, cap),
            ]),
        ])
    }

    /// Delay before the attempt following `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.delay_ms(attempt.max(1)))
    }

    /// Upper bound of [`WaitPolicy::delay`] for any attempt
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms())
    }

    fn delay_ms(&self, attempt: u32) -> u64 {
        match self {
            WaitPolicy::Fixed { delay_ms } => *delay_ms,
            WaitPolicy::RandomExponential {
                multiplier_ms,
                max_ms,
            } => {
                let exp = 2f64.powi(attempt.saturating_sub(1).min(63) as i32);
                let high = (*multiplier_ms as f64 * exp).min(*max_ms as f64);
                if high <= 0.0 {
                    0
                } else {
                    rand::rng().random_range(0.0..=high) as u64
                }
            }
            WaitPolicy::Chain { steps } => {
                if steps.is_empty() {
                    return 0;
                }
                let index = (attempt as usize).min(steps.len()) - 1;
                steps[index].delay_ms(attempt)
            }
            WaitPolicy::Sum { parts } => parts
                .iter()
                .map(|part| part.delay_ms(attempt))
                .fold(0u64, u64::saturating_add),
        }
    }

    fn max_delay_ms(&self) -> u64 {
        match self {
            WaitPolicy::Fixed { delay_ms } => *delay_ms,
            WaitPolicy::RandomExponential { max_ms, .. } => *max_ms,
            WaitPolicy::Chain { steps } => {
                steps.iter().map(WaitPolicy::max_delay_ms).max().unwrap_or(0)
            }
            WaitPolicy::Sum { parts } => parts
                .iter()
                .map(WaitPolicy::max_delay_ms)
                .fold(0u64, u64::saturating_add),
        }
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
