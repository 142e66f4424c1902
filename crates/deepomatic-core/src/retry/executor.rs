//! Retry execution engine
//!
//! Runs an operation until the predicate accepts its outcome or the policy's
//! deadline elapses. Execution is synchronous: the calling thread sleeps
//! between attempts.

use std::fmt::Display;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::types::RetryPolicy;

use super::error::{Attempt, RetryError};
use super::observer::{NoOpObserver, RetryObserver};
use super::strategies::{RetryAnyError, RetryPredicate};

/// Execute an operation with the default predicate (retry every error)
///
/// For more control, use `RetryExecutorBuilder`.
///
/// # Example
///
/// ```rust
/// use deepomatic_core::retry::retry_with_policy;
/// use deepomatic_core::types::RetryPolicy;
///
/// let result = retry_with_policy(&RetryPolicy::default(), || {
///     Ok::<_, std::io::Error>("success")
/// });
/// assert_eq!(result.unwrap(), "success");
/// ```
pub fn retry_with_policy<F, T, E>(policy: &RetryPolicy, op: F) -> Result<T, RetryError<T, E>>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    RetryExecutorBuilder::new(policy.clone()).build().execute(op)
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use deepomatic_core::retry::{RetryExecutorBuilder, RetryIfTransient, TracingObserver};
/// use deepomatic_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new(RetryPolicy::default())
///     .with_predicate(RetryIfTransient)
///     .with_observer(TracingObserver::new("refresh task"))
///     .build();
/// ```
pub struct RetryExecutorBuilder<P = RetryAnyError, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
}

impl Default for RetryExecutorBuilder<RetryAnyError, NoOpObserver> {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryExecutorBuilder<RetryAnyError, NoOpObserver> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            predicate: RetryAnyError,
            observer: NoOpObserver,
        }
    }
}

impl<P, O> RetryExecutorBuilder<P, O> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the retry predicate
    ///
    /// The predicate decides, from an attempt's value or error, whether
    /// another attempt is made.
    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<P2, O> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate,
            observer: self.observer,
        }
    }

    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<P, O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer,
        }
    }

    pub fn build(self) -> RetryExecutor<P, O> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
        }
    }
}

/// A retry executor with a policy, a predicate and an observer
///
/// Use `RetryExecutorBuilder` to create an instance.
pub struct RetryExecutor<P, O> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
}

/// Classification of one attempt
enum Verdict<T, E> {
    /// Accepted value
    Done(T),
    /// Outcome the predicate wants retried
    Transient(Attempt<T, E>),
    /// Error the predicate does not retry
    Terminal(E),
}

impl<P, O> RetryExecutor<P, O>
where
    O: RetryObserver,
{
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    ///
    /// The first attempt starts immediately. After a retried outcome the
    /// executor sleeps for the policy's delay, clipped to the time left
    /// before the deadline, so an attempt always runs right at the deadline
    /// before giving up. An attempt in progress is never interrupted.
    ///
    /// # Returns
    ///
    /// The accepted value, `RetryError::NonRetryable` for an error the
    /// predicate rejects, or `RetryError::Timeout` with the last attempt.
    pub fn execute<F, T, E>(&self, mut op: F) -> Result<T, RetryError<T, E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
        P: RetryPredicate<T, E>,
    {
        let start = Instant::now();
        let limit = self.policy.deadline.limit();
        let mut number: u32 = 0;

        loop {
            number = number.saturating_add(1);
            self.observer.on_attempt_start(number);

            let started_at = Utc::now();
            let attempt_start = Instant::now();
            let outcome = op();
            let attempt = Attempt {
                number,
                started_at,
                elapsed: attempt_start.elapsed(),
                outcome,
            };

            let attempt = match self.classify(attempt) {
                Verdict::Done(value) => {
                    self.observer.on_success(number, start.elapsed());
                    return Ok(value);
                }
                Verdict::Terminal(err) => {
                    self.observer.on_aborted(number, &err);
                    return Err(RetryError::NonRetryable(err));
                }
                Verdict::Transient(attempt) => attempt,
            };

            let elapsed = start.elapsed();
            let delay = self.policy.wait.delay(number);
            let delay = match limit {
                Some(limit) if elapsed >= limit => {
                    self.observer.on_timeout(number, elapsed);
                    return Err(RetryError::Timeout {
                        attempts: number,
                        elapsed,
                        last: Box::new(attempt),
                    });
                }
                Some(limit) => delay.min(limit - elapsed),
                None => delay,
            };

            self.observer.on_retry(
                number,
                attempt.error().map(|err| err as &dyn Display),
                delay,
            );
            pause(delay);
        }
    }

    fn classify<T, E>(&self, attempt: Attempt<T, E>) -> Verdict<T, E>
    where
        P: RetryPredicate<T, E>,
    {
        if self.predicate.should_retry(&attempt.outcome) {
            return Verdict::Transient(attempt);
        }
        match attempt.outcome {
            Ok(value) => Verdict::Done(value),
            Err(err) => Verdict::Terminal(err),
        }
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
