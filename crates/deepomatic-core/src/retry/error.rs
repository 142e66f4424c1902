//! Error types for the retry execution engine

use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Outcome of one invocation of the retried operation
#[derive(Debug, Clone)]
pub struct Attempt<T, E> {
    /// Attempt number (1-indexed)
    pub number: u32,
    /// Wall-clock time at which the attempt started
    pub started_at: DateTime<Utc>,
    /// Time spent inside the operation
    pub elapsed: Duration,
    /// Returned value or raised error
    pub outcome: Result<T, E>,
}

impl<T, E> Attempt<T, E> {
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// Error of this attempt, if it failed
    pub fn error(&self) -> Option<&E> {
        self.outcome.as_ref().err()
    }

    /// Value of this attempt, if it returned one
    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }
}

/// Terminal failure of a retried operation
///
/// Generic over `T`, the operation's value type, and `E`, its error type. A
/// timeout keeps the last attempt so callers can inspect what the operation
/// was still returning (a retryable value or a retryable error).
#[derive(Debug)]
pub enum RetryError<T, E> {
    /// The operation failed with an error the predicate does not retry
    NonRetryable(E),

    /// The deadline elapsed while the predicate still asked for a retry
    Timeout {
        /// Number of attempts made
        attempts: u32,
        /// Time elapsed since the first attempt started
        elapsed: Duration,
        /// The final attempt
        last: Box<Attempt<T, E>>,
    },
}

impl<T, E: fmt::Display> fmt::Display for RetryError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::NonRetryable(source) => write!(f, "non-retryable error: {}", source),
            RetryError::Timeout {
                attempts,
                elapsed,
                last,
            } => {
                write!(
                    f,
                    "retry timed out after {} attempts over {:.2}s",
                    attempts,
                    elapsed.as_secs_f64()
                )?;
                match &last.outcome {
                    Err(err) => write!(f, ": {}", err),
                    Ok(_) => write!(f, ": last attempt returned a retryable result"),
                }
            }
        }
    }
}

impl<T: fmt::Debug, E: Error + 'static> Error for RetryError<T, E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::NonRetryable(source) => Some(source),
            RetryError::Timeout { last, .. } => match &last.outcome {
                Err(err) => Some(err),
                Ok(_) => None,
            },
        }
    }
}

impl<T, E> RetryError<T, E> {
    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::NonRetryable(_) => 1,
            RetryError::Timeout { attempts, .. } => *attempts,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RetryError::Timeout { .. })
    }

    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable(_))
    }

    /// The final attempt of a timeout
    pub fn last_attempt(&self) -> Option<&Attempt<T, E>> {
        match self {
            RetryError::Timeout { last, .. } => Some(last),
            RetryError::NonRetryable(_) => None,
        }
    }

    /// The operation error, if the terminal outcome was an error
    pub fn into_error(self) -> Option<E> {
        match self {
            RetryError::NonRetryable(source) => Some(source),
            RetryError::Timeout { last, .. } => last.outcome.err(),
        }
    }

    /// Map the error type using a closure
    pub fn map_err<F, E2>(self, f: F) -> RetryError<T, E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::NonRetryable(source) => RetryError::NonRetryable(f(source)),
            RetryError::Timeout {
                attempts,
                elapsed,
                last,
            } => {
                let Attempt {
                    number,
                    started_at,
                    elapsed: attempt_elapsed,
                    outcome,
                } = *last;
                RetryError::Timeout {
                    attempts,
                    elapsed,
                    last: Box::new(Attempt {
                        number,
                        started_at,
                        elapsed: attempt_elapsed,
                        outcome: outcome.map_err(f),
                    }),
                }
            }
        }
    }
}
