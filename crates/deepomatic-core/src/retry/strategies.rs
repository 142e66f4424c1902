//! Retry predicates
//!
//! A predicate looks at the outcome of one attempt, value or error, and
//! decides whether another attempt should be made. Predicates compose with
//! [`RetryPredicateExt::or`], e.g. "retry while the task is pending, or when the
//! refresh failed with a transient transport error".

use std::marker::PhantomData;

/// A predicate that determines whether an attempt's outcome should be retried
///
/// # Example
///
/// ```rust
/// use deepomatic_core::retry::RetryPredicate;
/// use std::io::{Error, ErrorKind};
///
/// struct IoRetryPredicate;
///
/// impl<T> RetryPredicate<T, Error> for IoRetryPredicate {
///     fn should_retry(&self, outcome: &Result<T, Error>) -> bool {
///         // Don't retry permanent errors
///         match outcome {
///             Ok(_) => false,
///             Err(err) => !matches!(
///                 err.kind(),
///                 ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::InvalidInput
///             ),
///         }
///     }
/// }
/// ```
pub trait RetryPredicate<T, E> {
    /// Determine whether the given outcome should be retried
    fn should_retry(&self, outcome: &Result<T, E>) -> bool;
}

/// Combinators available on every predicate
///
/// Kept apart from [`RetryPredicate`] so that combining two predicates does
/// not pin down the value and error types before they are used.
pub trait RetryPredicateExt: Sized {
    /// Retry when either predicate asks for it
    fn or<Q>(self, other: Q) -> AnyOf<Self, Q> {
        AnyOf::new(self, other)
    }
}

impl<P> RetryPredicateExt for P {}

impl<T, E, P: RetryPredicate<T, E> + ?Sized> RetryPredicate<T, E> for &P {
    fn should_retry(&self, outcome: &Result<T, E>) -> bool {
        (**self).should_retry(outcome)
    }
}

/// Classifies errors as transient (worth retrying) or terminal
///
/// Implemented by transport error types; the retry engine never hard-codes
/// which failures are transient.
pub trait TransientError {
    fn is_transient(&self) -> bool;
}

/// A value carrying an HTTP status code
pub trait StatusCode {
    fn status_code(&self) -> u16;
}

/// Retries every error, accepts every value
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryAnyError;

impl<T, E> RetryPredicate<T, E> for RetryAnyError {
    fn should_retry(&self, outcome: &Result<T, E>) -> bool {
        outcome.is_err()
    }
}

/// Never retries
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl<T, E> RetryPredicate<T, E> for NeverRetry {
    fn should_retry(&self, _outcome: &Result<T, E>) -> bool {
        false
    }
}

/// Retries while the returned value satisfies a condition
pub struct RetryIfResult<F, T> {
    predicate: F,
    _value: PhantomData<fn(&T)>,
}

impl<F, T> RetryIfResult<F, T>
where
    F: Fn(&T) -> bool,
{
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _value: PhantomData,
        }
    }
}

impl<F, T, E> RetryPredicate<T, E> for RetryIfResult<F, T>
where
    F: Fn(&T) -> bool,
{
    fn should_retry(&self, outcome: &Result<T, E>) -> bool {
        match outcome {
            Ok(value) => (self.predicate)(value),
            Err(_) => false,
        }
    }
}

/// Retries errors that satisfy a condition
pub struct RetryIfError<F, E> {
    predicate: F,
    _error: PhantomData<fn(&E)>,
}

impl<F, E> RetryIfError<F, E>
where
    F: Fn(&E) -> bool,
{
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            _error: PhantomData,
        }
    }
}

impl<F, T, E> RetryPredicate<T, E> for RetryIfError<F, E>
where
    F: Fn(&E) -> bool,
{
    fn should_retry(&self, outcome: &Result<T, E>) -> bool {
        match outcome {
            Ok(_) => false,
            Err(err) => (self.predicate)(err),
        }
    }
}

/// Retries errors their own classifier reports as transient
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryIfTransient;

impl<T, E: TransientError> RetryPredicate<T, E> for RetryIfTransient {
    fn should_retry(&self, outcome: &Result<T, E>) -> bool {
        match outcome {
            Ok(_) => false,
            Err(err) => err.is_transient(),
        }
    }
}

/// Retries values whose status code is in a given set
#[derive(Debug, Clone)]
pub struct RetryIfStatus {
    /// Status codes that should be retried
    retryable_codes: Vec<u16>,
}

impl RetryIfStatus {
    /// Default retryable codes: 500, 502, 503, 504
    pub fn default_http() -> Self {
        Self {
            retryable_codes: vec![500, 502, 503, 504],
        }
    }

    /// Create a predicate with custom retryable status codes
    pub fn with_codes(codes: Vec<u16>) -> Self {
        Self {
            retryable_codes: codes,
        }
    }

    pub fn is_retryable_code(&self, code: u16) -> bool {
        self.retryable_codes.contains(&code)
    }

    pub fn codes(&self) -> &[u16] {
        &self.retryable_codes
    }
}

impl<T: StatusCode, E> RetryPredicate<T, E> for RetryIfStatus {
    fn should_retry(&self, outcome: &Result<T, E>) -> bool {
        match outcome {
            Ok(value) => self.is_retryable_code(value.status_code()),
            Err(_) => false,
        }
    }
}

/// Disjunction of two predicates
#[derive(Debug, Clone, Copy)]
pub struct AnyOf<A, B> {
    first: A,
    second: B,
}

impl<A, B> AnyOf<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<T, E, A, B> RetryPredicate<T, E> for AnyOf<A, B>
where
    A: RetryPredicate<T, E>,
    B: RetryPredicate<T, E>,
{
    fn should_retry(&self, outcome: &Result<T, E>) -> bool {
        self.first.should_retry(outcome) || self.second.should_retry(outcome)
    }
}
