//! Synchronous retry execution engine with policy-based configuration
//!
//! An operation is invoked repeatedly until its outcome no longer satisfies
//! the retry predicate or the policy's deadline elapses.
//!
//! # Features
//!
//! - Predicates over both returned values and errors, composable with `or`
//! - Declarative wait schedules (fixed, randomized exponential, chain, sum)
//! - Explicit deadlines; unbounded retrying is an opt-in (`Deadline::Never`)
//! - Observable attempts via the `RetryObserver` trait
//! - Built-in `TracingObserver` for logging
//!
//! # Example
//!
//! ```rust
//! use deepomatic_core::retry::{RetryExecutorBuilder, RetryIfError};
//! use deepomatic_core::types::{Deadline, RetryPolicy, WaitPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(
//!     WaitPolicy::fixed(Duration::from_millis(1)),
//!     Deadline::after(Duration::from_secs(1)),
//! );
//! let mut calls = 0;
//! let result = RetryExecutorBuilder::new(policy)
//!     .with_predicate(RetryIfError::new(|_: &std::io::Error| true))
//!     .build()
//!     .execute(|| {
//!         calls += 1;
//!         if calls < 3 {
//!             Err(std::io::Error::other("flaky"))
//!         } else {
//!             Ok(calls)
//!         }
//!     });
//! assert_eq!(result.unwrap(), 3);
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::{Attempt, RetryError};
pub use executor::{retry_with_policy, RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{
    AnyOf, NeverRetry, RetryAnyError, RetryIfError, RetryIfResult, RetryIfStatus,
    RetryIfTransient, RetryPredicate, RetryPredicateExt, StatusCode, TransientError,
};
