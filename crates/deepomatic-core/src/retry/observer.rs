//! Retry observation and logging
//!
//! The `RetryObserver` trait receives a callback for every attempt the
//! executor makes. `TracingObserver` logs them with the `tracing` crate.

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Observer trait for retry attempt events
///
/// # Example
///
/// ```rust
/// use deepomatic_core::retry::RetryObserver;
/// use std::fmt::Display;
/// use std::time::Duration;
///
/// struct MetricsObserver {
///     // Your metrics client here
/// }
///
/// impl RetryObserver for MetricsObserver {
///     fn on_attempt_start(&self, attempt: u32) {
///         // Record attempt start metric
///     }
///
///     fn on_retry(&self, attempt: u32, error: Option<&dyn Display>, delay: Duration) {
///         // Record retry metric
///     }
///
///     fn on_success(&self, attempt: u32, total_duration: Duration) {
///         // Record latency
///     }
///
///     fn on_timeout(&self, attempts: u32, elapsed: Duration) {
///         // Record timeout metric
///     }
/// }
/// ```
pub trait RetryObserver {
    /// Called when an attempt is about to start
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    fn on_attempt_start(&self, attempt: u32);

    /// Called when an attempt's outcome will be retried
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    /// * `error` - The error of the attempt, `None` when a value was retried
    /// * `delay` - The delay before the next attempt
    fn on_retry(&self, attempt: u32, error: Option<&dyn Display>, delay: Duration);

    /// Called when the predicate accepts an attempt's value
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// Called when the deadline elapses while retries are still requested
    fn on_timeout(&self, attempts: u32, elapsed: Duration);

    /// Called when an attempt fails with an error the predicate does not retry
    fn on_aborted(&self, attempt: u32, error: &dyn Display) {
        let _ = (attempt, error);
    }
}

impl<O: RetryObserver + ?Sized> RetryObserver for &O {
    fn on_attempt_start(&self, attempt: u32) {
        (**self).on_attempt_start(attempt)
    }

    fn on_retry(&self, attempt: u32, error: Option<&dyn Display>, delay: Duration) {
        (**self).on_retry(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        (**self).on_timeout(attempts, elapsed)
    }

    fn on_aborted(&self, attempt: u32, error: &dyn Display) {
        (**self).on_aborted(attempt, error)
    }
}

impl<O: RetryObserver + ?Sized> RetryObserver for std::sync::Arc<O> {
    fn on_attempt_start(&self, attempt: u32) {
        (**self).on_attempt_start(attempt)
    }

    fn on_retry(&self, attempt: u32, error: Option<&dyn Display>, delay: Duration) {
        (**self).on_retry(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        (**self).on_timeout(attempts, elapsed)
    }

    fn on_aborted(&self, attempt: u32, error: &dyn Display) {
        (**self).on_aborted(attempt, error)
    }
}

impl<O: RetryObserver + ?Sized> RetryObserver for Box<O> {
    fn on_attempt_start(&self, attempt: u32) {
        (**self).on_attempt_start(attempt)
    }

    fn on_retry(&self, attempt: u32, error: Option<&dyn Display>, delay: Duration) {
        (**self).on_retry(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        (**self).on_timeout(attempts, elapsed)
    }

    fn on_aborted(&self, attempt: u32, error: &dyn Display) {
        (**self).on_aborted(attempt, error)
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32) {}

    fn on_retry(&self, _attempt: u32, _error: Option<&dyn Display>, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_timeout(&self, _attempts: u32, _elapsed: Duration) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: TRACE
/// - `on_retry`: WARN for errors, DEBUG for retried values (e.g. a pending task)
/// - `on_success`: DEBUG
/// - `on_timeout`: INFO
/// - `on_aborted`: WARN
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being retried (for log context)
    operation: String,
}

impl TracingObserver {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32) {
        tracing::trace!(
            operation = %self.operation,
            attempt = attempt,
            "starting attempt"
        );
    }

    fn on_retry(&self, attempt: u32, error: Option<&dyn Display>, delay: Duration) {
        match error {
            Some(err) => tracing::warn!(
                operation = %self.operation,
                attempt = attempt,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "attempt failed, will retry"
            ),
            None => tracing::debug!(
                operation = %self.operation,
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                "not ready yet, will retry"
            ),
        }
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            total_duration_ms = total_duration.as_millis() as u64,
            "completed"
        );
    }

    fn on_timeout(&self, attempts: u32, elapsed: Duration) {
        tracing::info!(
            operation = %self.operation,
            attempts = attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            "deadline elapsed, giving up"
        );
    }

    fn on_aborted(&self, attempt: u32, error: &dyn Display) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "non-retryable error"
        );
    }
}

/// An observer that counts retry events
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    pub attempt_starts: AtomicU32,
    /// Retried errors
    pub failures: AtomicU32,
    /// Retried values
    pub retried_values: AtomicU32,
    pub successes: AtomicU32,
    pub timeouts: AtomicU32,
    pub aborts: AtomicU32,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn retried_values(&self) -> u32 {
        self.retried_values.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn timeouts(&self) -> u32 {
        self.timeouts.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> u32 {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_retry(&self, _attempt: u32, error: Option<&dyn Display>, _delay: Duration) {
        if error.is_some() {
            self.failures.fetch_add(1, Ordering::SeqCst);
        } else {
            self.retried_values.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_timeout(&self, _attempts: u32, _elapsed: Duration) {
        self.timeouts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_aborted(&self, _attempt: u32, _error: &dyn Display) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_noop_observer() {
        let observer = NoOpObserver;
        observer.on_attempt_start(1);
        observer.on_retry(1, Some(&"boom"), Duration::from_millis(100));
        observer.on_success(2, Duration::from_millis(200));
        observer.on_timeout(3, Duration::from_secs(1));
        observer.on_aborted(1, &"boom");
    }

    #[test]
    fn test_tracing_observer_creation() {
        let observer = TracingObserver::new("refresh task 42");
        assert_eq!(observer.operation(), "refresh task 42");
        assert_eq!(TracingObserver::default().operation(), "retry");
    }

    #[test]
    fn test_stats_observer_counts() {
        let observer = StatsObserver::new();

        observer.on_attempt_start(1);
        observer.on_retry(1, Some(&"connection reset"), Duration::from_millis(50));
        observer.on_attempt_start(2);
        observer.on_retry(2, None, Duration::from_millis(100));
        observer.on_attempt_start(3);
        observer.on_success(3, Duration::from_millis(300));

        assert_eq!(observer.attempt_starts(), 3);
        assert_eq!(observer.failures(), 1);
        assert_eq!(observer.retried_values(), 1);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.timeouts(), 0);
        assert_eq!(observer.aborts(), 0);
    }

    #[test]
    fn test_shared_observer() {
        let observer = Arc::new(StatsObserver::new());
        let shared = observer.clone();

        shared.on_timeout(4, Duration::from_secs(2));
        (&*observer).on_aborted(1, &"bad request");

        assert_eq!(observer.timeouts(), 1);
        assert_eq!(observer.aborts(), 1);
    }
}
