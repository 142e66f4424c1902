//! Task completion tracking
//!
//! Brings server-side tasks from `pending` to a terminal state by polling
//! them through a [`TaskFetcher`] under the retry engine:
//!
//! - [`wait`] refreshes a single task and fails loudly: a task that ends in
//!   `error` yields [`TaskError::Failed`], an elapsed deadline yields
//!   [`TaskError::Timeout`].
//! - [`batch_wait`] refreshes every still-pending task of an ordered batch in
//!   one request per round and reports what it has when the deadline elapses.

mod batch;
mod error;
mod fetch;
mod options;
mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{batch_wait, BatchTracker};
pub use error::{PollError, TaskError};
pub use fetch::TaskFetcher;
pub use options::WaitOptions;
pub use wait::wait;
