//! # deepomatic-core
//!
//! Core library for the Deepomatic API client providing:
//! - A policy-based, synchronous retry execution engine
//! - The asynchronous task data model (`pending`, `success`, `error`)
//! - Task completion tracking for a single task or an ordered batch of tasks
//!
//! The HTTP transport lives in `deepomatic-api`; this crate only consumes it
//! through the [`task::TaskFetcher`] collaborator trait.

pub mod error;
pub mod retry;
pub mod task;
pub mod types;

pub use error::{Error, Result};
pub use task::{batch_wait, wait, TaskError, TaskFetcher, WaitOptions};
pub use types::{BatchOutcome, Deadline, RetryPolicy, Task, TaskId, TaskSnapshot, TaskStatus, WaitPolicy};
