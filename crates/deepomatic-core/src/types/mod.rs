//! Type definitions shared by the retry engine and the task tracker

mod retry_policy;
mod task;

pub use retry_policy::{Deadline, RetryPolicy, WaitPolicy};
pub use task::{BatchOutcome, BatchPositions, Task, TaskId, TaskSnapshot, TaskStatus};
