//! Task tracking errors

use thiserror::Error;

use crate::retry::{RetryError, TransientError};
use crate::types::{Task, TaskId, TaskStatus};

/// Failure of one refresh attempt
#[derive(Debug, Error)]
pub enum PollError<E> {
    #[error("transport error: {0}")]
    Transport(#[source] E),

    #[error("protocol violation on task {id}: {detail}")]
    ProtocolViolation { id: TaskId, detail: String },
}

impl<E: TransientError> PollError<E> {
    /// Only transport errors the fetcher classifies as transient are retried
    pub fn is_transient(&self) -> bool {
        match self {
            PollError::Transport(err) => err.is_transient(),
            PollError::ProtocolViolation { .. } => false,
        }
    }
}

/// Errors returned by [`wait`](super::wait) and [`batch_wait`](super::batch_wait)
///
/// Generic over `E`, the fetcher's transport error.
#[derive(Debug, Error)]
pub enum TaskError<E> {
    /// The task reached the terminal `error` status
    #[error("task {} failed: {}", task_id(.task), failure_detail(.task))]
    Failed { task: Box<Task> },

    /// The deadline elapsed while the task was still pending or unreachable
    #[error("timed out waiting for task {}: {source}", task_id(.task))]
    Timeout {
        /// Last known snapshot of the task
        task: Box<Task>,
        source: RetryError<TaskStatus, PollError<E>>,
    },

    /// The server reported something the task protocol does not allow
    #[error("protocol violation on task {id}: {detail}")]
    ProtocolViolation { id: TaskId, detail: String },

    /// A refresh failed with a non-transient transport error
    #[error("transport error: {0}")]
    Transport(#[source] E),
}

impl<E> TaskError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskError::Failed { .. })
    }

    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, TaskError::ProtocolViolation { .. })
    }

    /// The task carried by a `Failed` or `Timeout` error
    pub fn task(&self) -> Option<&Task> {
        match self {
            TaskError::Failed { task } | TaskError::Timeout { task, .. } => Some(task),
            TaskError::ProtocolViolation { .. } | TaskError::Transport(_) => None,
        }
    }
}

impl<E> From<PollError<E>> for TaskError<E> {
    fn from(err: PollError<E>) -> Self {
        match err {
            PollError::Transport(source) => TaskError::Transport(source),
            PollError::ProtocolViolation { id, detail } => {
                TaskError::ProtocolViolation { id, detail }
            }
        }
    }
}

fn task_id(task: &Task) -> &TaskId {
    task.id()
}

fn failure_detail(task: &Task) -> String {
    match task.error_detail() {
        Some(serde_json::Value::String(message)) => message.clone(),
        Some(detail) => detail.to_string(),
        None => "no error detail".to_string(),
    }
}
