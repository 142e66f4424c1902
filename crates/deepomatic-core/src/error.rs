//! Error types for deepomatic-core

use thiserror::Error;

/// Result type alias using deepomatic-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
#[derive(Error, Debug)]
pub enum Error {
    /// The server reported a task status outside of `pending`, `success`, `error`
    #[error("Unknown task status: {status}")]
    UnknownTaskStatus { status: String },

    /// A task payload could not be decoded
    #[error("Invalid task payload: {0}")]
    InvalidTask(#[from] serde_json::Error),
}

impl Error {
    /// Create an unknown task status error
    pub fn unknown_task_status(status: impl Into<String>) -> Self {
        Self::UnknownTaskStatus {
            status: status.into(),
        }
    }
}
