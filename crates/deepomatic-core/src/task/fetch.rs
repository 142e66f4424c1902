//! Resource fetch collaborator

use std::error::Error as StdError;

use crate::retry::TransientError;
use crate::types::{TaskId, TaskSnapshot};

/// Fetches task snapshots from the server
///
/// Implementations perform one network round-trip per call and classify
/// their own failures through [`TransientError`]; the tracker retries only
/// the transient ones.
pub trait TaskFetcher {
    type Error: StdError + TransientError + 'static;

    /// Fetch the current snapshot of one task
    fn refresh_task(&self, id: &TaskId) -> Result<TaskSnapshot, Self::Error>;

    /// Fetch the current snapshots of several tasks in one request
    ///
    /// The returned order need not match `ids`. Ids the server does not
    /// report are treated as still pending.
    fn list_tasks(&self, ids: &[TaskId]) -> Result<Vec<TaskSnapshot>, Self::Error>;
}

impl<F: TaskFetcher + ?Sized> TaskFetcher for &F {
    type Error = F::Error;

    fn refresh_task(&self, id: &TaskId) -> Result<TaskSnapshot, Self::Error> {
        (**self).refresh_task(id)
    }

    fn list_tasks(&self, ids: &[TaskId]) -> Result<Vec<TaskSnapshot>, Self::Error> {
        (**self).list_tasks(ids)
    }
}
