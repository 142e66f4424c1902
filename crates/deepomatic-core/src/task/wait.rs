//! Single task wait

use tracing::debug;

use crate::retry::{
    RetryError, RetryExecutorBuilder, RetryIfError, RetryIfResult, RetryPredicateExt,
    TracingObserver,
};
use crate::types::{Task, TaskStatus};

use super::error::{PollError, TaskError};
use super::fetch::TaskFetcher;
use super::options::WaitOptions;

/// Refresh `task` until it reaches a terminal status
///
/// Retries while the task is `pending` or the refresh failed with a
/// transient transport error. The task's snapshot is replaced after every
/// successful refresh; a failed refresh leaves the last known snapshot in
/// place.
///
/// # Errors
///
/// - [`TaskError::Failed`] when the task ends in `error`
/// - [`TaskError::Timeout`] when the deadline elapses first
/// - [`TaskError::ProtocolViolation`] for an unknown status, a foreign id or a
///   terminal task going back to `pending`
/// - [`TaskError::Transport`] for a non-transient fetch error
pub fn wait<F>(fetcher: &F, task: &mut Task, options: &WaitOptions) -> Result<(), TaskError<F::Error>>
where
    F: TaskFetcher + ?Sized,
{
    let id = task.id().clone();
    debug!(task = %id, "waiting for task");

    let predicate = RetryIfResult::new(|status: &TaskStatus| *status == TaskStatus::Pending)
        .or(RetryIfError::new(|err: &PollError<F::Error>| err.is_transient()));
    let executor = RetryExecutorBuilder::new(options.policy())
        .with_predicate(predicate)
        .with_observer(TracingObserver::new(format!("refresh task {}", id)))
        .build();

    match executor.execute(|| refresh(fetcher, task)) {
        Ok(TaskStatus::Error) => Err(TaskError::Failed {
            task: Box::new(task.clone()),
        }),
        Ok(status) => {
            debug!(task = %id, status = %status, "task completed");
            Ok(())
        }
        Err(RetryError::NonRetryable(err)) => Err(err.into()),
        Err(source) => Err(TaskError::Timeout {
            task: Box::new(task.clone()),
            source,
        }),
    }
}

fn refresh<F>(fetcher: &F, task: &mut Task) -> Result<TaskStatus, PollError<F::Error>>
where
    F: TaskFetcher + ?Sized,
{
    let snapshot = fetcher
        .refresh_task(task.id())
        .map_err(PollError::Transport)?;
    let status = task
        .check_refresh(&snapshot)
        .map_err(|detail| PollError::<F::Error>::ProtocolViolation {
            id: task.id().clone(),
            detail,
        })?;
    task.replace_snapshot(snapshot);
    Ok(status)
}
