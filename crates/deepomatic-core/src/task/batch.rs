//! Batch task wait

use std::collections::HashSet;

use tracing::{debug, info};

use crate::retry::{
    RetryError, RetryExecutorBuilder, RetryIfError, RetryIfResult, RetryPredicateExt,
    TracingObserver,
};
use crate::types::{BatchOutcome, BatchPositions, Task, TaskId, TaskStatus};

use super::error::{PollError, TaskError};
use super::fetch::TaskFetcher;
use super::options::WaitOptions;

/// Wait for an ordered batch of tasks
///
/// Every round fetches only the tasks still pending, in one request. When
/// the deadline elapses the buckets are returned as they stand: tasks that
/// did not resolve in time are reported in `pending`, no error is raised.
/// Each bucket holds `(original_position, task)` pairs sorted by position.
///
/// An empty batch returns immediately without calling the fetcher.
///
/// # Errors
///
/// - [`TaskError::ProtocolViolation`] for an unknown status, an id outside
///   the batch, the same id twice in one response, or a terminal task
///   changing status. A task resolved in an earlier round may be reported
///   again unchanged; that snapshot is ignored.
/// - [`TaskError::Transport`] for a non-transient fetch error
pub fn batch_wait<F>(
    fetcher: &F,
    tasks: Vec<Task>,
    options: &WaitOptions,
) -> Result<BatchOutcome, TaskError<F::Error>>
where
    F: TaskFetcher + ?Sized,
{
    let mut tracker = BatchTracker::new(tasks);
    if tracker.remaining() == 0 {
        return Ok(tracker.into_outcome());
    }
    debug!(tasks = tracker.len(), "waiting for task batch");

    let predicate = RetryIfResult::new(|remaining: &usize| *remaining > 0)
        .or(RetryIfError::new(|err: &PollError<F::Error>| err.is_transient()));
    let executor = RetryExecutorBuilder::new(options.policy())
        .with_predicate(predicate)
        .with_observer(TracingObserver::new("batch task refresh"))
        .build();

    match executor.execute(|| tracker.poll(fetcher)) {
        Ok(_) => {}
        Err(RetryError::NonRetryable(err)) => return Err(err.into()),
        Err(RetryError::Timeout {
            attempts, elapsed, ..
        }) => {
            info!(
                rounds = attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                still_pending = tracker.remaining(),
                "batch wait deadline elapsed, returning partial results"
            );
        }
    }

    Ok(tracker.into_outcome())
}

/// Bookkeeping for a batch wait
///
/// Holds the input tasks by position and the distinct ids still pending.
/// A round either applies the whole batch response or nothing.
#[derive(Debug, Clone)]
pub struct BatchTracker {
    positions: BatchPositions,
    tasks: Vec<Task>,
    pending: Vec<TaskId>,
}

impl BatchTracker {
    /// Every input task starts pending
    pub fn new(tasks: Vec<Task>) -> Self {
        let positions = BatchPositions::from_tasks(&tasks);
        let pending = positions.ids().to_vec();
        Self {
            positions,
            tasks,
            pending,
        }
    }

    /// Number of input tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Distinct ids still pending
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_ids(&self) -> &[TaskId] {
        &self.pending
    }

    /// Run one refresh round and return the number of ids still pending
    pub fn poll<F>(&mut self, fetcher: &F) -> Result<usize, PollError<F::Error>>
    where
        F: TaskFetcher + ?Sized,
    {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let snapshots = fetcher
            .list_tasks(&self.pending)
            .map_err(PollError::Transport)?;
        debug!(
            requested = self.pending.len(),
            returned = snapshots.len(),
            "batch refresh round"
        );

        let requested: HashSet<&TaskId> = self.pending.iter().collect();
        let mut seen = HashSet::new();
        let mut checked = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let first = self
                .positions
                .positions_of(&snapshot.id)
                .and_then(|positions| positions.first().copied())
                .ok_or_else(|| violation::<F::Error>(&snapshot.id, "task is not part of the batch"))?;
            if !seen.insert(snapshot.id.clone()) {
                return Err(violation(&snapshot.id, "batch refresh returned the task twice"));
            }
            let status = self.tasks[first]
                .check_refresh(&snapshot)
                .map_err(|detail| violation::<F::Error>(&snapshot.id, detail))?;
            // Tasks resolved in an earlier round keep their terminal snapshot
            if requested.contains(&snapshot.id) {
                checked.push((snapshot, status));
            }
        }

        let mut resolved = HashSet::new();
        for (snapshot, status) in checked {
            if let Some(positions) = self.positions.positions_of(&snapshot.id) {
                for &position in positions {
                    self.tasks[position].replace_snapshot(snapshot.clone());
                }
            }
            if status.is_terminal() {
                resolved.insert(snapshot.id);
            }
        }
        self.pending.retain(|id| !resolved.contains(id));

        Ok(self.pending.len())
    }

    /// Partition the tasks into buckets sorted by original position
    ///
    /// Tasks whose id is still pending land in `pending` whatever their last
    /// snapshot says.
    pub fn into_outcome(self) -> BatchOutcome {
        let still_pending: HashSet<TaskId> = self.pending.into_iter().collect();
        let mut outcome = BatchOutcome::default();
        for (position, task) in self.tasks.into_iter().enumerate() {
            let bucket = if still_pending.contains(task.id()) {
                &mut outcome.pending
            } else {
                match task.status() {
                    Some(TaskStatus::Success) => &mut outcome.success,
                    Some(TaskStatus::Error) => &mut outcome.error,
                    _ => &mut outcome.pending,
                }
            };
            bucket.push((position, task));
        }
        outcome
    }
}

fn violation<E>(id: &TaskId, detail: impl Into<String>) -> PollError<E> {
    PollError::ProtocolViolation {
        id: id.clone(),
        detail: detail.into(),
    }
}
