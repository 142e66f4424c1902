//! Scripted in-memory fetcher for tracker tests

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::retry::TransientError;
use crate::task::fetch::TaskFetcher;
use crate::types::{TaskId, TaskSnapshot, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FakeError {
    Transient,
    Fatal,
}

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FakeError::Transient => write!(f, "connection reset by peer"),
            FakeError::Fatal => write!(f, "404 not found"),
        }
    }
}

impl std::error::Error for FakeError {}

impl TransientError for FakeError {
    fn is_transient(&self) -> bool {
        matches!(self, FakeError::Transient)
    }
}

type ListScript = Box<dyn FnMut(usize, &[TaskId]) -> Result<Vec<TaskSnapshot>, FakeError>>;

/// Replays scripted responses
///
/// Single refreshes pop the per-id queue; the last entry repeats once the
/// queue is down to one. Batch rounds call the list closure with the round
/// number (starting at 1) and the requested ids.
pub(crate) struct ScriptedFetcher {
    refreshes: RefCell<HashMap<TaskId, VecDeque<Result<TaskSnapshot, FakeError>>>>,
    list: RefCell<ListScript>,
    refresh_calls: Cell<usize>,
    list_requests: RefCell<Vec<Vec<TaskId>>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            refreshes: RefCell::new(HashMap::new()),
            list: RefCell::new(Box::new(|_, _| Ok(Vec::new()))),
            refresh_calls: Cell::new(0),
            list_requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_refreshes(
        self,
        id: impl Into<TaskId>,
        script: Vec<Result<TaskSnapshot, FakeError>>,
    ) -> Self {
        self.refreshes
            .borrow_mut()
            .insert(id.into(), script.into_iter().collect());
        self
    }

    pub(crate) fn with_list<F>(self, script: F) -> Self
    where
        F: FnMut(usize, &[TaskId]) -> Result<Vec<TaskSnapshot>, FakeError> + 'static,
    {
        *self.list.borrow_mut() = Box::new(script);
        self
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.get()
    }

    pub(crate) fn list_requests(&self) -> Vec<Vec<TaskId>> {
        self.list_requests.borrow().clone()
    }
}

impl TaskFetcher for ScriptedFetcher {
    type Error = FakeError;

    fn refresh_task(&self, id: &TaskId) -> Result<TaskSnapshot, FakeError> {
        self.refresh_calls.set(self.refresh_calls.get() + 1);
        let mut refreshes = self.refreshes.borrow_mut();
        let queue = refreshes.get_mut(id).ok_or(FakeError::Fatal)?;
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(Err(FakeError::Fatal))
        } else {
            queue.front().cloned().unwrap_or(Err(FakeError::Fatal))
        }
    }

    fn list_tasks(&self, ids: &[TaskId]) -> Result<Vec<TaskSnapshot>, FakeError> {
        let round = {
            let mut requests = self.list_requests.borrow_mut();
            requests.push(ids.to_vec());
            requests.len()
        };
        let mut list = self.list.borrow_mut();
        (*list)(round, ids)
    }
}

pub(crate) fn pending(id: &str) -> TaskSnapshot {
    TaskSnapshot::new(id, TaskStatus::Pending)
}

pub(crate) fn success(id: &str, data: serde_json::Value) -> TaskSnapshot {
    TaskSnapshot::new(id, TaskStatus::Success).with_data(data)
}

pub(crate) fn failed(id: &str, error: &str) -> TaskSnapshot {
    TaskSnapshot::new(id, TaskStatus::Error).with_error(serde_json::Value::String(error.to_string()))
}
