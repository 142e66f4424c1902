//! Asynchronous task model
//!
//! A task is a server-side handle for one unit of asynchronous work (model
//! upload, inference). The client only ever learns about state changes by
//! re-fetching the whole task; a [`Task`] therefore holds the last snapshot
//! returned by the server and replaces it wholesale on every refresh.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};

/// Opaque task identifier, numeric or textual depending on the endpoint
///
/// Equality and hashing go through the textual form, so `Text("7")` and
/// `Number(7)` name the same task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(u64),
    Text(String),
}

impl TaskId {
    fn text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            TaskId::Number(n) => std::borrow::Cow::Owned(n.to_string()),
            TaskId::Text(s) => std::borrow::Cow::Borrowed(s.as_str()),
        }
    }
}

impl PartialEq for TaskId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TaskId::Number(a), TaskId::Number(b)) => a == b,
            _ => self.text() == other.text(),
        }
    }
}

impl Eq for TaskId {}

impl Hash for TaskId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text().hash(state);
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId::Number(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId::Text(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId::Text(id)
    }
}

/// Task state. Closed set: anything else reported by the server is a
/// protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Success,
    Error,
}

impl TaskStatus {
    /// Parse the wire representation of a status
    pub fn parse(status: &str) -> Result<Self> {
        match status {
            "pending" => Ok(TaskStatus::Pending),
            "success" => Ok(TaskStatus::Success),
            "error" => Ok(TaskStatus::Error),
            other => Err(Error::unknown_task_status(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Success => "success",
            TaskStatus::Error => "error",
        }
    }

    /// `success` and `error` are terminal
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One server response describing a task
///
/// `status` is kept as the raw string so an unexpected value reaches the
/// tracker and is reported as a protocol violation instead of a decode error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,

    pub status: String,

    /// Result payload, meaningful when the status is `success`
    #[serde(default)]
    pub data: Option<Value>,

    /// Error detail, meaningful when the status is `error`
    #[serde(default)]
    pub error: Option<Value>,

    /// Any other field returned by the server (dates, subtask counts, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskSnapshot {
    pub fn new(id: impl Into<TaskId>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            status: status.as_str().to_string(),
            data: None,
            error: None,
            extra: Map::new(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: Value) -> Self {
        self.error = Some(error);
        self
    }

    /// Decode a snapshot from a JSON document
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Validated status
    pub fn state(&self) -> Result<TaskStatus> {
        TaskStatus::parse(&self.status)
    }
}

/// Client-side handle on a task
///
/// A `Task` is owned by a single caller; the tracker takes it by `&mut` (or by
/// value for batches) so its snapshot is never updated from two places at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    snapshot: Option<TaskSnapshot>,
}

impl Task {
    /// A task known only by id, not fetched yet
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            snapshot: None,
        }
    }

    pub fn from_snapshot(snapshot: TaskSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            snapshot: Some(snapshot),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Last snapshot fetched from the server
    pub fn snapshot(&self) -> Option<&TaskSnapshot> {
        self.snapshot.as_ref()
    }

    /// Status of the last snapshot, `None` if never fetched or unrecognised
    pub fn status(&self) -> Option<TaskStatus> {
        self.snapshot.as_ref().and_then(|s| s.state().ok())
    }

    /// Result payload of a successful task
    pub fn data(&self) -> Option<&Value> {
        self.snapshot.as_ref().and_then(|s| s.data.as_ref())
    }

    /// Server-reported error detail of a failed task
    pub fn error_detail(&self) -> Option<&Value> {
        self.snapshot.as_ref().and_then(|s| s.error.as_ref())
    }

    /// Check that `snapshot` is a legal successor of the current one.
    ///
    /// Legal transitions are `pending -> pending`, `pending -> success` and
    /// `pending -> error`; a terminal state never changes. Returns the new
    /// status, or a description of the violation.
    pub fn check_refresh(&self, snapshot: &TaskSnapshot) -> std::result::Result<TaskStatus, String> {
        if snapshot.id != self.id {
            return Err(format!(
                "refresh of task {} returned task {}",
                self.id, snapshot.id
            ));
        }
        let next = snapshot.state().map_err(|e| e.to_string())?;
        if let Some(previous) = self.status() {
            if previous.is_terminal() && previous != next {
                return Err(format!(
                    "task {} went from terminal status {} to {}",
                    self.id, previous, next
                ));
            }
        }
        Ok(next)
    }

    /// Replace the local snapshot with a freshly fetched one
    pub(crate) fn replace_snapshot(&mut self, snapshot: TaskSnapshot) {
        self.snapshot = Some(snapshot);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.snapshot.as_ref() {
            Some(snapshot) => write!(f, "Task({}, {})", self.id, snapshot.status),
            None => write!(f, "Task({})", self.id),
        }
    }
}

/// Batch Position Map: original input positions of every task id
///
/// The same id may appear more than once in a batch; each occurrence keeps
/// its own position.
#[derive(Debug, Clone, Default)]
pub struct BatchPositions {
    positions: HashMap<TaskId, Vec<usize>>,
    order: Vec<TaskId>,
    len: usize,
}

impl BatchPositions {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut map = Self::default();
        for (position, task) in tasks.iter().enumerate() {
            let entry = map.positions.entry(task.id().clone()).or_default();
            if entry.is_empty() {
                map.order.push(task.id().clone());
            }
            entry.push(position);
        }
        map.len = tasks.len();
        map
    }

    /// Positions of `id` in the input, ascending
    pub fn positions_of(&self, id: &TaskId) -> Option<&[usize]> {
        self.positions.get(id).map(Vec::as_slice)
    }

    /// Distinct ids in order of first appearance
    pub fn ids(&self) -> &[TaskId] {
        &self.order
    }

    /// Number of input positions (duplicates included)
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Result of a batch wait: every input task in exactly one bucket, each
/// bucket holding `(original_position, task)` pairs sorted by position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub pending: Vec<(usize, Task)>,
    pub success: Vec<(usize, Task)>,
    pub error: Vec<(usize, Task)>,
}

impl BatchOutcome {
    /// Total number of tasks across the three buckets
    pub fn len(&self) -> usize {
        self.pending.len() + self.success.len() + self.error.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when no task is left pending
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn into_parts(self) -> (Vec<(usize, Task)>, Vec<(usize, Task)>, Vec<(usize, Task)>) {
        (self.pending, self.success, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_task_id_numeric_and_textual_forms_match() {
        assert_eq!(TaskId::from("7"), TaskId::from(7u64));
        assert_ne!(TaskId::from("07"), TaskId::from(7u64));

        let mut ids = HashSet::new();
        ids.insert(TaskId::from(7u64));
        assert!(ids.contains(&TaskId::from("7")));
        assert!(!ids.insert(TaskId::from("7")));
    }

    #[test]
    fn test_refresh_accepts_numeric_id_for_textual_handle() {
        let task = Task::new("7");
        let snapshot: TaskSnapshot =
            serde_json::from_value(json!({"id": 7, "status": "success", "data": {}})).unwrap();

        assert_eq!(task.check_refresh(&snapshot).unwrap(), TaskStatus::Success);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(TaskStatus::parse("pending").unwrap(), TaskStatus::Pending);
        assert_eq!(TaskStatus::parse("success").unwrap(), TaskStatus::Success);
        assert_eq!(TaskStatus::parse("error").unwrap(), TaskStatus::Error);
        assert!(matches!(
            TaskStatus::parse("running"),
            Err(Error::UnknownTaskStatus { status }) if status == "running"
        ));
    }

    #[test]
    fn test_status_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(TaskStatus::Success.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
    }

    #[test]
    fn test_task_id_untagged() {
        let numeric: TaskId = serde_json::from_value(json!(42)).unwrap();
        let text: TaskId = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(numeric, TaskId::Number(42));
        assert_eq!(text, TaskId::Text("abc".into()));
        assert_eq!(numeric.to_string(), "42");
    }

    #[test]
    fn test_snapshot_keeps_unknown_status_and_extra_fields() {
        let snapshot = TaskSnapshot::from_value(json!({
            "id": 7,
            "status": "weird",
            "date_created": "2019-01-01",
        }))
        .unwrap();

        assert_eq!(snapshot.status, "weird");
        assert!(snapshot.state().is_err());
        assert_eq!(snapshot.extra["date_created"], "2019-01-01");
        assert!(snapshot.data.is_none());
    }

    #[test]
    fn test_task_accessors() {
        let task = Task::from_snapshot(
            TaskSnapshot::new("t1", TaskStatus::Success).with_data(json!({"x": 1})),
        );
        assert_eq!(task.status(), Some(TaskStatus::Success));
        assert_eq!(task.data(), Some(&json!({"x": 1})));
        assert!(task.error_detail().is_none());
        assert_eq!(task.to_string(), "Task(t1, success)");
    }

    #[test]
    fn test_check_refresh_transitions() {
        let pending = Task::from_snapshot(TaskSnapshot::new("t1", TaskStatus::Pending));
        assert_eq!(
            pending.check_refresh(&TaskSnapshot::new("t1", TaskStatus::Success)),
            Ok(TaskStatus::Success)
        );

        let done = Task::from_snapshot(TaskSnapshot::new("t1", TaskStatus::Success));
        assert!(done
            .check_refresh(&TaskSnapshot::new("t1", TaskStatus::Pending))
            .is_err());
        assert!(done
            .check_refresh(&TaskSnapshot::new("t1", TaskStatus::Error))
            .is_err());
        assert_eq!(
            done.check_refresh(&TaskSnapshot::new("t1", TaskStatus::Success)),
            Ok(TaskStatus::Success)
        );
    }

    #[test]
    fn test_check_refresh_rejects_other_id() {
        let task = Task::new("t1");
        assert!(task
            .check_refresh(&TaskSnapshot::new("t2", TaskStatus::Pending))
            .is_err());
    }

    #[test]
    fn test_batch_positions_with_duplicates() {
        let tasks = vec![Task::new("a"), Task::new("b"), Task::new("a")];
        let positions = BatchPositions::from_tasks(&tasks);

        assert_eq!(positions.len(), 3);
        assert_eq!(positions.ids(), &[TaskId::from("a"), TaskId::from("b")]);
        assert_eq!(positions.positions_of(&"a".into()), Some(&[0, 2][..]));
        assert_eq!(positions.positions_of(&"b".into()), Some(&[1][..]));
        assert!(positions.positions_of(&"c".into()).is_none());
    }
}
