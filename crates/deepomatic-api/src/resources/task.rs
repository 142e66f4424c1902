//! Asynchronous tasks

use std::sync::Arc;

use reqwest::Method;
use tracing::debug;

use deepomatic_core::task::{batch_wait, wait};
use deepomatic_core::{BatchOutcome, Task, TaskFetcher, TaskId, TaskSnapshot, WaitOptions};

use crate::error::{HttpError, Result};
use crate::http::{HttpHelper, QueryParams, RequestOptions};

use super::page::RawPage;

const TASKS_URI: &str = "/tasks/";
const PAGE_LIMIT: usize = 100;

/// `/tasks/`: fetching and waiting on server-side tasks
#[derive(Debug, Clone)]
pub struct Tasks {
    http: Arc<HttpHelper>,
}

impl Tasks {
    pub(crate) fn new(http: Arc<HttpHelper>) -> Self {
        Self { http }
    }

    /// Fetch one task
    pub fn retrieve(&self, id: impl Into<TaskId>) -> Result<Task> {
        let snapshot = self.refresh_task(&id.into())?;
        Ok(Task::from_snapshot(snapshot))
    }

    /// Fetch several tasks in one request
    pub fn list(&self, ids: &[TaskId]) -> Result<Vec<Task>> {
        Ok(self
            .list_tasks(ids)?
            .into_iter()
            .map(Task::from_snapshot)
            .collect())
    }

    /// Poll a task until it is terminal, see [`deepomatic_core::wait`]
    pub fn wait(&self, task: &mut Task, options: &WaitOptions) -> Result<()> {
        wait(self, task, options)?;
        Ok(())
    }

    /// Fetch a task by id and wait for it
    pub fn wait_for(&self, id: impl Into<TaskId>, options: &WaitOptions) -> Result<Task> {
        let mut task = Task::new(id);
        self.wait(&mut task, options)?;
        Ok(task)
    }

    /// Wait for an ordered batch, see [`deepomatic_core::batch_wait`]
    pub fn batch_wait(&self, tasks: Vec<Task>, options: &WaitOptions) -> Result<BatchOutcome> {
        Ok(batch_wait(self, tasks, options)?)
    }

    fn task_uri(id: &TaskId) -> String {
        format!("{}{}/", TASKS_URI, id)
    }
}

impl TaskFetcher for Tasks {
    type Error = HttpError;

    fn refresh_task(&self, id: &TaskId) -> std::result::Result<TaskSnapshot, HttpError> {
        debug!(task = %id, "fetching task");
        let value = self
            .http
            .request(
                Method::GET,
                &Self::task_uri(id),
                &Vec::new(),
                None,
                &RequestOptions::default(),
            )?
            .into_json()?;
        Ok(serde_json::from_value(value)?)
    }

    /// Follows `next` links until every page is read
    fn list_tasks(&self, ids: &[TaskId]) -> std::result::Result<Vec<TaskSnapshot>, HttpError> {
        debug!(tasks = ids.len(), "fetching task batch");
        let mut params: QueryParams = ids
            .iter()
            .map(|id| ("task_ids".to_string(), id.to_string()))
            .collect();
        params.push(("offset".to_string(), "0".to_string()));
        params.push(("limit".to_string(), PAGE_LIMIT.to_string()));

        let mut snapshots = Vec::with_capacity(ids.len());
        let mut uri = Some(TASKS_URI.to_string());
        while let Some(current) = uri.take() {
            let value = self
                .http
                .request(
                    Method::GET,
                    &current,
                    &params,
                    None,
                    &RequestOptions::default(),
                )?
                .into_json()?;
            let page: RawPage = serde_json::from_value(value)?;
            for result in page.results {
                snapshots.push(serde_json::from_value(result)?);
            }
            // `next` already carries the query string
            params.clear();
            uri = page.next;
        }
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_uri() {
        assert_eq!(Tasks::task_uri(&TaskId::from(12)), "/tasks/12/");
        assert_eq!(Tasks::task_uri(&TaskId::from("abc")), "/tasks/abc/");
    }
}
