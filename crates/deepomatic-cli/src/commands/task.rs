//! Task commands

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use deepomatic_api::{BatchOutcome, Client, Task, TaskId, WaitOptions};

use crate::cli::{TaskBatchWaitArgs, TaskCommands, TaskGetArgs, TaskWaitArgs};
use crate::output;

pub fn run(command: TaskCommands, client: &Client, quiet: bool) -> Result<()> {
    match command {
        TaskCommands::Get(args) => get(args, client),
        TaskCommands::Wait(args) => wait(args, client, quiet),
        TaskCommands::BatchWait(args) => batch_wait(args, client, quiet),
    }
}

fn get(args: TaskGetArgs, client: &Client) -> Result<()> {
    let task = client
        .tasks()
        .retrieve(parse_task_id(&args.id))
        .with_context(|| format!("Failed to fetch task {}", args.id))?;
    output::json(&task_json(&task)?)
}

fn wait(args: TaskWaitArgs, client: &Client, quiet: bool) -> Result<()> {
    let options = WaitOptions::single().with_timeout(Duration::from_secs(args.timeout));

    let pb = output::spinner(&format!("Waiting for task {}", args.id), quiet);
    let result = client.tasks().wait_for(parse_task_id(&args.id), &options);
    pb.finish_and_clear();

    let task = result.with_context(|| format!("Task {} did not succeed", args.id))?;
    if !quiet {
        output::success(&format!("Task {} succeeded", args.id));
    }
    output::json(&task_json(&task)?)
}

fn batch_wait(args: TaskBatchWaitArgs, client: &Client, quiet: bool) -> Result<()> {
    let options = WaitOptions::batch().with_timeout(Duration::from_secs(args.timeout));
    let tasks = args.ids.iter().map(|id| Task::new(parse_task_id(id))).collect();

    let pb = output::spinner(&format!("Waiting for {} tasks", args.ids.len()), quiet);
    let result = client.tasks().batch_wait(tasks, &options);
    pb.finish_and_clear();

    let outcome = result.context("Batch wait failed")?;
    if !outcome.is_complete() && !quiet {
        output::warning(&format!(
            "{} task(s) still pending after {}s",
            outcome.pending.len(),
            args.timeout
        ));
    }
    output::json(&outcome_json(&outcome)?)
}

/// Numeric ids are sent as numbers, anything else as text
pub fn parse_task_id(id: &str) -> TaskId {
    id.parse::<u64>()
        .map(TaskId::from)
        .unwrap_or_else(|_| TaskId::from(id))
}

/// Last snapshot of a task, or just its id when never fetched
pub fn task_json(task: &Task) -> Result<Value> {
    Ok(match task.snapshot() {
        Some(snapshot) => serde_json::to_value(snapshot)?,
        None => json!({ "id": task.id() }),
    })
}

fn bucket_json(bucket: &[(usize, Task)]) -> Result<Value> {
    bucket
        .iter()
        .map(|(position, task)| {
            let task = task_json(task)?;
            Ok(json!({ "position": position, "task": task }))
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn outcome_json(outcome: &BatchOutcome) -> Result<Value> {
    Ok(json!({
        "pending": bucket_json(&outcome.pending)?,
        "success": bucket_json(&outcome.success)?,
        "error": bucket_json(&outcome.error)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepomatic_core::{TaskSnapshot, TaskStatus};

    #[test]
    fn test_parse_task_id() {
        assert_eq!(parse_task_id("42"), TaskId::Number(42));
        assert_eq!(parse_task_id("a1b2"), TaskId::Text("a1b2".to_string()));
    }

    #[test]
    fn test_task_json_without_snapshot() {
        assert_eq!(task_json(&Task::new(3u64)).unwrap(), json!({"id": 3}));
    }

    #[test]
    fn test_outcome_json() {
        let done = Task::from_snapshot(
            TaskSnapshot::new(1u64, TaskStatus::Success).with_data(json!({"score": 0.9})),
        );
        let outcome = BatchOutcome {
            pending: vec![(1, Task::new(2u64))],
            success: vec![(0, done)],
            error: vec![],
        };
        let value = outcome_json(&outcome).unwrap();
        assert_eq!(value["success"][0]["position"], 0);
        assert_eq!(value["success"][0]["task"]["data"]["score"], 0.9);
        assert_eq!(value["pending"][0]["task"]["id"], 2);
        assert_eq!(value["error"], json!([]));
    }
}
