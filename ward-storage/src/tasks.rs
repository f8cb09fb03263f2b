//! `Task` JSONL store front end, backing the `task_add`/`task_list`/
//! `task_done` tools (spec section 4.11).

use std::path::PathBuf;

use tokio::sync::Mutex;
use ward_types::{Task, TaskId, TaskStatus};

use crate::jsonl::{self, JsonlError};

pub struct TaskStore {
    path: PathBuf,
    state: Mutex<Vec<Task>>,
}

impl TaskStore {
    pub fn open(path: PathBuf) -> Result<Self, JsonlError> {
        let tasks: Vec<Task> = jsonl::read_all(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(tasks),
        })
    }

    pub async fn add(&self, text: &str, now_unix: i64) -> Result<TaskId, JsonlError> {
        let mut tasks = self.state.lock().await;
        let next_id = tasks
            .iter()
            .map(|t| t.id.value())
            .max()
            .map_or(TaskId::new(1), |max| TaskId::new(max).next());

        let task = Task {
            id: next_id,
            ts: now_unix,
            text: text.to_string(),
            status: TaskStatus::Open,
            completed_ts: None,
        };
        jsonl::append(&self.path, &task)?;
        tasks.push(task);
        Ok(next_id)
    }

    pub async fn list(&self, include_done: bool) -> Vec<Task> {
        let tasks = self.state.lock().await;
        tasks
            .iter()
            .filter(|t| include_done || t.status == TaskStatus::Open)
            .cloned()
            .collect()
    }

    /// Mark a task done, rewriting the whole file atomically. Returns
    /// `false` if `id` is unknown.
    pub async fn mark_done(&self, id: TaskId, now_unix: i64) -> Result<bool, JsonlError> {
        let mut tasks = self.state.lock().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.status = TaskStatus::Done;
        task.completed_ts = Some(now_unix);
        let snapshot = tasks.clone();
        jsonl::rewrite_atomic(&self.path, &snapshot)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_monotonic_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.jsonl")).unwrap();
        let first = store.add("buy milk", 100).await.unwrap();
        let second = store.add("walk dog", 200).await.unwrap();
        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 2);
    }

    #[tokio::test]
    async fn mark_done_updates_status_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.jsonl");
        let store = TaskStore::open(path.clone()).unwrap();
        let id = store.add("buy milk", 100).await.unwrap();
        assert!(store.mark_done(id, 200).await.unwrap());

        let reopened = TaskStore::open(path).unwrap();
        let tasks = reopened.list(true).await;
        assert_eq!(tasks[0].status, TaskStatus::Done);
        assert_eq!(tasks[0].completed_ts, Some(200));
    }

    #[tokio::test]
    async fn list_excludes_done_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(dir.path().join("tasks.jsonl")).unwrap();
        let id = store.add("buy milk", 100).await.unwrap();
        store.add("walk dog", 200).await.unwrap();
        store.mark_done(id, 300).await.unwrap();

        let open_only = store.list(false).await;
        assert_eq!(open_only.len(), 1);
        assert_eq!(open_only[0].text, "walk dog");
    }
}
