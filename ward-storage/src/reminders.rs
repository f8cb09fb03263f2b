//! `Reminder` JSONL store front end, backing the `reminder_add` tool
//! (spec section 4.11).

use std::path::PathBuf;

use tokio::sync::Mutex;
use ward_types::{Reminder, ReminderId};

use crate::jsonl::{self, JsonlError};

pub struct ReminderStore {
    path: PathBuf,
    state: Mutex<Vec<Reminder>>,
}

impl ReminderStore {
    pub fn open(path: PathBuf) -> Result<Self, JsonlError> {
        let reminders: Vec<Reminder> = jsonl::read_all(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(reminders),
        })
    }

    pub async fn add(&self, text: &str, due_ts: i64, now_unix: i64) -> Result<ReminderId, JsonlError> {
        let mut reminders = self.state.lock().await;
        let next_id = reminders
            .iter()
            .map(|r| r.id.value())
            .max()
            .map_or(ReminderId::new(1), |max| ReminderId::new(max).next());

        let reminder = Reminder {
            id: next_id,
            ts: now_unix,
            text: text.to_string(),
            due_ts,
        };
        jsonl::append(&self.path, &reminder)?;
        reminders.push(reminder);
        Ok(next_id)
    }

    pub async fn due_before(&self, cutoff_unix: i64) -> Vec<Reminder> {
        let reminders = self.state.lock().await;
        reminders
            .iter()
            .filter(|r| r.due_ts <= cutoff_unix)
            .cloned()
            .collect()
    }

    pub async fn list(&self) -> Vec<Reminder> {
        self.state.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn due_before_filters_by_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReminderStore::open(dir.path().join("reminders.jsonl")).unwrap();
        store.add("early", 100, 0).await.unwrap();
        store.add("late", 900, 0).await.unwrap();

        let due = store.due_before(500).await;
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].text, "early");
    }
}
