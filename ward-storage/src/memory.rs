//! The memory store (spec section 4.2): free-text remembered items with
//! scored recall.

use std::path::PathBuf;

use tokio::sync::Mutex;
use ward_types::{MemoryEntry, MemoryId};

use crate::jsonl::{self, JsonlError};

/// Recency weight in the recall score. An exact zero-token-overlap
/// candidate can score at most `RECENCY_WEIGHT` (when brand new), while a
/// single shared token contributes at least 1.0 to a matching candidate's
/// score — so the ordering property (any-match beats no-match) holds for
/// any `RECENCY_WEIGHT <= 1.0`. See DESIGN.md for the open-question
/// resolution.
const RECENCY_WEIGHT: f64 = 1.0;
/// Recency half-life-ish time constant, in seconds (one week).
const RECENCY_TAU_SECS: f64 = 7.0 * 24.0 * 3600.0;

pub struct MemoryStore {
    path: PathBuf,
    max_entries: usize,
    state: Mutex<Vec<MemoryEntry>>,
}

impl MemoryStore {
    pub fn open(path: PathBuf, max_entries: usize) -> Result<Self, JsonlError> {
        let entries: Vec<MemoryEntry> = jsonl::read_all(&path)?;
        Ok(Self {
            path,
            max_entries,
            state: Mutex::new(entries),
        })
    }

    /// Store `text`, returning the new entry's id, or the existing entry's
    /// id if `text` is already present verbatim (idempotent).
    pub async fn remember(
        &self,
        text: &str,
        tags: Vec<String>,
        now_unix: i64,
    ) -> Result<MemoryId, JsonlError> {
        let mut entries = self.state.lock().await;
        if let Some(existing) = entries.iter().find(|e| e.text == text) {
            return Ok(existing.id);
        }

        let next_id = entries
            .iter()
            .map(|e| e.id.value())
            .max()
            .map_or(MemoryId::new(1), |max| MemoryId::new(max).next());

        let entry = MemoryEntry {
            id: next_id,
            ts: now_unix,
            text: text.to_string(),
            tags,
        };
        jsonl::append(&self.path, &entry)?;
        entries.push(entry);

        if entries.len() > self.max_entries {
            let overflow = entries.len() - self.max_entries;
            entries.drain(0..overflow);
            let snapshot = entries.clone();
            jsonl::rewrite_atomic(&self.path, &snapshot)?;
        }

        Ok(next_id)
    }

    pub async fn recall(&self, query: &str, limit: usize, now_unix: i64) -> Vec<MemoryEntry> {
        let entries = self.state.lock().await;
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            let mut ranked: Vec<MemoryEntry> = entries.clone();
            ranked.sort_by(|a, b| b.ts.cmp(&a.ts));
            ranked.truncate(limit);
            return ranked;
        }

        let mut scored: Vec<(f64, &MemoryEntry)> = entries
            .iter()
            .map(|entry| (score(entry, &query_tokens, now_unix), entry))
            .collect();

        scored.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.ts.cmp(&a.ts))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Drop the oldest entries so the store never exceeds `max_entries`.
    pub async fn evict(&self) -> Result<(), JsonlError> {
        let mut entries = self.state.lock().await;
        if entries.len() <= self.max_entries {
            return Ok(());
        }
        entries.sort_by(|a, b| a.ts.cmp(&b.ts));
        let overflow = entries.len() - self.max_entries;
        entries.drain(0..overflow);
        let snapshot = entries.clone();
        jsonl::rewrite_atomic(&self.path, &snapshot)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn score(entry: &MemoryEntry, query_tokens: &[String], now_unix: i64) -> f64 {
    let candidate_tokens = tokenize(&entry.text);
    let frequency_score: f64 = query_tokens
        .iter()
        .map(|qt| candidate_tokens.iter().filter(|ct| *ct == qt).count() as f64)
        .sum();

    let age_secs = (now_unix - entry.ts).max(0) as f64;
    let recency_score = RECENCY_WEIGHT * (-age_secs / RECENCY_TAU_SECS).exp();

    frequency_score + recency_score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remember_is_idempotent_on_exact_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("memory.jsonl"), 100).unwrap();
        let id1 = store.remember("meet Alice at 3pm", vec![], 1000).await.unwrap();
        let id2 = store.remember("meet Alice at 3pm", vec![], 2000).await.unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.state.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn recall_ranks_full_match_over_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("memory.jsonl"), 100).unwrap();
        store.remember("completely unrelated note", vec![], 500).await.unwrap();
        store
            .remember("meet Alice at the office", vec![], 1000)
            .await
            .unwrap();

        let results = store.recall("meet alice", 10, 1500).await;
        assert_eq!(results[0].text, "meet Alice at the office");
    }

    #[tokio::test]
    async fn recall_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("memory.jsonl"), 100).unwrap();
        for i in 0..5 {
            store
                .remember(&format!("note number {i}"), vec![], 1000 + i)
                .await
                .unwrap();
        }
        let results = store.recall("note", 2, 2000).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn evict_drops_oldest_past_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("memory.jsonl"), 2).unwrap();
        store.remember("first", vec![], 100).await.unwrap();
        store.remember("second", vec![], 200).await.unwrap();
        store.remember("third", vec![], 300).await.unwrap();
        store.evict().await.unwrap();
        let entries = store.state.lock().await;
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.text != "first"));
    }
}
