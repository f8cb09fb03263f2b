//! Audit log and command log (spec section 4.10): append-only,
//! best-effort observability. A logging failure never fails the request.

use std::path::PathBuf;

use tokio::sync::Mutex;
use ward_types::{AuditRecord, CommandLogEntry};

use crate::jsonl;

pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Append one record. Best-effort: failures are logged, never
    /// propagated, because observability must not be able to fail a
    /// request that otherwise succeeded.
    pub async fn record(&self, entry: &AuditRecord) {
        let _guard = self.lock.lock().await;
        if let Err(err) = jsonl::append(&self.path, entry) {
            tracing::warn!(error = %err, "failed to append audit record");
        }
    }
}

pub struct CommandLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CommandLog {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub async fn record(&self, entry: &CommandLogEntry) {
        let _guard = self.lock.lock().await;
        if let Err(err) = jsonl::append(&self.path, entry) {
            tracing::warn!(error = %err, "failed to append command log entry");
        }
    }
}
