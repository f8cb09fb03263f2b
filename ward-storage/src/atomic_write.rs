//! Crash-safe atomic file writes: write to a sibling temp file, fsync, then
//! rename over the target. Grounded on the same temp-file-then-rename
//! pattern used throughout this codebase's storage layer.

use std::io;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;

/// Bounded retry count for the final rename, to ride out transient
/// file-lock contention (most visible on Windows, but harmless elsewhere).
const RENAME_RETRIES: u32 = 5;
const RENAME_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum AtomicWriteError {
    #[error("failed to create parent directory {path}: {source}")]
    CreateDir { path: String, source: io::Error },
    #[error("failed to create temp file next to {path}: {source}")]
    CreateTemp { path: String, source: io::Error },
    #[error("failed to write temp file for {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("failed to sync temp file for {path}: {source}")]
    Sync { path: String, source: io::Error },
    #[error("failed to rename temp file into {path} after {attempts} attempts: {source}")]
    Rename {
        path: String,
        attempts: u32,
        source: io::Error,
    },
}

/// Write `contents` to `path` atomically: the file at `path` is either left
/// untouched (on any failure before the rename) or replaced in full (never
/// partially written), even if the process is killed mid-call.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), AtomicWriteError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|source| AtomicWriteError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(|source| AtomicWriteError::CreateTemp {
        path: path.display().to_string(),
        source,
    })?;

    use std::io::Write as _;
    temp.write_all(contents)
        .map_err(|source| AtomicWriteError::Write {
            path: path.display().to_string(),
            source,
        })?;
    temp.as_file()
        .sync_all()
        .map_err(|source| AtomicWriteError::Sync {
            path: path.display().to_string(),
            source,
        })?;

    let mut attempts = 0;
    loop {
        attempts += 1;
        match temp.persist(path) {
            Ok(_file) => {
                best_effort_sync_parent_dir(parent);
                return Ok(());
            }
            Err(err) if attempts < RENAME_RETRIES => {
                temp = err.file;
                std::thread::sleep(RENAME_BACKOFF);
            }
            Err(err) => {
                return Err(AtomicWriteError::Rename {
                    path: path.display().to_string(),
                    attempts,
                    source: err.error,
                });
            }
        }
    }
}

/// fsync the parent directory so the rename itself survives a crash on
/// filesystems that need it (ext4, xfs). Best-effort: platforms/filesystems
/// that don't support this (most notably Windows) are ignored.
fn best_effort_sync_parent_dir(parent: &Path) {
    #[cfg(unix)]
    {
        if let Ok(dir) = std::fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    #[cfg(not(unix))]
    {
        let _ = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("file.txt");
        atomic_write(&path, b"hello").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn replaces_existing_file_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second, longer content").unwrap();
        assert_eq!(
            std::fs::read(&path).unwrap(),
            b"second, longer content".to_vec()
        );
    }

    #[test]
    fn leaves_original_untouched_on_missing_parent_permission() {
        // A parent that is actually a file (not a directory) cannot be
        // created, so the original target must never be disturbed.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let path = blocker.join("file.txt");
        assert!(atomic_write(&path, b"data").is_err());
    }
}
