//! The JSONL store (spec section 4.1): append/read/atomic-rewrite of
//! newline-delimited JSON records.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write as _};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::atomic_write::{AtomicWriteError, atomic_write};

/// Cap on how many malformed-line warnings a single `read_all` call emits;
/// beyond this the rest are silently skipped (still counted in the return
/// value's implicit "fewer records than lines" gap).
const MAX_WARNINGS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("failed to open {path} for append: {source}")]
    OpenForAppend {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize record for {path}: {source}")]
    Serialize {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to append to {path}: {source}")]
    Append {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    AtomicWrite(#[from] AtomicWriteError),
}

/// Append a single record to `path`, creating the parent directory and file
/// if missing. Relies on `O_APPEND` semantics so concurrent appends from
/// this process (serialized by the caller's mutex) never interleave with an
/// in-flight `rewrite_atomic`'s rename.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<(), JsonlError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|source| JsonlError::OpenForAppend {
            path: path.display().to_string(),
            source,
        })?;
    }

    let mut line = serde_json::to_string(record).map_err(|source| JsonlError::Serialize {
        path: path.display().to_string(),
        source,
    })?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| JsonlError::OpenForAppend {
            path: path.display().to_string(),
            source,
        })?;

    file.write_all(line.as_bytes())
        .map_err(|source| JsonlError::Append {
            path: path.display().to_string(),
            source,
        })?;
    file.sync_all().map_err(|source| JsonlError::Append {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

/// Parse every line of `path` as a `T`, skipping malformed lines rather than
/// failing the whole read. Never raises on a corrupt line; a missing file
/// reads as empty.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, JsonlError> {
    let Ok(file) = std::fs::File::open(path) else {
        return Ok(Vec::new());
    };
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut warned = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(record) => records.push(record),
            Err(err) => {
                if warned < MAX_WARNINGS {
                    tracing::warn!(
                        path = %path.display(),
                        line = line_no + 1,
                        error = %err,
                        "skipping malformed JSONL line"
                    );
                    warned += 1;
                }
            }
        }
    }
    Ok(records)
}

/// Replace the entire contents of `path` with `records`, atomically. On any
/// failure the original file is left exactly as it was.
pub fn rewrite_atomic<T: Serialize>(path: &Path, records: &[T]) -> Result<(), JsonlError> {
    let mut buf = String::new();
    for record in records {
        let line = serde_json::to_string(record).map_err(|source| JsonlError::Serialize {
            path: path.display().to_string(),
            source,
        })?;
        buf.push_str(&line);
        buf.push('\n');
    }
    atomic_write(path, buf.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rec {
        id: u64,
        text: String,
    }

    #[test]
    fn append_then_read_all_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        append(
            &path,
            &Rec {
                id: 1,
                text: "a".into(),
            },
        )
        .unwrap();
        append(
            &path,
            &Rec {
                id: 2,
                text: "b".into(),
            },
        )
        .unwrap();
        let records: Vec<Rec> = read_all(&path).unwrap();
        assert_eq!(
            records,
            vec![
                Rec {
                    id: 1,
                    text: "a".into()
                },
                Rec {
                    id: 2,
                    text: "b".into()
                },
            ]
        );
    }

    #[test]
    fn read_all_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        std::fs::write(&path, "{\"id\":1,\"text\":\"a\"}\nnot json\n{\"id\":2,\"text\":\"b\"}\n")
            .unwrap();
        let records: Vec<Rec> = read_all(&path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn read_all_on_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jsonl");
        let records: Vec<Rec> = read_all(&path).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn rewrite_atomic_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let records = vec![
            Rec {
                id: 1,
                text: "a".into(),
            },
            Rec {
                id: 2,
                text: "b".into(),
            },
        ];
        rewrite_atomic(&path, &records).unwrap();
        let read_back: Vec<Rec> = read_all(&path).unwrap();
        assert_eq!(read_back, records);
    }
}
