//! The permissions model (spec section 4.3): materializes the permissions
//! document into fast predicates.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ward_types::{Limits, PermissionsDocument};

#[derive(Debug, thiserror::Error)]
pub enum PermissionsError {
    #[error("permissions document has an empty allow_paths list")]
    EmptyAllowPaths,
    #[error("failed to canonicalize allow_paths entry {entry}: {source}")]
    CanonicalizeEntry {
        entry: String,
        source: std::io::Error,
    },
}

/// Canonicalized, ready-to-query form of the permissions document.
pub struct Permissions {
    allow_paths: Vec<PathBuf>,
    allow_commands: HashSet<String>,
    require_confirmation_for: HashSet<String>,
    deny_tools: HashSet<String>,
    limits: Limits,
    allow_read_env: bool,
}

impl Permissions {
    /// Load from a parsed document, canonicalizing every `allow_paths`
    /// entry relative to `base_dir` up front. Rejects an empty
    /// `allow_paths` list; everything else in the document takes its
    /// documented default.
    pub fn from_document(doc: PermissionsDocument, base_dir: &Path) -> Result<Self, PermissionsError> {
        if doc.allow_paths.is_empty() {
            return Err(PermissionsError::EmptyAllowPaths);
        }

        let mut allow_paths = Vec::with_capacity(doc.allow_paths.len());
        for entry in &doc.allow_paths {
            let expanded = expand_tilde(entry);
            let joined = if expanded.is_absolute() {
                expanded
            } else {
                base_dir.join(expanded)
            };
            let canonical = std::fs::canonicalize(&joined).map_err(|source| {
                PermissionsError::CanonicalizeEntry {
                    entry: entry.clone(),
                    source,
                }
            })?;
            allow_paths.push(canonical);
        }

        Ok(Self {
            allow_paths,
            allow_commands: doc.allow_commands,
            require_confirmation_for: doc.require_confirmation_for,
            deny_tools: doc.deny_tools,
            limits: doc.limits,
            allow_read_env: doc.allow_read_env,
        })
    }

    #[must_use]
    pub fn allow_paths(&self) -> &[PathBuf] {
        &self.allow_paths
    }

    #[must_use]
    pub fn is_allowed_path(&self, canonical: &Path) -> bool {
        self.allow_paths.iter().any(|root| canonical.starts_with(root))
    }

    #[must_use]
    pub fn is_allowed_command(&self, name: &str) -> bool {
        self.allow_commands.contains(name)
    }

    #[must_use]
    pub fn is_denied_tool(&self, name: &str) -> bool {
        self.deny_tools.contains(name)
    }

    #[must_use]
    pub fn requires_confirmation(&self, tool_name: &str) -> bool {
        self.require_confirmation_for.contains(tool_name)
    }

    #[must_use]
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    #[must_use]
    pub fn allow_read_env(&self) -> bool {
        self.allow_read_env
    }
}

fn expand_tilde(entry: &str) -> PathBuf {
    if let Some(rest) = entry.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if entry == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(allow_paths: Vec<&str>) -> PermissionsDocument {
        PermissionsDocument {
            version: 1,
            allow_paths: allow_paths.into_iter().map(str::to_string).collect(),
            allow_commands: HashSet::new(),
            require_confirmation_for: HashSet::new(),
            deny_tools: HashSet::new(),
            limits: Limits::default(),
            allow_read_env: false,
        }
    }

    #[test]
    fn rejects_empty_allow_paths() {
        let dir = tempfile::tempdir().unwrap();
        let err = Permissions::from_document(doc(vec![]), dir.path());
        assert!(matches!(err, Err(PermissionsError::EmptyAllowPaths)));
    }

    #[test]
    fn is_allowed_path_is_prefix_based() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        let perms = Permissions::from_document(doc(vec!["./"]), dir.path()).unwrap();
        let canonical = std::fs::canonicalize(dir.path().join("sub")).unwrap();
        assert!(perms.is_allowed_path(&canonical));

        let outside = std::env::temp_dir();
        if outside != dir.path() {
            assert!(!perms.is_allowed_path(&outside.join("nonexistent-sibling")));
        }
    }
}
