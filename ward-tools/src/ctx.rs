//! `ExecutorContext` (spec section 3, 4.7): the capability bundle passed to
//! every tool handler. A handler must not reach outside `ctx` for
//! filesystem, process, or storage access.

use std::path::{Path, PathBuf};

use ward_permissions::{CommandCapability, FetchCapability, Permissions, Sandbox};
use ward_storage::{MemoryStore, ReminderStore, TaskStore};
use ward_types::Limits;

use crate::registry::ToolDefinition;

pub struct ToolCtx<'a> {
    pub base_dir: PathBuf,
    pub sandbox: &'a Sandbox<'a>,
    pub commands: &'a CommandCapability<'a>,
    pub fetch: &'a FetchCapability,
    pub permissions: &'a Permissions,
    pub memory: &'a MemoryStore,
    pub tasks: &'a TaskStore,
    pub reminders: &'a ReminderStore,
    /// Request-scoped clock, threaded through rather than read from
    /// `SystemTime::now()` directly so handlers are deterministic in
    /// tests.
    pub now_unix: i64,
    /// Registry snapshot already filtered to the calling agent's
    /// allow-list, for `list_tools` — the handler never touches the
    /// registry or the agent identity directly.
    pub visible_tools: Vec<ToolDefinition>,
}

impl<'a> ToolCtx<'a> {
    #[must_use]
    pub fn limits(&self) -> &Limits {
        self.permissions.limits()
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
