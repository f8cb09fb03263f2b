//! The executor (spec section 4.7): enforce trust, validate, dispatch,
//! audit. `Executor::execute` is the only path from a routed tool call to
//! a handler invocation; it owns no mutable state of its own beyond its
//! capabilities, the registry, and the stores it was constructed with.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::FutureExt as _;
use serde_json::Value;
use ward_permissions::{CommandBlacklist, CommandCapability, FetchCapability, Permissions, Sandbox};
use ward_storage::{AuditLog, JsonlError, MemoryStore, ReminderStore, TaskStore};
use ward_tools::{ToolCtx, ToolRegistry, sanitize_args_for_audit, validate_args};
use ward_types::{Agent, AuditRecord, ErrorCode, ToolResult};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to open a JSONL store: {0}")]
    Store(#[from] JsonlError),
}

/// Tools whose handler may legitimately run longer than the executor's
/// default soft wall-clock limit, because they themselves drive a
/// subprocess bound by `limits.command_timeout_ms` (spec section 4.7,
/// step 7: "long-running tools opt in to a longer one").
const LONG_RUNNING_TOOLS: &[&str] = &["run_command", "git_status", "git_diff", "git_log"];

/// Tools bound by `limits.fetch_timeout_ms` rather than
/// `limits.command_timeout_ms`.
const FETCH_BOUND_TOOLS: &[&str] = &["read_url"];

/// Default soft wall-clock limit for a handler invocation that has no
/// subprocess or network call of its own.
const DEFAULT_SOFT_TIMEOUT: Duration = Duration::from_secs(5);
/// Extra headroom above `limits.command_timeout_ms`/`limits.fetch_timeout_ms`
/// granted to a long-running tool, so the executor's own timeout never
/// fires before the command/fetch capability's internal one has a chance
/// to.
const LONG_RUNNING_HEADROOM: Duration = Duration::from_secs(2);

pub struct Executor {
    registry: ToolRegistry,
    permissions: Permissions,
    blacklist: CommandBlacklist,
    base_dir: PathBuf,
    memory: MemoryStore,
    tasks: TaskStore,
    reminders: ReminderStore,
    audit: AuditLog,
}

impl Executor {
    /// Open every JSONL-backed store under `data_dir` and wire up a fresh
    /// executor over `registry`/`permissions`, rooted at `base_dir` for
    /// path/command capability resolution.
    pub fn open(
        base_dir: PathBuf,
        data_dir: &Path,
        permissions: Permissions,
        registry: ToolRegistry,
    ) -> Result<Self, ExecutorError> {
        let max_memory_entries = permissions.limits().max_memory_entries;
        let memory = MemoryStore::open(data_dir.join("memory.jsonl"), max_memory_entries)?;
        let tasks = TaskStore::open(data_dir.join("tasks.jsonl"))?;
        let reminders = ReminderStore::open(data_dir.join("reminders.jsonl"))?;
        let audit = AuditLog::new(data_dir.join("audit.jsonl"));

        Ok(Self {
            registry,
            permissions,
            blacklist: CommandBlacklist::new(),
            base_dir,
            memory,
            tasks,
            reminders,
            audit,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    #[must_use]
    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    fn is_permitted(&self, tool_name: &str, agent: Option<&Agent>) -> bool {
        match agent {
            Some(agent) => agent.may_call(tool_name) || ward_types::is_safe_tool(tool_name),
            None => ward_types::is_safe_tool(tool_name),
        }
    }

    fn soft_timeout(&self, tool_name: &str) -> Duration {
        if LONG_RUNNING_TOOLS.contains(&tool_name) {
            Duration::from_millis(self.permissions.limits().command_timeout_ms) + LONG_RUNNING_HEADROOM
        } else if FETCH_BOUND_TOOLS.contains(&tool_name) {
            Duration::from_millis(self.permissions.limits().fetch_timeout_ms) + LONG_RUNNING_HEADROOM
        } else {
            DEFAULT_SOFT_TIMEOUT
        }
    }

    /// `execute(toolName, args) -> ToolResult`, steps 1-9 of spec section
    /// 4.7, exactly in order. `now_unix` is the request-scoped clock value
    /// threaded into `ToolCtx` and the resulting `AuditRecord`.
    pub async fn execute(
        &self,
        agent: Option<&Agent>,
        tool_name: &str,
        args: Value,
        now_unix: i64,
    ) -> ToolResult {
        let started = std::time::Instant::now();

        // Step 1: denylist check, unconditional.
        if self.permissions.is_denied_tool(tool_name) {
            return ToolResult::failure(
                ErrorCode::DeniedToolBlocklist,
                format!("tool `{tool_name}` is blocked by deny_tools"),
                None,
            );
        }

        // Step 2: agent gate. agent=nil is limited to SAFE_TOOLS;
        // kind=system skips the allow-list (denylist already checked).
        if !self.is_permitted(tool_name, agent) {
            return ToolResult::failure(
                ErrorCode::DeniedAgentToolset,
                format!("tool `{tool_name}` is not in the calling agent's toolset"),
                None,
            );
        }

        // Step 3: registry lookup.
        let Some(handler) = self.registry.get(tool_name) else {
            let suggestions = self.registry.suggestions(5);
            return ToolResult::failure(
                ErrorCode::UnknownTool,
                format!("unknown tool `{tool_name}`"),
                Some(serde_json::json!({"suggestions": suggestions})),
            );
        };

        // Step 4: confirmation gate. `confirm` is an executor-level
        // protocol field, not a tool argument, so it is stripped before
        // the tool ever sees `args` (its schema has no `confirm`
        // property and most declare `additionalProperties: false`).
        // The permissions document names which tools need confirmation,
        // but the gate only ever fires for a handler that actually
        // reports itself side-effecting — naming a side-effect-free tool
        // in `require_confirmation_for` is a configuration no-op rather
        // than a surprise prompt on a read.
        let mut args = args;
        let confirmed = args
            .get("confirm")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if let Value::Object(map) = &mut args {
            map.remove("confirm");
        }
        if handler.is_side_effecting() && self.permissions.requires_confirmation(tool_name) && !confirmed {
            return ToolResult::failure(
                ErrorCode::ConfirmationRequired,
                format!("tool `{tool_name}` requires confirmation; call it again with confirm=true"),
                None,
            );
        }

        // Step 5: argument schema validation. The handler receives
        // exactly the `args` passed into validation here; this pass only
        // rejects a structurally invalid call before it reaches the
        // handler at all.
        if let Err(err) = validate_args(&handler.schema(), &args) {
            return ToolResult::failure(ErrorCode::ValidationError, err.to_string(), None);
        }

        // Step 6: ExecutorContext construction.
        let sandbox = Sandbox::new(&self.permissions, self.base_dir.clone());
        let commands = CommandCapability::new(&self.permissions, &sandbox, &self.blacklist, &self.base_dir);
        let limits = self.permissions.limits();
        let fetch = FetchCapability::new(limits.fetch_timeout_ms, limits.max_read_size);
        let visible_tools = self
            .registry
            .list_filtered(&|name| self.is_permitted(name, agent));
        let ctx = ToolCtx {
            base_dir: self.base_dir.clone(),
            sandbox: &sandbox,
            commands: &commands,
            fetch: &fetch,
            permissions: &self.permissions,
            memory: &self.memory,
            tasks: &self.tasks,
            reminders: &self.reminders,
            now_unix,
            visible_tools,
        };

        // Step 7: handler invocation. A panic is caught (never allowed to
        // cross the executor boundary) and converted to EXEC_ERROR, same
        // as a timeout or a structurally-returned ToolError.
        let exec_future = handler.execute(args.clone(), &ctx);
        let exec_future = std::panic::AssertUnwindSafe(exec_future).catch_unwind();
        let soft_timeout = self.soft_timeout(tool_name);

        let (tool_result, error_code) = match tokio::time::timeout(soft_timeout, exec_future).await {
            Err(_elapsed) => (
                ToolResult::failure(
                    ErrorCode::Timeout,
                    format!("tool `{tool_name}` exceeded its soft wall-clock limit"),
                    None,
                ),
                Some(ErrorCode::Timeout),
            ),
            Ok(Err(panic_payload)) => {
                let message = panic_payload_to_string(&panic_payload);
                (
                    ToolResult::failure(ErrorCode::ExecError, format!("tool panicked: {message}"), None),
                    Some(ErrorCode::ExecError),
                )
            }
            Ok(Ok(Ok(value))) => (ToolResult::success(value), None),
            Ok(Ok(Err(tool_error))) => {
                let code = tool_error.code();
                (ToolResult::failure(code, tool_error.to_string(), None), Some(code))
            }
        };

        // Step 8: audit. Best-effort; a logging failure never fails the
        // request (AuditLog::record already swallows its own errors).
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let record = AuditRecord {
            ts: now_unix,
            tool: tool_name.to_string(),
            args: sanitize_args_for_audit(&args),
            ok: tool_result.is_ok(),
            error_code,
            duration_ms,
            agent_name: agent.map(|a| a.name.clone()),
        };
        self.audit.record(&record).await;

        // Step 9.
        tool_result
    }
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use ward_types::{Limits, PermissionsDocument};

    fn permissions_for(dir: &Path, commands: &[&str], deny: &[&str], confirm: &[&str]) -> Permissions {
        let doc = PermissionsDocument {
            version: 1,
            allow_paths: vec!["./".to_string()],
            allow_commands: commands.iter().map(|s| s.to_string()).collect(),
            require_confirmation_for: confirm.iter().map(|s| s.to_string()).collect(),
            deny_tools: deny.iter().map(|s| s.to_string()).collect(),
            limits: Limits::default(),
            allow_read_env: false,
        };
        Permissions::from_document(doc, dir).unwrap()
    }

    fn executor_in(dir: &Path, permissions: Permissions) -> Executor {
        let mut registry = ToolRegistry::new();
        ward_tools::register_builtins(&mut registry);
        Executor::open(dir.to_path_buf(), dir, permissions, registry).unwrap()
    }

    #[tokio::test]
    async fn denylist_blocks_regardless_of_agent() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = permissions_for(dir.path(), &[], &["get_time"], &[]);
        let executor = executor_in(dir.path(), permissions);
        let agent = Agent::system();
        let result = executor.execute(Some(&agent), "get_time", serde_json::json!({}), 1000).await;
        assert_eq!(result.error_code(), Some(ErrorCode::DeniedToolBlocklist));
    }

    #[tokio::test]
    async fn no_agent_can_only_call_safe_tools() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = permissions_for(dir.path(), &[], &[], &[]);
        let executor = executor_in(dir.path(), permissions);

        let denied = executor.execute(None, "write_file", serde_json::json!({"path": "a", "content": "b"}), 1000).await;
        assert_eq!(denied.error_code(), Some(ErrorCode::DeniedAgentToolset));

        let allowed = executor.execute(None, "get_time", serde_json::json!({}), 1000).await;
        assert!(allowed.is_ok());
    }

    #[tokio::test]
    async fn unknown_tool_carries_suggestions() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = permissions_for(dir.path(), &[], &[], &[]);
        let executor = executor_in(dir.path(), permissions);
        let agent = Agent::system();
        let result = executor.execute(Some(&agent), "does_not_exist", serde_json::json!({}), 1000).await;
        assert_eq!(result.error_code(), Some(ErrorCode::UnknownTool));
        let details = result.error.unwrap().details.unwrap();
        assert!(details["suggestions"].as_array().unwrap().len() > 0);
    }

    #[tokio::test]
    async fn confirmation_gate_blocks_then_allows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
        let permissions = permissions_for(dir.path(), &[], &[], &["write_file"]);
        let executor = executor_in(dir.path(), permissions);
        let mut tools = HashSet::new();
        tools.insert("write_file".to_string());
        let agent = Agent::user("tester", tools);

        let args = serde_json::json!({"path": "notes.txt", "content": "updated"});
        let blocked = executor.execute(Some(&agent), "write_file", args.clone(), 1000).await;
        assert_eq!(blocked.error_code(), Some(ErrorCode::ConfirmationRequired));

        let mut confirmed_args = args;
        confirmed_args["confirm"] = serde_json::json!(true);
        let allowed = executor.execute(Some(&agent), "write_file", confirmed_args, 1000).await;
        assert!(allowed.is_ok());
        assert_eq!(std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "updated");
    }

    #[tokio::test]
    async fn confirmation_requirement_is_a_no_op_for_non_side_effecting_tools() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = permissions_for(dir.path(), &[], &[], &["get_time"]);
        let executor = executor_in(dir.path(), permissions);
        let agent = Agent::system();
        let result = executor.execute(Some(&agent), "get_time", serde_json::json!({}), 1000).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn validation_error_on_missing_required_field() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = permissions_for(dir.path(), &[], &[], &[]);
        let executor = executor_in(dir.path(), permissions);
        let agent = Agent::system();
        let result = executor.execute(Some(&agent), "remember", serde_json::json!({}), 1000).await;
        assert_eq!(result.error_code(), Some(ErrorCode::ValidationError));
    }

    #[tokio::test]
    async fn successful_execution_is_audited() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = permissions_for(dir.path(), &[], &[], &[]);
        let executor = executor_in(dir.path(), permissions);
        let agent = Agent::system();
        let result = executor
            .execute(Some(&agent), "remember", serde_json::json!({"text": "buy milk"}), 1000)
            .await;
        assert!(result.is_ok());

        let audit_path = dir.path().join("audit.jsonl");
        let contents = std::fs::read_to_string(audit_path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("\"tool\":\"remember\""));
    }

    #[test]
    fn soft_timeout_uses_fetch_limit_for_read_url() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = permissions_for(dir.path(), &[], &[], &[]);
        let executor = executor_in(dir.path(), permissions);
        let expected = Duration::from_millis(executor.permissions().limits().fetch_timeout_ms) + LONG_RUNNING_HEADROOM;
        assert_eq!(executor.soft_timeout("read_url"), expected);
        assert!(executor.soft_timeout("read_url") > DEFAULT_SOFT_TIMEOUT);
        assert_eq!(executor.soft_timeout("get_time"), DEFAULT_SOFT_TIMEOUT);
    }

    #[tokio::test]
    async fn path_traversal_is_denied_before_handler_effects() {
        let dir = tempfile::tempdir().unwrap();
        let permissions = permissions_for(dir.path(), &[], &[], &[]);
        let executor = executor_in(dir.path(), permissions);
        let mut tools = HashSet::new();
        tools.insert("read_file".to_string());
        let agent = Agent::user("tester", tools);
        let result = executor
            .execute(Some(&agent), "read_file", serde_json::json!({"path": "../../etc/passwd"}), 1000)
            .await;
        assert_eq!(result.error_code(), Some(ErrorCode::DeniedPathTraversal));
    }
}
