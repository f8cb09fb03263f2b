//! `git_status`/`git_diff`/`git_log` — read-only git introspection,
//! trimmed to the three `GitToolKind` variants the router's regex table
//! names. Mutating git operations have no route and no allow-list entry.

use serde_json::{Value, json};

use crate::ctx::ToolCtx;
use crate::registry::{ToolError, ToolExecutor, ToolFut};

#[derive(Debug, Default)]
pub struct GitStatusTool;

impl ToolExecutor for GitStatusTool {
    fn name(&self) -> &'static str {
        "git_status"
    }

    fn description(&self) -> &'static str {
        "Show the working tree status."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "additionalProperties": false})
    }

    fn execute<'a>(&'a self, _args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let output = ctx
                .commands
                .run("git", &["--no-pager".to_string(), "status".to_string()])
                .await
                .map_err(ToolError::Command)?;
            Ok(json!({"stdout": output.stdout, "stderr": output.stderr}))
        })
    }
}

#[derive(Debug, Default)]
pub struct GitDiffTool;

impl ToolExecutor for GitDiffTool {
    fn name(&self) -> &'static str {
        "git_diff"
    }

    fn description(&self) -> &'static str {
        "Show unstaged changes against the index."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "additionalProperties": false})
    }

    fn execute<'a>(&'a self, _args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let output = ctx
                .commands
                .run("git", &["--no-pager".to_string(), "diff".to_string()])
                .await
                .map_err(ToolError::Command)?;
            Ok(json!({"stdout": output.stdout, "stderr": output.stderr}))
        })
    }
}

#[derive(Debug, Default)]
pub struct GitLogTool;

impl ToolExecutor for GitLogTool {
    fn name(&self) -> &'static str {
        "git_log"
    }

    fn description(&self) -> &'static str {
        "Show recent commit history, one line per commit."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "additionalProperties": false})
    }

    fn execute<'a>(&'a self, _args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let output = ctx
                .commands
                .run(
                    "git",
                    &["--no-pager".to_string(), "log".to_string(), "--oneline".to_string()],
                )
                .await
                .map_err(ToolError::Command)?;
            Ok(json!({"stdout": output.stdout, "stderr": output.stderr}))
        })
    }
}
