//! `read_file`/`write_file`/`list_files` — path-capability-routed file I/O
//! (spec section 4.11).

use serde::Deserialize;
use serde_json::{Value, json};
use ward_permissions::PathMode;

use crate::ctx::ToolCtx;
use crate::registry::{ToolError, ToolExecutor, ToolFut};

#[derive(Debug, Default)]
pub struct ReadFileTool;

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    path: String,
}

impl ToolExecutor for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a file's contents within the allowed filesystem region."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"path": {"type": "string", "minLength": 1}},
            "required": ["path"],
            "additionalProperties": false
        })
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: ReadFileArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;

            let resolved = ctx.sandbox.resolve_allowed(&typed.path, PathMode::Read)?;
            let bytes = tokio::fs::read(&resolved).await.map_err(|e| ToolError::ExecutionFailed {
                tool: "read_file".to_string(),
                message: format!("failed to read file: {e}"),
            })?;

            let max = ctx.limits().max_read_size;
            let truncated = bytes.len() > max;
            let slice = if truncated { &bytes[..max] } else { &bytes[..] };
            let content = String::from_utf8_lossy(slice).into_owned();

            Ok(json!({"content": content, "truncated": truncated}))
        })
    }
}

#[derive(Debug, Default)]
pub struct WriteFileTool;

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

impl ToolExecutor for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write content to a file within the allowed filesystem region, creating directories as needed."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "minLength": 1},
                "content": {"type": "string"}
            },
            "required": ["path", "content"],
            "additionalProperties": false
        })
    }

    fn is_side_effecting(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: WriteFileArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;

            // Destructive writes re-check mode=write, never reuse a
            // mode=read resolution.
            let resolved = ctx.sandbox.resolve_for_create(&typed.path)?;

            if let Some(parent) = resolved.parent()
                && !parent.exists()
            {
                tokio::fs::create_dir_all(parent).await.map_err(|e| ToolError::ExecutionFailed {
                    tool: "write_file".to_string(),
                    message: format!("failed to create parent directories: {e}"),
                })?;
                ctx.sandbox.validate_created_parent(&resolved)?;
            }

            let byte_len = typed.content.len();
            let write_path = resolved.clone();
            let bytes = typed.content.into_bytes();
            tokio::task::spawn_blocking(move || ward_storage::atomic_write(&write_path, &bytes))
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool: "write_file".to_string(),
                    message: format!("write task panicked: {e}"),
                })?
                .map_err(|e| ToolError::ExecutionFailed {
                    tool: "write_file".to_string(),
                    message: format!("failed to write file: {e}"),
                })?;

            Ok(json!({"path": display_path(ctx, &resolved), "bytes": byte_len}))
        })
    }
}

#[derive(Debug, Default)]
pub struct ListFilesTool;

#[derive(Debug, Deserialize)]
struct ListFilesArgs {
    #[serde(default = "default_dot")]
    path: String,
}

fn default_dot() -> String {
    ".".to_string()
}

impl ToolExecutor for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn description(&self) -> &'static str {
        "List the entries of a directory within the allowed filesystem region."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"path": {"type": "string"}},
            "additionalProperties": false
        })
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: ListFilesArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;

            let resolved = ctx.sandbox.resolve_allowed(&typed.path, PathMode::Read)?;
            let mut entries = tokio::fs::read_dir(&resolved).await.map_err(|e| ToolError::ExecutionFailed {
                tool: "list_files".to_string(),
                message: format!("failed to list directory: {e}"),
            })?;

            let mut names = Vec::new();
            while let Some(entry) = entries.next_entry().await.map_err(|e| ToolError::ExecutionFailed {
                tool: "list_files".to_string(),
                message: format!("failed to read directory entry: {e}"),
            })? {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();

            Ok(json!({"entries": names}))
        })
    }
}

#[derive(Debug, Default)]
pub struct DeleteFileTool;

#[derive(Debug, Deserialize)]
struct DeleteFileArgs {
    path: String,
}

impl ToolExecutor for DeleteFileTool {
    fn name(&self) -> &'static str {
        "delete_file"
    }

    fn description(&self) -> &'static str {
        "Delete a file within the allowed filesystem region."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"path": {"type": "string", "minLength": 1}},
            "required": ["path"],
            "additionalProperties": false
        })
    }

    fn is_side_effecting(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: DeleteFileArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;

            // Destructive ops re-check mode=write, never reuse a mode=read
            // resolution (spec section 4.11, step 6).
            let resolved = ctx.sandbox.resolve_allowed(&typed.path, PathMode::Write)?;

            tokio::fs::remove_file(&resolved).await.map_err(|e| ToolError::ExecutionFailed {
                tool: "delete_file".to_string(),
                message: format!("failed to delete file: {e}"),
            })?;

            Ok(json!({"path": display_path(ctx, &resolved)}))
        })
    }
}

/// Error messages and results must not leak host paths beyond the base
/// directory (spec section 4.11, step 4); display paths relative to it.
fn display_path(ctx: &ToolCtx<'_>, resolved: &std::path::Path) -> String {
    resolved
        .strip_prefix(ctx.base_dir())
        .map(|rel| rel.to_string_lossy().into_owned())
        .unwrap_or_else(|_| resolved.to_string_lossy().into_owned())
}
