//! `run_command` — the command capability's `ls|pwd|cat|du` front end
//! (spec section 4.5, router pattern `(ls|pwd|cat|du)(\s+.*)?`).

use serde::Deserialize;
use serde_json::{Value, json};

use crate::ctx::ToolCtx;
use crate::registry::{ToolError, ToolExecutor, ToolFut};

#[derive(Debug, Default)]
pub struct RunCommandTool;

#[derive(Debug, Deserialize)]
struct RunCommandArgs {
    name: String,
    #[serde(default)]
    argv: Vec<String>,
}

impl ToolExecutor for RunCommandTool {
    fn name(&self) -> &'static str {
        "run_command"
    }

    fn description(&self) -> &'static str {
        "Run an allow-listed shell command with an argv array, never a shell string."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "enum": ["ls", "pwd", "cat", "du"]},
                "argv": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["name"],
            "additionalProperties": false
        })
    }

    fn is_side_effecting(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: RunCommandArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;
            let output = ctx.commands.run(&typed.name, &typed.argv).await.map_err(ToolError::Command)?;
            Ok(json!({
                "stdout": output.stdout,
                "stderr": output.stderr,
                "exit_code": output.exit_code
            }))
        })
    }
}
