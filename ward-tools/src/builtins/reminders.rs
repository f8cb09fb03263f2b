//! `reminder_add` — `Reminder` JSONL store front end (spec section 4.11).

use serde::Deserialize;
use serde_json::{Value, json};

use crate::ctx::ToolCtx;
use crate::registry::{ToolError, ToolExecutor, ToolFut};

#[derive(Debug, Default)]
pub struct ReminderAddTool;

#[derive(Debug, Deserialize)]
struct ReminderAddArgs {
    text: String,
    due_ts: i64,
}

impl ToolExecutor for ReminderAddTool {
    fn name(&self) -> &'static str {
        "reminder_add"
    }

    fn description(&self) -> &'static str {
        "Add a reminder due at a future unix timestamp."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "minLength": 1},
                "due_ts": {"type": "integer"}
            },
            "required": ["text", "due_ts"],
            "additionalProperties": false
        })
    }

    fn is_side_effecting(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: ReminderAddArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;

            if typed.due_ts <= ctx.now_unix {
                return Err(ToolError::BadArgs {
                    message: "due_ts must be in the future".to_string(),
                });
            }

            let id = ctx.reminders.add(&typed.text, typed.due_ts, ctx.now_unix).await?;
            Ok(json!({"id": id.value()}))
        })
    }
}
