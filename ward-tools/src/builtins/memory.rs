//! `remember`/`recall` — memory store front ends (spec section 4.2).

use serde::Deserialize;
use serde_json::{Value, json};

use crate::ctx::ToolCtx;
use crate::registry::{ToolError, ToolExecutor, ToolFut};

#[derive(Debug, Default)]
pub struct RememberTool;

#[derive(Debug, Deserialize)]
struct RememberArgs {
    text: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl ToolExecutor for RememberTool {
    fn name(&self) -> &'static str {
        "remember"
    }

    fn description(&self) -> &'static str {
        "Store a free-text note for later recall."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "minLength": 1},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["text"],
            "additionalProperties": false
        })
    }

    fn is_side_effecting(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: RememberArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;
            let id = ctx.memory.remember(&typed.text, typed.tags, ctx.now_unix).await?;
            Ok(json!({"id": id.value()}))
        })
    }
}

#[derive(Debug, Default)]
pub struct RecallTool;

#[derive(Debug, Deserialize)]
struct RecallArgs {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

const fn default_limit() -> usize {
    5
}

impl ToolExecutor for RecallTool {
    fn name(&self) -> &'static str {
        "recall"
    }

    fn description(&self) -> &'static str {
        "Retrieve the most relevant remembered notes for a query."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "minLength": 1},
                "limit": {"type": "integer", "minimum": 1, "maximum": 100}
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: RecallArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;
            let entries = ctx.memory.recall(&typed.query, typed.limit, ctx.now_unix).await;
            Ok(serde_json::to_value(entries).expect("memory entries serialize"))
        })
    }
}
