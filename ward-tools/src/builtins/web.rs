//! `read_url` — the only built-in tool that reaches the network, routed
//! entirely through `ctx.fetch` (spec section 4.9 regex stage, section 6
//! `limits.fetchTimeoutMs`).

use serde::Deserialize;
use serde_json::{Value, json};

use crate::ctx::ToolCtx;
use crate::registry::{ToolError, ToolExecutor, ToolFut};

#[derive(Debug, Default)]
pub struct ReadUrlTool;

#[derive(Debug, Deserialize)]
struct ReadUrlArgs {
    url: String,
}

impl ToolExecutor for ReadUrlTool {
    fn name(&self) -> &'static str {
        "read_url"
    }

    fn description(&self) -> &'static str {
        "Fetch an http(s) URL and return its body, status, and content type."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"url": {"type": "string", "minLength": 1}},
            "required": ["url"],
            "additionalProperties": false
        })
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: ReadUrlArgs =
                serde_json::from_value(args).map_err(|e| ToolError::BadArgs { message: e.to_string() })?;

            let out = ctx.fetch.get(&typed.url).await?;

            Ok(json!({
                "status": out.status,
                "contentType": out.content_type,
                "body": out.body,
                "truncated": out.truncated,
            }))
        })
    }
}
