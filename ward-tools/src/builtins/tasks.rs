//! `task_add`/`task_list`/`task_done` — `Task` JSONL store front ends,
//! parsed by the router's heuristic stage.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::ctx::ToolCtx;
use crate::registry::{ToolError, ToolExecutor, ToolFut};

#[derive(Debug, Default)]
pub struct TaskAddTool;

#[derive(Debug, Deserialize)]
struct TaskAddArgs {
    text: String,
}

impl ToolExecutor for TaskAddTool {
    fn name(&self) -> &'static str {
        "task_add"
    }

    fn description(&self) -> &'static str {
        "Add an open task."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"text": {"type": "string", "minLength": 1}},
            "required": ["text"],
            "additionalProperties": false
        })
    }

    fn is_side_effecting(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: TaskAddArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;
            let id = ctx.tasks.add(&typed.text, ctx.now_unix).await?;
            Ok(json!({"id": id.value()}))
        })
    }
}

#[derive(Debug, Default)]
pub struct TaskListTool;

#[derive(Debug, Deserialize, Default)]
struct TaskListArgs {
    #[serde(default)]
    include_done: bool,
}

impl ToolExecutor for TaskListTool {
    fn name(&self) -> &'static str {
        "task_list"
    }

    fn description(&self) -> &'static str {
        "List tasks, open tasks only unless include_done is set."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"include_done": {"type": "boolean"}},
            "additionalProperties": false
        })
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: TaskListArgs = if args.is_null() {
                TaskListArgs::default()
            } else {
                serde_json::from_value(args).map_err(|e| ToolError::BadArgs { message: e.to_string() })?
            };
            let tasks = ctx.tasks.list(typed.include_done).await;
            Ok(serde_json::to_value(tasks).expect("tasks serialize"))
        })
    }
}

#[derive(Debug, Default)]
pub struct TaskDoneTool;

#[derive(Debug, Deserialize)]
struct TaskDoneArgs {
    id: u64,
}

impl ToolExecutor for TaskDoneTool {
    fn name(&self) -> &'static str {
        "task_done"
    }

    fn description(&self) -> &'static str {
        "Mark a task done by id."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"id": {"type": "integer", "minimum": 1}},
            "required": ["id"],
            "additionalProperties": false
        })
    }

    fn is_side_effecting(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: TaskDoneArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;
            let id = ward_types::TaskId::new(typed.id);
            let found = ctx.tasks.mark_done(id, ctx.now_unix).await?;
            if !found {
                return Err(ToolError::ExecutionFailed {
                    tool: "task_done".to_string(),
                    message: format!("no task with id {}", typed.id),
                });
            }
            Ok(json!({"id": typed.id, "status": "done"}))
        })
    }
}
