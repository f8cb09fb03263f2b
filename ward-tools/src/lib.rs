//! Built-in tool handlers and the registry they populate (spec sections
//! 4.6, 4.11).

pub mod builtins;
pub mod ctx;
pub mod redaction;
pub mod registry;

use std::sync::Arc;

pub use ctx::ToolCtx;
pub use redaction::sanitize_args_for_audit;
pub use registry::{ToolDefinition, ToolError, ToolExecutor, ToolFut, ToolRegistry, validate_args};

/// Register every built-in tool named in spec section 4.11. Called once at
/// startup; plugins register afterward via `ToolRegistry::register_plugin`.
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(Arc::new(builtins::memory::RememberTool));
    registry.register(Arc::new(builtins::memory::RecallTool));

    registry.register(Arc::new(builtins::files::ReadFileTool));
    registry.register(Arc::new(builtins::files::WriteFileTool));
    registry.register(Arc::new(builtins::files::ListFilesTool));
    registry.register(Arc::new(builtins::files::DeleteFileTool));

    registry.register(Arc::new(builtins::web::ReadUrlTool));

    registry.register(Arc::new(builtins::tasks::TaskAddTool));
    registry.register(Arc::new(builtins::tasks::TaskListTool));
    registry.register(Arc::new(builtins::tasks::TaskDoneTool));

    registry.register(Arc::new(builtins::reminders::ReminderAddTool));

    registry.register(Arc::new(builtins::safe::GetTimeTool));
    registry.register(Arc::new(builtins::safe::CalculateTool));
    registry.register(Arc::new(builtins::safe::ListToolsTool));
    registry.register(Arc::new(builtins::safe::GetWeatherTool));

    registry.register(Arc::new(builtins::git::GitStatusTool));
    registry.register(Arc::new(builtins::git::GitDiffTool));
    registry.register(Arc::new(builtins::git::GitLogTool));

    registry.register(Arc::new(builtins::run_command::RunCommandTool));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_builtins_populates_every_named_tool() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        for expected in [
            "remember",
            "recall",
            "read_file",
            "write_file",
            "list_files",
            "delete_file",
            "read_url",
            "task_add",
            "task_list",
            "task_done",
            "reminder_add",
            "get_time",
            "calculate",
            "list_tools",
            "get_weather",
            "git_status",
            "git_diff",
            "git_log",
            "run_command",
        ] {
            assert!(names.contains(&expected.to_string()), "missing tool `{expected}`");
        }
    }
}
