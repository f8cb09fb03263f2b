//! The tool registry (spec section 4.6) and the handler contract every
//! tool must satisfy (spec section 4.11).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use ward_types::ErrorCode;

use crate::ctx::ToolCtx;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("bad arguments: {message}")]
    BadArgs { message: String },
    #[error("{tool}: {message}")]
    ExecutionFailed { tool: String, message: String },
    #[error(transparent)]
    Sandbox(#[from] ward_permissions::SandboxError),
    #[error(transparent)]
    Command(#[from] ward_permissions::CommandError),
    #[error(transparent)]
    Fetch(#[from] ward_permissions::FetchError),
    #[error(transparent)]
    Store(#[from] ward_storage::JsonlError),
}

impl ToolError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BadArgs { .. } => ErrorCode::ValidationError,
            Self::ExecutionFailed { .. } | Self::Store(_) => ErrorCode::ExecError,
            Self::Sandbox(e) => e.code(),
            Self::Command(e) => e.code(),
            Self::Fetch(e) => e.code(),
        }
    }
}

pub type ToolFut<'a> = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>>;

/// The contract every built-in or plugin tool satisfies (spec section
/// 4.11): handlers receive validated arguments, reach the filesystem and
/// process table only through `ctx`'s capabilities, and return a plain
/// JSON result or a `ToolError` — never panic across this boundary.
/// (The executor, not the handler, is what turns this into the public
/// `ToolResult` tagged union.)
pub trait ToolExecutor: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> Value;

    /// Whether this tool can mutate state outside `ctx` (the filesystem, a
    /// store, a subprocess). Side-effect-free tools never need a
    /// confirmation gate regardless of the permissions document.
    fn is_side_effecting(&self) -> bool {
        false
    }

    fn execute<'a>(&'a self, args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a>;
}

struct ToolEntry {
    schema: Value,
    description: &'static str,
    handler: Arc<dyn ToolExecutor>,
}

/// `toolName -> {schema, handler}`, plus a stable-ordered snapshot for
/// external consumers (router, LLM tool-use payload).
#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    entries: HashMap<String, ToolEntry>,
    /// Bumped on every mutation; the router's tool-filter cache is keyed
    /// on this so it never serves a stale filtered view.
    revision: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built-in tool. Idempotent by name: re-registering the
    /// same name overwrites the previous entry (last registration wins).
    pub fn register(&mut self, handler: Arc<dyn ToolExecutor>) {
        let name = handler.name().to_string();
        let entry = ToolEntry {
            schema: handler.schema(),
            description: handler.description(),
            handler,
        };
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, entry);
        self.revision += 1;
    }

    /// Register a plugin-supplied tool. Unlike `register`, this rejects an
    /// attempt to take a name that is already registered: plugins may only
    /// add, never overwrite a built-in or another plugin's tool.
    pub fn register_plugin(&mut self, handler: Arc<dyn ToolExecutor>) -> Result<(), ToolError> {
        let name = handler.name().to_string();
        if self.entries.contains_key(&name) {
            return Err(ToolError::BadArgs {
                message: format!("tool `{name}` is already registered"),
            });
        }
        self.register(handler);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.entries.get(name).map(|e| Arc::clone(&e.handler))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Stable-ordered snapshot of every registered tool's definition.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| ToolDefinition {
                name: entry.handler.name().to_string(),
                description: entry.description.to_string(),
                schema: entry.schema.clone(),
            })
            .collect()
    }

    /// `list()` filtered to names in `allowed`, preserving registry order.
    /// Used both by the router (building the LLM's tool-use payload) and
    /// by the `list_tools` built-in handler, so the two never diverge.
    #[must_use]
    pub fn list_filtered(&self, allowed: &dyn Fn(&str) -> bool) -> Vec<ToolDefinition> {
        self.list().into_iter().filter(|t| allowed(&t.name)).collect()
    }

    /// First few registered tool names, for `UNKNOWN_TOOL` suggestions.
    #[must_use]
    pub fn suggestions(&self, limit: usize) -> Vec<String> {
        self.order.iter().take(limit).cloned().collect()
    }
}

/// Validate `args` against a tool's JSON Schema.
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), ToolError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ToolError::BadArgs {
        message: format!("invalid tool schema: {e}"),
    })?;
    if let Err(err) = validator.validate(args) {
        return Err(ToolError::BadArgs {
            message: err.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::ToolCtx;

    struct Dummy;
    impl ToolExecutor for Dummy {
        fn name(&self) -> &'static str {
            "dummy"
        }
        fn description(&self) -> &'static str {
            "a dummy tool"
        }
        fn schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        fn execute<'a>(&'a self, _args: Value, _ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
            Box::pin(async { Ok(serde_json::json!({"ok": true})) })
        }
    }

    #[test]
    fn register_is_idempotent_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Dummy));
        registry.register(Arc::new(Dummy));
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn plugin_registration_rejects_existing_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Dummy));
        let err = registry.register_plugin(Arc::new(Dummy));
        assert!(err.is_err());
    }

    #[test]
    fn list_is_stable_ordered() {
        struct A;
        impl ToolExecutor for A {
            fn name(&self) -> &'static str {
                "a_tool"
            }
            fn description(&self) -> &'static str {
                "a"
            }
            fn schema(&self) -> Value {
                serde_json::json!({})
            }
            fn execute<'a>(&'a self, _args: Value, _ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
                Box::pin(async { Ok(Value::Null) })
            }
        }
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Dummy));
        registry.register(Arc::new(A));
        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["dummy".to_string(), "a_tool".to_string()]);
    }
}
