//! Shared data-model types for the command-assistant trust-and-execution
//! pipeline: agents, route results, tool results, error codes, the
//! permissions document, and the entities persisted to JSONL.
//!
//! This crate has no I/O of its own; it exists so `ward-permissions`,
//! `ward-tools`, `ward-router`, and `ward-executor` share one definition of
//! each wire type instead of redefining them at every boundary.

mod agent;
mod entities;
mod error_code;
mod ids;
mod limits;
mod permissions_doc;
mod route_result;
mod tool_result;

pub use agent::{Agent, AgentKind, SAFE_TOOLS, is_safe_tool};
pub use entities::{AuditRecord, CommandLogEntry, CommandOutcome, MemoryEntry, Reminder, Task, TaskStatus};
pub use error_code::ErrorCode;
pub use ids::{MemoryId, ReminderId, TaskId};
pub use limits::Limits;
pub use permissions_doc::PermissionsDocument;
pub use route_result::{RouteResult, ToolCallPayload, route_path};
pub use tool_result::{ToolErrorPayload, ToolResult};

/// Upper bound on utterance length enforced at the router boundary
/// (spec section 3) before any further processing. The permissions
/// document's `limits.max_input_length` may lower this per-deployment;
/// this constant is the hard ceiling applied before permissions are even
/// consulted.
pub const HARD_MAX_INPUT_LENGTH: usize = 65_536;
