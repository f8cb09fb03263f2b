//! The exhaustive error-code list (spec section 6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    DeniedAgentToolset,
    DeniedToolBlocklist,
    DeniedPathAllowlist,
    DeniedPathTraversal,
    DeniedCommandAllowlist,
    DeniedCommandFlag,
    ConfirmationRequired,
    ValidationError,
    UnknownTool,
    Unrouted,
    Timeout,
    Signal,
    ExecError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DeniedAgentToolset => "DENIED_AGENT_TOOLSET",
            Self::DeniedToolBlocklist => "DENIED_TOOL_BLOCKLIST",
            Self::DeniedPathAllowlist => "DENIED_PATH_ALLOWLIST",
            Self::DeniedPathTraversal => "DENIED_PATH_TRAVERSAL",
            Self::DeniedCommandAllowlist => "DENIED_COMMAND_ALLOWLIST",
            Self::DeniedCommandFlag => "DENIED_COMMAND_FLAG",
            Self::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::UnknownTool => "UNKNOWN_TOOL",
            Self::Unrouted => "UNROUTED",
            Self::Timeout => "TIMEOUT",
            Self::Signal => "SIGNAL",
            Self::ExecError => "EXEC_ERROR",
        };
        f.write_str(s)
    }
}
