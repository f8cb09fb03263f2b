//! The agent trust model (spec section 4.8).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// The hardcoded set of side-effect-free introspection tools available even
/// with no agent context (`agent = nil`).
pub const SAFE_TOOLS: &[&str] = &["calculate", "get_time", "get_weather", "list_tools"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Created only by the runtime itself. Implicit toolset = all registered
    /// tools, subject only to the global denylist.
    System,
    /// A named agent with an explicit tool allow-list.
    User,
    /// A named agent with an explicit tool allow-list, same trust boundary
    /// as `User` but surfaced separately for callers that distinguish
    /// interactive users from background workers.
    Worker,
}

/// A named trust principal holding a toolset and a kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub kind: AgentKind,
    pub tools: HashSet<String>,
    #[serde(default)]
    pub description: String,
}

impl Agent {
    /// Construct the implicit `SYSTEM` agent. Must only be called by the
    /// binary's composition root; never deserialized from untrusted input.
    #[must_use]
    pub fn system() -> Self {
        Self {
            name: "SYSTEM".to_string(),
            kind: AgentKind::System,
            tools: HashSet::new(),
            description: "implicit runtime agent with access to every registered tool"
                .to_string(),
        }
    }

    #[must_use]
    pub fn user(name: impl Into<String>, tools: HashSet<String>) -> Self {
        Self {
            name: name.into(),
            kind: AgentKind::User,
            tools,
            description: String::new(),
        }
    }

    /// Coerce a plugin-declared agent to `kind=user` regardless of what the
    /// plugin claimed. Plugins must never be able to forge `kind=system`.
    #[must_use]
    pub fn coerced_to_user(mut self) -> Self {
        if matches!(self.kind, AgentKind::System) {
            self.kind = AgentKind::User;
        }
        self
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self.kind, AgentKind::System)
    }

    /// Whether this agent may call `tool_name`, ignoring the global denylist
    /// (callers must check that separately).
    #[must_use]
    pub fn may_call(&self, tool_name: &str) -> bool {
        self.is_system() || self.tools.contains(tool_name)
    }
}

/// Whether `tool_name` is callable with no agent context at all.
#[must_use]
pub fn is_safe_tool(tool_name: &str) -> bool {
    SAFE_TOOLS.contains(&tool_name)
}
