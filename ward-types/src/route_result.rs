//! `RouteResult`: what the router hands back for a classified utterance
//! (spec section 3, section 4.9).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_code::ErrorCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub name: String,
    pub args: Value,
}

/// Identifies which router stage produced the decision.
pub mod route_path {
    pub const REGEX_FAST_PATH: &str = "regex_fast_path";
    pub const HEURISTIC: &str = "heuristic";
    pub const LLM_FALLBACK: &str = "llm_fallback";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RouteResult {
    ToolCall {
        tool: ToolCallPayload,
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    Reply {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        path: String,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl RouteResult {
    #[must_use]
    pub fn tool_call(name: impl Into<String>, args: Value, path: &str) -> Self {
        Self::ToolCall {
            tool: ToolCallPayload {
                name: name.into(),
                args,
            },
            path: path.to_string(),
            model: None,
        }
    }

    #[must_use]
    pub fn tool_call_from_llm(name: impl Into<String>, args: Value, model: impl Into<String>) -> Self {
        Self::ToolCall {
            tool: ToolCallPayload {
                name: name.into(),
                args,
            },
            path: route_path::LLM_FALLBACK.to_string(),
            model: Some(model.into()),
        }
    }

    #[must_use]
    pub fn reply(text: impl Into<String>, path: &str) -> Self {
        Self::Reply {
            text: text.into(),
            model: None,
            path: path.to_string(),
        }
    }

    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}
