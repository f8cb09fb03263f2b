//! `ToolResult`: the single channel every tool invocation returns through
//! (spec section 3). No exception-based control flow crosses this boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error_code::ErrorCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Tagged union `{ok: true, result, debug?} | {ok: false, error, debug?}`.
///
/// Represented as a flat struct rather than an enum so the `ok` discriminant
/// and optional sibling fields serialize exactly as the wire contract
/// describes; the invariant "exactly one of result/error is present" is
/// upheld by the constructors, never by hand-assembling this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolErrorPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

impl ToolResult {
    #[must_use]
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            debug: None,
        }
    }

    #[must_use]
    pub fn failure(code: ErrorCode, message: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(ToolErrorPayload {
                code,
                message: message.into(),
                details,
            }),
            debug: None,
        }
    }

    #[must_use]
    pub fn with_debug(mut self, debug: Value) -> Self {
        self.debug = Some(debug);
        self
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}
