//! Stage L: the LLM fallback (spec section 4.9). Only reached when stages
//! R and H both decline. This crate depends on the provider only through
//! the abstract `LlmProvider` trait — the HTTP transport, streaming,
//! caching, and retry machinery named out of scope in spec.md section 1
//! live elsewhere (grounded in shape on the host project's
//! `ApiConfig`/`send_message` split, without its transport).

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::timeout;
use ward_tools::{ToolDefinition, ToolRegistry};
use ward_types::{Agent, ErrorCode, RouteResult, route_path};

/// One turn of truncated recent history handed to the provider alongside
/// the current utterance.
#[derive(Debug, Clone)]
pub struct HistoryTurn {
    pub role: HistoryRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub history: Vec<HistoryTurn>,
    pub user: String,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone)]
pub struct ProposedToolCall {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: Option<String>,
    pub tool_call: Option<ProposedToolCall>,
    pub model: String,
    pub tokens: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no provider is configured")]
    Unavailable,
    #[error("provider request failed: {0}")]
    Other(String),
}

pub type CompletionFut<'a> = Pin<Box<dyn Future<Output = Result<CompletionResponse, ProviderError>> + Send + 'a>>;

/// The one interface this crate consumes the LLM provider through. The
/// HTTP client, streaming, response caching, and retry behind a concrete
/// implementation are out of scope per spec.md section 1; this crate only
/// ever calls `complete`.
pub trait LlmProvider: Send + Sync {
    fn complete<'a>(&'a self, request: CompletionRequest) -> CompletionFut<'a>;
}

/// Bounded FIFO cache of `(agent name, registry revision) -> filtered tool
/// list`, so the LLM tool-use payload isn't rebuilt from scratch on every
/// fallback call (spec section 4.9, design note).
pub struct ToolFilterCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    order: VecDeque<(String, u64)>,
    entries: std::collections::HashMap<(String, u64), Vec<ToolDefinition>>,
}

const DEFAULT_CAPACITY: usize = 50;

impl ToolFilterCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Return the filtered tool list for `(agent_key, revision)`, computing
    /// and caching it via `compute` on a miss.
    async fn get_or_insert(
        &self,
        agent_key: &str,
        revision: u64,
        compute: impl FnOnce() -> Vec<ToolDefinition>,
    ) -> Vec<ToolDefinition> {
        let key = (agent_key.to_string(), revision);
        let mut state = self.state.lock().await;
        if let Some(hit) = state.entries.get(&key) {
            return hit.clone();
        }

        let value = compute();
        if state.entries.len() >= self.capacity
            && let Some(oldest) = state.order.pop_front()
        {
            state.entries.remove(&oldest);
        }
        state.order.push_back(key.clone());
        state.entries.insert(key, value.clone());
        value
    }
}

impl Default for ToolFilterCache {
    fn default() -> Self {
        Self::new()
    }
}

fn agent_cache_key(agent: Option<&Agent>) -> String {
    agent.map_or_else(|| "__anon__".to_string(), |a| a.name.clone())
}

fn is_permitted(tool_name: &str, agent: Option<&Agent>) -> bool {
    match agent {
        Some(agent) => agent.may_call(tool_name) || ward_types::is_safe_tool(tool_name),
        None => ward_types::is_safe_tool(tool_name),
    }
}

/// Stage L. Reached only when stages R and H both declined. Returns
/// `mode: error, code: UNROUTED` if `provider` is `None`; otherwise calls
/// the provider with a system prompt, truncated history, the user input,
/// and the tool-use payload filtered to the calling agent's allow-list —
/// the same filter the executor will apply when the call comes back, so
/// the model is never tempted with a tool it cannot actually invoke.
pub async fn try_route(
    input: &str,
    history: &[HistoryTurn],
    agent: Option<&Agent>,
    registry: &ToolRegistry,
    provider: Option<&dyn LlmProvider>,
    cache: &ToolFilterCache,
    deadline: std::time::Duration,
) -> RouteResult {
    let Some(provider) = provider else {
        return RouteResult::error(ErrorCode::Unrouted, "no LLM provider is configured");
    };

    let agent_key = agent_cache_key(agent);
    let revision = registry.revision();
    let tools = cache
        .get_or_insert(&agent_key, revision, || {
            registry.list_filtered(&|name| is_permitted(name, agent))
        })
        .await;

    let request = CompletionRequest {
        system: system_prompt(),
        history: history.to_vec(),
        user: input.to_string(),
        tools,
    };

    let response = match timeout(deadline, provider.complete(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(_provider_error)) => {
            return RouteResult::error(ErrorCode::Unrouted, "LLM provider request failed");
        }
        Err(_elapsed) => {
            return RouteResult::error(ErrorCode::Unrouted, "LLM provider request timed out");
        }
    };

    if let Some(proposed) = response.tool_call {
        if !registry.contains(&proposed.name) {
            return RouteResult::error(
                ErrorCode::Unrouted,
                format!("LLM proposed unknown tool `{}`", proposed.name),
            );
        }
        if !is_permitted(&proposed.name, agent) {
            return RouteResult::error(
                ErrorCode::Unrouted,
                format!("LLM proposed tool `{}` outside the agent's allow-list", proposed.name),
            );
        }
        return RouteResult::tool_call_from_llm(proposed.name, proposed.args, response.model);
    }

    RouteResult::Reply {
        text: response.text.unwrap_or_default(),
        model: Some(response.model),
        path: route_path::LLM_FALLBACK.to_string(),
    }
}

fn system_prompt() -> String {
    "You are a local command assistant. Only call a tool listed in the provided tool-use \
     payload; reply in plain text for anything else."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubProvider {
        response: CompletionResponse,
    }

    impl LlmProvider for StubProvider {
        fn complete<'a>(&'a self, _request: CompletionRequest) -> CompletionFut<'a> {
            let response = self.response.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    fn system_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        ward_tools::register_builtins(&mut registry);
        registry
    }

    #[tokio::test]
    async fn no_provider_is_unrouted() {
        let registry = system_registry();
        let cache = ToolFilterCache::new();
        let result = try_route(
            "do something obscure",
            &[],
            None,
            &registry,
            None,
            &cache,
            std::time::Duration::from_secs(1),
        )
        .await;
        match result {
            RouteResult::Error { code, .. } => assert_eq!(code, ErrorCode::Unrouted),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn proposed_tool_outside_allowlist_is_unrouted() {
        let registry = system_registry();
        let agent = Agent::user("limited", std::collections::HashSet::new());
        let provider = StubProvider {
            response: CompletionResponse {
                text: None,
                tool_call: Some(ProposedToolCall {
                    name: "write_file".to_string(),
                    args: json!({"path": "x", "content": "y"}),
                }),
                model: "test-model".to_string(),
                tokens: Some(10),
            },
        };
        let cache = ToolFilterCache::new();
        let result = try_route(
            "please write a file",
            &[],
            Some(&agent),
            &registry,
            Some(&provider),
            &cache,
            std::time::Duration::from_secs(1),
        )
        .await;
        match result {
            RouteResult::Error { code, .. } => assert_eq!(code, ErrorCode::Unrouted),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn permitted_tool_call_is_emitted() {
        let registry = system_registry();
        let agent = Agent::system();
        let provider = StubProvider {
            response: CompletionResponse {
                text: None,
                tool_call: Some(ProposedToolCall {
                    name: "get_time".to_string(),
                    args: json!({}),
                }),
                model: "test-model".to_string(),
                tokens: Some(5),
            },
        };
        let cache = ToolFilterCache::new();
        let result = try_route(
            "what time is it right now, precisely",
            &[],
            Some(&agent),
            &registry,
            Some(&provider),
            &cache,
            std::time::Duration::from_secs(1),
        )
        .await;
        match result {
            RouteResult::ToolCall { tool, path, model } => {
                assert_eq!(tool.name, "get_time");
                assert_eq!(path, route_path::LLM_FALLBACK);
                assert_eq!(model.as_deref(), Some("test-model"));
            }
            other => panic!("expected tool_call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_without_tool_call_is_emitted() {
        let registry = system_registry();
        let provider = StubProvider {
            response: CompletionResponse {
                text: Some("here's an answer".to_string()),
                tool_call: None,
                model: "test-model".to_string(),
                tokens: Some(3),
            },
        };
        let cache = ToolFilterCache::new();
        let result = try_route(
            "what's the capital of france",
            &[],
            None,
            &registry,
            Some(&provider),
            &cache,
            std::time::Duration::from_secs(1),
        )
        .await;
        match result {
            RouteResult::Reply { text, .. } => assert_eq!(text, "here's an answer"),
            other => panic!("expected reply, got {other:?}"),
        }
    }
}
