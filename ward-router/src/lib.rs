//! The router (spec section 4.9): classifies an utterance into a
//! `RouteResult` via a regex fast path, heuristic parsers, and an LLM
//! fallback, strictly in that order on a single thread — the first stage
//! to produce a decision wins.

pub mod heuristic_stage;
pub mod llm_fallback;
pub mod regex_stage;

use ward_tools::ToolRegistry;
use ward_types::{Agent, ErrorCode, Limits, RouteResult};

pub use llm_fallback::{
    CompletionFut, CompletionRequest, CompletionResponse, HistoryRole, HistoryTurn, LlmProvider,
    ProposedToolCall, ProviderError, ToolFilterCache,
};

/// `route(utterance, agent, registry, provider, cache, limits)`: the
/// stage-R / stage-H / stage-L pipeline (spec section 4.9). Utterance
/// length is checked first against `limits.max_input_length` (the
/// permissions document's configurable bound) and the crate's hard
/// ceiling, whichever is lower — an oversized utterance never reaches any
/// stage.
#[allow(clippy::too_many_arguments)]
pub async fn route(
    input: &str,
    history: &[HistoryTurn],
    agent: Option<&Agent>,
    registry: &ToolRegistry,
    provider: Option<&dyn LlmProvider>,
    cache: &ToolFilterCache,
    limits: &Limits,
) -> RouteResult {
    let max_len = limits.max_input_length.min(ward_types::HARD_MAX_INPUT_LENGTH);
    if input.len() > max_len {
        return RouteResult::error(
            ErrorCode::ValidationError,
            format!("utterance exceeds max_input_length ({max_len} bytes)"),
        );
    }

    if let Some(result) = regex_stage::try_route(input, agent, registry) {
        return result;
    }

    if let Some(result) = heuristic_stage::try_route(input, agent, registry) {
        return result;
    }

    let deadline = std::time::Duration::from_millis(limits.fetch_timeout_ms);
    llm_fallback::try_route(input, history, agent, registry, provider, cache, deadline).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        ward_tools::register_builtins(&mut registry);
        registry
    }

    #[tokio::test]
    async fn regex_stage_short_circuits_before_llm() {
        let registry = system_registry();
        let agent = Agent::system();
        let cache = ToolFilterCache::new();
        let result = route(
            "remember: buy milk",
            &[],
            Some(&agent),
            &registry,
            None,
            &cache,
            &Limits::default(),
        )
        .await;
        match result {
            RouteResult::ToolCall { tool, path, .. } => {
                assert_eq!(tool.name, "remember");
                assert_eq!(path, ward_types::route_path::REGEX_FAST_PATH);
            }
            other => panic!("expected tool_call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_input_is_rejected_before_any_stage() {
        let registry = system_registry();
        let cache = ToolFilterCache::new();
        let limits = Limits {
            max_input_length: 10,
            ..Limits::default()
        };
        let result = route(
            "this utterance is definitely longer than ten bytes",
            &[],
            None,
            &registry,
            None,
            &cache,
            &limits,
        )
        .await;
        match result {
            RouteResult::Error { code, .. } => assert_eq!(code, ErrorCode::ValidationError),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unmatched_input_with_no_provider_is_unrouted() {
        let registry = system_registry();
        let cache = ToolFilterCache::new();
        let result = route(
            "something no stage recognizes at all",
            &[],
            None,
            &registry,
            None,
            &cache,
            &Limits::default(),
        )
        .await;
        match result {
            RouteResult::Error { code, .. } => assert_eq!(code, ErrorCode::Unrouted),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
