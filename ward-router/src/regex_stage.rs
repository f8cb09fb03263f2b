//! Stage R: the regex fast path (spec section 4.9). A small, ordered table
//! of anchored patterns maps directly to tool calls; compiled once into a
//! table at first use, never per request.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::{Value, json};
use ward_tools::ToolRegistry;
use ward_types::{Agent, RouteResult, route_path};

struct RoutePattern {
    regex: Regex,
    build: fn(&Captures) -> Option<(&'static str, Value)>,
}

fn patterns() -> &'static [RoutePattern] {
    static PATTERNS: OnceLock<Vec<RoutePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            RoutePattern {
                regex: Regex::new(r"(?i)^remember:\s+(.+)$").unwrap(),
                build: |c| Some(("remember", json!({"text": c[1].trim()}))),
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^recall:\s+(.+)$").unwrap(),
                build: |c| Some(("recall", json!({"query": c[1].trim()}))),
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^read\s+(?:url\s+)?(https?://\S+)$").unwrap(),
                build: |c| Some(("read_url", json!({"url": c[1]}))),
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^read\s+(\S+)$").unwrap(),
                build: |c| Some(("read_file", json!({"path": c[1]}))),
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^write\s+(\S+)\s+(.+)$").unwrap(),
                build: |c| Some(("write_file", json!({"path": c[1], "content": c[2]}))),
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^list(?:\s+files)?$").unwrap(),
                build: |_c| Some(("list_files", json!({}))),
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^(?:what time is it|current time|time|date)$").unwrap(),
                build: |_c| Some(("get_time", json!({}))),
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^(?:calculate|calc|compute|eval|math)[:\s]+(.+)$").unwrap(),
                build: |c| Some(("calculate", json!({"expression": c[1].trim()}))),
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^git\s+(status|diff|log)(?:\s+.*)?$").unwrap(),
                build: |c| {
                    let tool = match &c[1].to_lowercase()[..] {
                        "status" => "git_status",
                        "diff" => "git_diff",
                        "log" => "git_log",
                        _ => return None,
                    };
                    Some((tool, json!({})))
                },
            },
            RoutePattern {
                regex: Regex::new(r"(?i)^(ls|pwd|cat|du)(?:\s+(.*))?$").unwrap(),
                build: |c| {
                    let name = c[1].to_lowercase();
                    let argv: Vec<&str> = c
                        .get(2)
                        .map(|m| m.as_str().split_whitespace().collect())
                        .unwrap_or_default();
                    Some(("run_command", json!({"name": name, "argv": argv})))
                },
            },
        ]
    })
}

/// Try every pattern in order; the first match whose tool both exists in
/// the registry and is permitted for `agent` wins. A match against a tool
/// the agent may not call, or one that was never registered, yields no
/// decision here and routing proceeds to the next stage.
pub fn try_route(input: &str, agent: Option<&Agent>, registry: &ToolRegistry) -> Option<RouteResult> {
    let trimmed = input.trim();
    for pattern in patterns() {
        let Some(captures) = pattern.regex.captures(trimmed) else {
            continue;
        };
        let Some((tool_name, args)) = (pattern.build)(&captures) else {
            continue;
        };
        if !registry.contains(tool_name) {
            continue;
        }
        if !is_permitted(tool_name, agent) {
            continue;
        }
        return Some(RouteResult::tool_call(tool_name, args, route_path::REGEX_FAST_PATH));
    }
    None
}

fn is_permitted(tool_name: &str, agent: Option<&Agent>) -> bool {
    match agent {
        Some(agent) => agent.may_call(tool_name) || ward_types::is_safe_tool(tool_name),
        None => ward_types::is_safe_tool(tool_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use ward_types::RouteResult;

    fn system_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        ward_tools::register_builtins(&mut registry);
        registry
    }

    #[test]
    fn matches_remember_prefix() {
        let registry = system_registry();
        let agent = Agent::system();
        let result = try_route("remember: meet Alice at 3pm", Some(&agent), &registry).unwrap();
        match result {
            RouteResult::ToolCall { tool, path, .. } => {
                assert_eq!(tool.name, "remember");
                assert_eq!(tool.args["text"], "meet Alice at 3pm");
                assert_eq!(path, route_path::REGEX_FAST_PATH);
            }
            other => panic!("expected tool_call, got {other:?}"),
        }
    }

    #[test]
    fn declines_when_agent_may_not_call_tool() {
        let registry = system_registry();
        let agent = Agent::user("limited", HashSet::new());
        assert!(try_route("remember: secret", Some(&agent), &registry).is_none());
    }

    #[test]
    fn no_agent_only_matches_safe_tools() {
        let registry = system_registry();
        assert!(try_route("current time", None, &registry).is_some());
        assert!(try_route("remember: x", None, &registry).is_none());
    }

    #[test]
    fn matches_read_url_before_read_file() {
        let registry = system_registry();
        let agent = Agent::system();
        let result = try_route("read https://example.com/page", Some(&agent), &registry).unwrap();
        match result {
            RouteResult::ToolCall { tool, .. } => {
                assert_eq!(tool.name, "read_url");
                assert_eq!(tool.args["url"], "https://example.com/page");
            }
            other => panic!("expected tool_call, got {other:?}"),
        }
    }

    #[test]
    fn matches_run_command_with_flags() {
        let registry = system_registry();
        let agent = Agent::system();
        let result = try_route("ls -la /tmp", Some(&agent), &registry).unwrap();
        match result {
            RouteResult::ToolCall { tool, .. } => {
                assert_eq!(tool.name, "run_command");
                assert_eq!(tool.args["name"], "ls");
                assert_eq!(tool.args["argv"], json!(["-la", "/tmp"]));
            }
            other => panic!("expected tool_call, got {other:?}"),
        }
    }
}
