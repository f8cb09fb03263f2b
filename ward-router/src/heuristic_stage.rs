//! Stage H: narrow, hand-written parsers for structured phrases (spec
//! section 4.9). Contact/calendar CRUD parsers named in `spec.md`'s
//! component table are out of scope: no contact/calendar data model or
//! tool exists anywhere else in this crate.

use regex::Regex;
use serde_json::json;
use std::sync::OnceLock;
use ward_tools::ToolRegistry;
use ward_types::{Agent, RouteResult, route_path};

type Parser = fn(&str) -> Option<(&'static str, serde_json::Value)>;

fn parsers() -> &'static [Parser] {
    static PARSERS: OnceLock<Vec<Parser>> = OnceLock::new();
    PARSERS.get_or_init(|| vec![parse_task, parse_reminder, parse_memory_with_tags])
}

fn task_add_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:add|new)\s+task[:\s]+(.+)$").unwrap())
}

fn task_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:list|show)\s+tasks?$").unwrap())
}

fn task_done_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:finish|complete|done with)\s+task\s+(\d+)$").unwrap())
}

fn parse_task(input: &str) -> Option<(&'static str, serde_json::Value)> {
    if let Some(c) = task_add_re().captures(input) {
        return Some(("task_add", json!({"text": c[1].trim()})));
    }
    if task_list_re().is_match(input) {
        return Some(("task_list", json!({})));
    }
    if let Some(c) = task_done_re().captures(input) {
        let id: u64 = c[1].parse().ok()?;
        return Some(("task_done", json!({"id": id})));
    }
    None
}

fn reminder_add_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^remind me (?:to\s+)?(.+?)\s+at\s+(\d+)$").unwrap())
}

fn parse_reminder(input: &str) -> Option<(&'static str, serde_json::Value)> {
    let c = reminder_add_re().captures(input)?;
    let due_ts: i64 = c[2].parse().ok()?;
    Some(("reminder_add", json!({"text": c[1].trim(), "due_ts": due_ts})))
}

fn memory_with_tags_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^note\s+(.+?)\s+#tags?[:\s]+(.+)$").unwrap())
}

fn parse_memory_with_tags(input: &str) -> Option<(&'static str, serde_json::Value)> {
    let c = memory_with_tags_re().captures(input)?;
    let tags: Vec<&str> = c[2].split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
    Some(("remember", json!({"text": c[1].trim(), "tags": tags})))
}

/// Same permission discipline as the regex fast path: a parser match
/// against a tool the agent may not call, or one never registered, yields
/// no decision.
pub fn try_route(input: &str, agent: Option<&Agent>, registry: &ToolRegistry) -> Option<RouteResult> {
    let trimmed = input.trim();
    for parser in parsers() {
        let Some((tool_name, args)) = parser(trimmed) else {
            continue;
        };
        if !registry.contains(tool_name) {
            continue;
        }
        let permitted = match agent {
            Some(agent) => agent.may_call(tool_name) || ward_types::is_safe_tool(tool_name),
            None => ward_types::is_safe_tool(tool_name),
        };
        if !permitted {
            continue;
        }
        return Some(RouteResult::tool_call(tool_name, args, route_path::HEURISTIC));
    }
    None
}
