//! Process wiring for the command assistant: init logging, load the
//! permissions document, construct the `SYSTEM` agent, run one utterance
//! read from stdin through router -> executor, print the result.
//!
//! Argument parsing, a REPL loop, and any dashboard are out of scope here
//! (spec section 1) — this binary is the composition root, nothing more.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use ward_executor::Executor;
use ward_permissions::Permissions;
use ward_router::ToolFilterCache;
use ward_storage::CommandLog;
use ward_tools::ToolRegistry;
use ward_types::{Agent, CommandLogEntry, CommandOutcome, ErrorCode, PermissionsDocument, RouteResult};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    match open_log_file() {
        Some((path, file)) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::info!(path = %path.display(), "logging initialized");
        }
        // A CLI that prints its result on stdout must never also log
        // there; prefer no logs over corrupting the one line of output
        // a caller is scripting against.
        None => {
            tracing_subscriber::registry().with(env_filter).init();
        }
    }
}

fn open_log_file() -> Option<(PathBuf, std::fs::File)> {
    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent() {
            std::fs::create_dir_all(parent).ok()?;
        }
        if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&candidate) {
            return Some((candidate, file));
        }
    }
    None
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".ward").join("logs").join("ward.log"));
    }
    candidates.push(PathBuf::from(".ward").join("logs").join("ward.log"));
    candidates
}

fn data_dir() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".ward"), |home| home.join(".ward"))
}

/// Load the permissions document from the first candidate path that
/// exists, accepting either JSON or TOML by extension (spec section 1,
/// AMBIENT configuration note).
fn load_permissions_document() -> Result<PermissionsDocument> {
    let candidates = [
        PathBuf::from("ward.permissions.json"),
        PathBuf::from("ward.permissions.toml"),
        data_dir().join("permissions.json"),
        data_dir().join("permissions.toml"),
    ];

    for candidate in &candidates {
        if !candidate.exists() {
            continue;
        }
        let raw = std::fs::read_to_string(candidate)
            .with_context(|| format!("failed to read {}", candidate.display()))?;
        return parse_permissions_document(candidate, &raw);
    }

    anyhow::bail!(
        "no permissions document found (looked for {})",
        candidates.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )
}

fn parse_permissions_document(path: &Path, raw: &str) -> Result<PermissionsDocument> {
    match path.extension().and_then(std::ffi::OsStr::to_str) {
        Some("toml") => {
            toml::from_str(raw).with_context(|| format!("failed to parse {} as TOML", path.display()))
        }
        _ => {
            serde_json::from_str(raw).with_context(|| format!("failed to parse {} as JSON", path.display()))
        }
    }
}

/// Coarse error taxonomy for `CommandLogEntry.category` (spec section 7):
/// trust/shape/interaction/external/routing, or `success` when the call
/// produced no error at all.
fn error_category(code: Option<ErrorCode>) -> &'static str {
    match code {
        None => "success",
        Some(
            ErrorCode::DeniedAgentToolset
            | ErrorCode::DeniedToolBlocklist
            | ErrorCode::DeniedPathAllowlist
            | ErrorCode::DeniedPathTraversal
            | ErrorCode::DeniedCommandAllowlist
            | ErrorCode::DeniedCommandFlag,
        ) => "trust",
        Some(ErrorCode::ValidationError | ErrorCode::UnknownTool) => "shape",
        Some(ErrorCode::ConfirmationRequired) => "interaction",
        Some(ErrorCode::Timeout | ErrorCode::Signal | ErrorCode::ExecError) => "external",
        Some(ErrorCode::Unrouted) => "routing",
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn correlation_id(now: i64) -> String {
    format!("req-{now}-{}", std::process::id())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read utterance from stdin")?;
    let input = input.trim_end_matches('\n').to_string();

    let base_dir = std::env::current_dir().context("failed to determine current directory")?;
    let data_dir = data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let document = load_permissions_document()?;
    let permissions = Permissions::from_document(document, &base_dir).context("invalid permissions document")?;

    let mut registry = ToolRegistry::new();
    ward_tools::register_builtins(&mut registry);

    let executor = Executor::open(base_dir, &data_dir, permissions, registry)
        .context("failed to open JSONL-backed stores")?;
    let agent = Agent::system();
    let cache = ToolFilterCache::new();
    let command_log = CommandLog::new(data_dir.join("command_log.jsonl"));

    let started = std::time::Instant::now();
    let ts = now_unix();
    let route_result = ward_router::route(
        &input,
        &[],
        Some(&agent),
        executor.registry(),
        None,
        &cache,
        executor.permissions().limits(),
    )
    .await;

    let (tool, outcome, category) = match &route_result {
        RouteResult::ToolCall { tool, .. } => {
            let result = executor.execute(Some(&agent), &tool.name, tool.args.clone(), ts).await;
            let outcome = if result.is_ok() { CommandOutcome::Success } else { CommandOutcome::Error };
            let category = error_category(result.error_code());
            println!("{}", serde_json::to_string(&result)?);
            (Some(tool.name.clone()), outcome, category)
        }
        RouteResult::Reply { text, .. } => {
            println!("{}", serde_json::to_string(&serde_json::json!({"mode": "reply", "text": text}))?);
            (None, CommandOutcome::Success, "success")
        }
        RouteResult::Error { code, message } => {
            eprintln!("{code}: {message}");
            (None, CommandOutcome::Error, error_category(Some(*code)))
        }
    };

    let routing_path = match &route_result {
        RouteResult::ToolCall { path, .. } | RouteResult::Reply { path, .. } => path.clone(),
        RouteResult::Error { .. } => "none".to_string(),
    };
    let llm_tokens = None;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    command_log
        .record(&CommandLogEntry {
            ts,
            correlation_id: correlation_id(ts),
            input: input.chars().take(1000).collect(),
            routing_path,
            tool,
            outcome,
            category: category.to_string(),
            llm_tokens,
            duration_ms,
        })
        .await;

    if matches!(route_result, RouteResult::Error { .. }) {
        std::process::exit(1);
    }
    Ok(())
}
