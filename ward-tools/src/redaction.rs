//! Argument sanitization for audit records (spec section 4.7, step 8):
//! secrets redacted, values truncated to ~200 chars. Grounded on this
//! codebase's env-sanitizer pattern: a case-insensitive glob match
//! against field names, not a content-sniffing heuristic.

use std::sync::OnceLock;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde_json::Value;

const TRUNCATE_LEN: usize = 200;
const SECRET_KEY_PATTERNS: &[&str] = &["*key*", "*secret*", "*token*", "*password*", "*credential*"];

fn secret_key_matcher() -> &'static GlobSet {
    static MATCHER: OnceLock<GlobSet> = OnceLock::new();
    MATCHER.get_or_init(|| {
        let mut builder = GlobSetBuilder::new();
        for pattern in SECRET_KEY_PATTERNS {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("secret key patterns are valid globs");
            builder.add(glob);
        }
        builder.build().expect("secret key glob set builds")
    })
}

/// Redact values whose field name looks secret-like and truncate every
/// remaining string to `TRUNCATE_LEN` characters, recursively.
#[must_use]
pub fn sanitize_args_for_audit(args: &Value) -> Value {
    sanitize(args, None)
}

fn sanitize(value: &Value, field_name: Option<&str>) -> Value {
    if let Some(name) = field_name
        && secret_key_matcher().is_match(name)
    {
        return Value::String("[REDACTED]".to_string());
    }

    match value {
        Value::String(s) => Value::String(truncate(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| sanitize(v, None)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize(v, Some(k))))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= TRUNCATE_LEN {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(TRUNCATE_LEN).collect();
    truncated.push_str("...");
    truncated
}
