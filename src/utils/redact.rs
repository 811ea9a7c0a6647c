use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "access_token",
        "authorization",
        "client_secret",
        "password",
        "refresh_token",
        "secret",
        "token",
    ]
    .into_iter()
    .collect()
});

/// Credential shapes: JWTs, bearer headers and explicitly named credential
/// fields.
static CREDENTIAL_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("inline redaction regex"),
            INLINE_REDACTION,
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{10,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(
                r#"\b(client_secret|access_token|refresh_token|password)\b("?\s*[:=]\s*"?)([^\s"'&,}]+)"#,
            )
            .expect("inline redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

/// Bare `token=` / `secret:` pairs. Only applied to text we produced or
/// raw bodies, since prose like "Invalid token: expired" matches too.
static LOOSE_KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(secret|token)\b("?\s*[:=]\s*"?)([^\s"'&,}]+)"#)
        .expect("inline redaction regex")
});

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    if SENSITIVE_KEYS.contains(normalized.as_str()) {
        return true;
    }
    normalized.contains("secret") || normalized.ends_with("token")
}

fn redact_credentials(value: &str) -> String {
    let mut out = value.to_string();
    for (re, replacement) in CREDENTIAL_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    out
}

fn cap(value: String, max_string: usize) -> String {
    if value.len() <= max_string {
        return value;
    }
    format!("{}...", truncate_utf8_prefix(&value, max_string))
}

/// Masks bearer tokens, JWTs and `key=value` secrets, then caps the length.
pub fn redact_text(value: &str, max_string: usize) -> String {
    let redacted = redact_credentials(value);
    let redacted = LOOSE_KEY_PATTERN
        .replace_all(&redacted, "$1$2***REDACTED***")
        .to_string();
    cap(redacted, max_string)
}

/// Like `redact_text` but leaves bare `token:` / `secret:` phrases alone.
/// For human-readable messages taken from upstream error bodies.
pub fn redact_message(value: &str, max_string: usize) -> String {
    cap(redact_credentials(value), max_string)
}

pub fn redact_object(value: &Value, max_string: usize) -> Value {
    match value {
        Value::String(text) => Value::String(redact_text(text, max_string)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| redact_object(item, max_string))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.iter() {
                if is_sensitive_key(key) && !entry.is_null() {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                } else {
                    out.insert(key.clone(), redact_object(entry, max_string));
                }
            }
            Value::Object(out)
        }
        _ => value.clone(),
    }
}
