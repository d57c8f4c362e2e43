//! Small helpers shared by the per-service renderers.

use serde_json::Value;

/// Items of a list response: either a bare array or the array under `key` of an envelope.
#[must_use]
pub fn collection<'a>(body: &'a Value, key: &str) -> &'a [Value] {
    match body {
        Value::Array(items) => items,
        Value::Object(o) => o.get(key).and_then(Value::as_array).map_or(&[][..], Vec::as_slice),
        _ => &[],
    }
}

/// Scalar at a JSON pointer as display text. `null`, arrays and objects yield `None`.
#[must_use]
pub fn scalar(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Like [`scalar`], falling back to `"n/a"`.
#[must_use]
pub fn field(value: &Value, pointer: &str) -> String {
    scalar(value, pointer).unwrap_or_else(|| "n/a".to_string())
}

#[must_use]
pub fn flag(value: &Value, pointer: &str) -> bool {
    value.pointer(pointer).and_then(Value::as_bool).unwrap_or(false)
}

/// `label: value` lines for the fields that are present.
#[must_use]
pub fn detail_lines(value: &Value, fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .filter_map(|(label, pointer)| scalar(value, pointer).map(|v| format!("  {label}: {v}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut `text` to at most `max` characters. Returns whether anything was removed.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> (String, bool) {
    match text.char_indices().nth(max) {
        Some((idx, _)) => (text[..idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Pretty JSON for bodies no renderer understands.
#[must_use]
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
