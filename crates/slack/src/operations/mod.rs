//! Slack Web API operation tables.

mod channels;
mod messages;
mod users;

use chrono::DateTime;
use serde_json::Value;
use unrelated_api_tools::render::{field, scalar};
use unrelated_api_tools::{ParamKind, ParameterSpec, Registry, RegistryError};

/// Conversation id, sent as `channel`. Query-located; write operations move it to the body.
pub(crate) const CHANNEL_ID: ParameterSpec = ParameterSpec::new("channel_id", ParamKind::String)
    .required()
    .non_empty()
    .wire("channel")
    .doc("Channel ID (e.g. C0123456789)");

pub(crate) const CURSOR: ParameterSpec =
    ParameterSpec::new("cursor", ParamKind::String).doc("Pagination cursor from a previous call");

/// Every Slack operation, in listing order.
///
/// # Errors
///
/// Fails only if the static tables are inconsistent.
pub fn registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    registry.register_all(channels::OPERATIONS)?;
    registry.register_all(messages::OPERATIONS)?;
    registry.register_all(users::OPERATIONS)?;
    Ok(registry)
}

/// Header plus one line per item, with the next-page cursor when Slack returned one.
pub(crate) fn list_text(title: &str, empty: &str, body: &Value, lines: Vec<String>) -> String {
    let mut out = if lines.is_empty() {
        empty.to_string()
    } else {
        format!("{title} ({}):\n{}", lines.len(), lines.join("\n"))
    };
    if let Some(cursor) = scalar(body, "/response_metadata/next_cursor") {
        out.push_str(&format!("\n\nMore results available. Next cursor: {cursor}"));
    }
    out
}

/// `- 1512085950.000216 U024BE7LH: text (3 replies)`
pub(crate) fn message_line(message: &Value) -> String {
    let author = scalar(message, "/user")
        .or_else(|| scalar(message, "/username"))
        .or_else(|| scalar(message, "/bot_id"))
        .unwrap_or_else(|| "unknown".to_string());
    let mut line = format!(
        "- {} {author}: {}",
        field(message, "/ts"),
        scalar(message, "/text").unwrap_or_default()
    );
    if let Some(replies) = message.get("reply_count").and_then(Value::as_u64)
        && replies > 0
    {
        line.push_str(&format!(" ({replies} {})", if replies == 1 { "reply" } else { "replies" }));
    }
    line
}

/// Unix seconds as `2019-07-03 19:00:00 UTC`; the raw number when out of range.
pub(crate) fn unix_time(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map_or_else(|| seconds.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
