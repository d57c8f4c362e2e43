//! Slack reports most failures as `200 {"ok": false, "error": "..."}`.

use serde_json::Value;
use unrelated_api_tools::ResponsePolicy;
use unrelated_api_tools::upstream::{StatusCode, default_status_message};

#[derive(Debug, Clone, Copy, Default)]
pub struct SlackPolicy;

impl ResponsePolicy for SlackPolicy {
    fn describe_status(&self, status: StatusCode, body: &Value) -> String {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return "Slack rate limit exceeded - please wait before trying again".to_string();
        }
        if let Some(message) = api_error(body) {
            return format!("{} ({})", message, status.as_u16());
        }
        default_status_message(status, body)
    }

    fn check_body(&self, body: &Value) -> Result<(), String> {
        match api_error(body) {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }
}

/// `Slack API error: missing_scope (needed: chat:write)` for an `ok: false` body.
fn api_error(body: &Value) -> Option<String> {
    if body.get("ok").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    let code = body.get("error").and_then(Value::as_str).unwrap_or("unknown_error");
    let mut message = format!("Slack API error: {code}");
    if let Some(needed) = body.get("needed").and_then(Value::as_str) {
        message.push_str(&format!(" (needed: {needed})"));
    }
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_false_is_an_error_with_its_code() {
        let err = SlackPolicy
            .check_body(&json!({"ok": false, "error": "channel_not_found"}))
            .unwrap_err();
        assert_eq!(err, "Slack API error: channel_not_found");
    }

    #[test]
    fn missing_scope_names_the_scope() {
        let err = SlackPolicy
            .check_body(&json!({"ok": false, "error": "missing_scope", "needed": "reactions:write"}))
            .unwrap_err();
        assert_eq!(err, "Slack API error: missing_scope (needed: reactions:write)");
    }

    #[test]
    fn bodies_without_ok_false_pass() {
        assert!(SlackPolicy.check_body(&json!({"ok": true})).is_ok());
        assert!(SlackPolicy.check_body(&Value::Null).is_ok());
    }

    #[test]
    fn status_errors_prefer_slack_codes() {
        let rate = SlackPolicy.describe_status(StatusCode::TOO_MANY_REQUESTS, &Value::Null);
        assert!(rate.contains("rate limit"));
        let text = SlackPolicy.describe_status(
            StatusCode::BAD_REQUEST,
            &json!({"ok": false, "error": "invalid_arguments"}),
        );
        assert_eq!(text, "Slack API error: invalid_arguments (400)");
    }
}
