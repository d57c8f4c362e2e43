//! One-time `auth.test` check run before serving.

use serde_json::Value;
use tracing::{info, warn};
use unrelated_api_tools::upstream::UpstreamRequest;
use unrelated_api_tools::{ConfigError, HttpMethod, UpstreamClient};

/// Bot identity reported by `auth.test`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub user: String,
    pub team: String,
    pub team_id: String,
}

impl BotIdentity {
    fn from_body(body: &Value) -> Self {
        let text = |key: &str| body.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
        Self {
            user: text("user"),
            team: text("team"),
            team_id: text("team_id"),
        }
    }
}

/// Confirm the bot token works. A team id other than `expected_team_id` is logged, not fatal.
///
/// # Errors
///
/// Returns [`ConfigError::CredentialCheck`] when Slack rejects the token or cannot be reached.
pub async fn verify_auth(upstream: &UpstreamClient, expected_team_id: &str) -> Result<BotIdentity, ConfigError> {
    let body = upstream
        .execute(UpstreamRequest::new(HttpMethod::Post, "/auth.test"))
        .await
        .map_err(|e| ConfigError::CredentialCheck(format!("Slack auth.test failed: {e}")))?;

    let identity = BotIdentity::from_body(&body);
    info!(user = %identity.user, team = %identity.team, "connected to Slack");
    if !identity.team_id.is_empty() && identity.team_id != expected_team_id.trim() {
        warn!(
            configured = expected_team_id,
            actual = %identity.team_id,
            "SLACK_TEAM_ID does not match the token's workspace"
        );
    }
    Ok(identity)
}
