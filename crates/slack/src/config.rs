use crate::policy::SlackPolicy;
use clap::Args;
use std::fmt;
use std::sync::Arc;
use unrelated_api_tools::runtime::RuntimeArgs;
use unrelated_api_tools::{Auth, ConfigError, UpstreamClient, UpstreamConfig};

pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";
const BOT_TOKEN_PREFIX: &str = "xoxb-";

#[derive(Clone, Args)]
pub struct SlackConfig {
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    #[arg(long, env = "SLACK_TEAM_ID")]
    pub team_id: String,

    #[arg(long, env = "SLACK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Skip the `auth.test` call at startup.
    #[arg(long, env = "SLACK_SKIP_AUTH_CHECK")]
    pub skip_auth_check: bool,
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"<redacted>")
            .field("team_id", &self.team_id)
            .field("base_url", &self.base_url)
            .field("skip_auth_check", &self.skip_auth_check)
            .finish()
    }
}

impl SlackConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for blank settings, [`ConfigError::Invalid`] for a token
    /// that is not a bot token and [`ConfigError::InvalidBaseUrl`] for an unusable base URL.
    pub fn upstream_config(&self, runtime: &RuntimeArgs) -> Result<UpstreamConfig, ConfigError> {
        let token = self.bot_token.trim();
        if token.is_empty() {
            return Err(ConfigError::Missing("SLACK_BOT_TOKEN"));
        }
        if !token.starts_with(BOT_TOKEN_PREFIX) {
            return Err(ConfigError::Invalid(format!(
                "SLACK_BOT_TOKEN must be a bot token starting with '{BOT_TOKEN_PREFIX}'"
            )));
        }
        if self.team_id.trim().is_empty() {
            return Err(ConfigError::Missing("SLACK_TEAM_ID"));
        }

        let mut config = UpstreamConfig::new(&self.base_url, Auth::Bearer(token.to_string()))?;
        config.timeout = runtime.timeout();
        config.max_response_bytes = runtime.max_response_bytes;
        Ok(config)
    }

    /// # Errors
    ///
    /// See [`SlackConfig::upstream_config`].
    pub fn client(&self, runtime: &RuntimeArgs) -> Result<UpstreamClient, ConfigError> {
        UpstreamClient::new(self.upstream_config(runtime)?, Arc::new(SlackPolicy))
    }
}
