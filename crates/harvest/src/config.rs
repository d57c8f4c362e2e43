use clap::Args;
use std::fmt;
use std::sync::Arc;
use unrelated_api_tools::runtime::RuntimeArgs;
use unrelated_api_tools::upstream::DefaultPolicy;
use unrelated_api_tools::{Auth, ConfigError, UpstreamClient, UpstreamConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.harvestapp.com/v2";
pub const DEFAULT_USER_AGENT: &str = "Smart Harvest Tool";

/// Harvest credentials and endpoint, resolved once at startup.
#[derive(Clone, Args)]
pub struct HarvestConfig {
    #[arg(long, env = "HARVEST_ACCOUNT_ID", hide_env_values = true)]
    pub account_id: String,

    #[arg(long, env = "HARVEST_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    #[arg(long, env = "HARVEST_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "HARVEST_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

impl fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("account_id", &self.account_id)
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HarvestConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for blank credentials and
    /// [`ConfigError::InvalidBaseUrl`] for an unusable base URL.
    pub fn upstream_config(&self, runtime: &RuntimeArgs) -> Result<UpstreamConfig, ConfigError> {
        let account_id = self.account_id.trim();
        if account_id.is_empty() {
            return Err(ConfigError::Missing("HARVEST_ACCOUNT_ID"));
        }
        let token = self.access_token.trim();
        if token.is_empty() {
            return Err(ConfigError::Missing("HARVEST_ACCESS_TOKEN"));
        }

        let mut config = UpstreamConfig::new(&self.base_url, Auth::Bearer(token.to_string()))?
            .with_header("Harvest-Account-Id", account_id)
            .with_header("User-Agent", self.user_agent.as_str())
            .with_header("Accept", "application/json");
        config.timeout = runtime.timeout();
        config.max_response_bytes = runtime.max_response_bytes;
        Ok(config)
    }

    /// # Errors
    ///
    /// See [`HarvestConfig::upstream_config`].
    pub fn client(&self, runtime: &RuntimeArgs) -> Result<UpstreamClient, ConfigError> {
        UpstreamClient::new(self.upstream_config(runtime)?, Arc::new(DefaultPolicy))
    }
}
