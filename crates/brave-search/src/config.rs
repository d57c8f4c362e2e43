use crate::policy::BravePolicy;
use clap::Args;
use std::fmt;
use std::sync::Arc;
use unrelated_api_tools::runtime::RuntimeArgs;
use unrelated_api_tools::safety::OutboundHttpSafety;
use unrelated_api_tools::{Auth, ConfigError, UpstreamClient, UpstreamConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1";

#[derive(Clone, Args)]
pub struct BraveConfig {
    #[arg(long, env = "BRAVE_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "BRAVE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Allow `fetch_website` to reach loopback, private and link-local addresses.
    #[arg(long, env = "BRAVE_FETCH_ALLOW_PRIVATE")]
    pub allow_private_fetch: bool,
}

impl fmt::Debug for BraveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BraveConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("allow_private_fetch", &self.allow_private_fetch)
            .finish()
    }
}

impl BraveConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for a blank API key and
    /// [`ConfigError::InvalidBaseUrl`] for an unusable base URL.
    pub fn upstream_config(&self, runtime: &RuntimeArgs) -> Result<UpstreamConfig, ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::Missing("BRAVE_API_KEY"));
        }

        let mut config = UpstreamConfig::new(
            &self.base_url,
            Auth::Header {
                name: "X-Subscription-Token".to_string(),
                value: key.to_string(),
            },
        )?
        .with_header("Accept", "application/json");
        config.timeout = runtime.timeout();
        config.max_response_bytes = runtime.max_response_bytes;
        config.outbound = if self.allow_private_fetch {
            OutboundHttpSafety::permissive()
        } else {
            OutboundHttpSafety::restricted()
        };
        Ok(config)
    }

    /// # Errors
    ///
    /// See [`BraveConfig::upstream_config`].
    pub fn client(&self, runtime: &RuntimeArgs) -> Result<UpstreamClient, ConfigError> {
        UpstreamClient::new(self.upstream_config(runtime)?, Arc::new(BravePolicy))
    }
}
