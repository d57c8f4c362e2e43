//! Slack Web API (channels, messages, reactions, scheduling, users) exposed as MCP tools.

pub mod auth;
pub mod config;
mod operations;
pub mod policy;

pub use auth::{BotIdentity, verify_auth};
pub use config::SlackConfig;
pub use operations::registry;

use unrelated_api_tools::runtime::RuntimeArgs;
use unrelated_api_tools::{ConfigError, Dispatcher, ServerIdentity};

pub const SERVER_NAME: &str = "unrelated-slack-mcp";

#[must_use]
pub fn identity() -> ServerIdentity {
    ServerIdentity {
        name: SERVER_NAME,
        version: env!("CARGO_PKG_VERSION"),
        instructions: Some(
            "Slack workspace access for a bot user: list channels and users, read history and \
             threads, post, react and schedule messages. Channel and user arguments are IDs.",
        ),
    }
}

/// Build the dispatcher without contacting Slack; see [`verify_auth`] for the startup check.
///
/// # Errors
///
/// Returns a [`ConfigError`] for missing or malformed credentials, an invalid base URL or an
/// inconsistent operation table.
pub fn build_dispatcher(config: &SlackConfig, runtime: &RuntimeArgs) -> Result<Dispatcher, ConfigError> {
    Ok(Dispatcher::new(registry()?, config.client(runtime)?))
}
