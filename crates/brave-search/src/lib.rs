//! Brave Search web search and page fetching exposed as MCP tools.

pub mod config;
pub mod html;
mod operations;
pub mod policy;

pub use config::BraveConfig;
pub use operations::registry;

use unrelated_api_tools::runtime::RuntimeArgs;
use unrelated_api_tools::{ConfigError, Dispatcher, ServerIdentity};

pub const SERVER_NAME: &str = "unrelated-brave-search-mcp";

#[must_use]
pub fn identity() -> ServerIdentity {
    ServerIdentity {
        name: SERVER_NAME,
        version: env!("CARGO_PKG_VERSION"),
        instructions: Some(
            "Brave web search plus a page fetcher. Search first, then fetch_website on a result \
             URL to read the page.",
        ),
    }
}

/// # Errors
///
/// Returns a [`ConfigError`] for a missing API key, an invalid base URL or an inconsistent
/// operation table.
pub fn build_dispatcher(config: &BraveConfig, runtime: &RuntimeArgs) -> Result<Dispatcher, ConfigError> {
    Ok(Dispatcher::new(registry()?, config.client(runtime)?))
}
