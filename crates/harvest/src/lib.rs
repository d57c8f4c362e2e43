//! Harvest v2 time-tracking API exposed as MCP tools.

pub mod config;
mod operations;

pub use config::HarvestConfig;
pub use operations::registry;

use unrelated_api_tools::runtime::RuntimeArgs;
use unrelated_api_tools::{ConfigError, Dispatcher, ServerIdentity};

pub const SERVER_NAME: &str = "unrelated-harvest-mcp";

#[must_use]
pub fn identity() -> ServerIdentity {
    ServerIdentity {
        name: SERVER_NAME,
        version: env!("CARGO_PKG_VERSION"),
        instructions: Some(
            "Harvest time tracking: list, create, update and stop time entries; manage clients \
             and projects; and pull time reports. Dates are YYYY-MM-DD.",
        ),
    }
}

/// Build the dispatcher for a resolved configuration.
///
/// # Errors
///
/// Returns a [`ConfigError`] for missing credentials, an invalid base URL or an inconsistent
/// operation table.
pub fn build_dispatcher(config: &HarvestConfig, runtime: &RuntimeArgs) -> Result<Dispatcher, ConfigError> {
    Ok(Dispatcher::new(registry()?, config.client(runtime)?))
}
