//! Brave Search operation tables.

mod fetch;
mod search;

use unrelated_api_tools::{Registry, RegistryError};

/// Both Brave operations, in listing order.
///
/// # Errors
///
/// Fails only if the static tables are inconsistent.
pub fn registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    registry.register_all(search::OPERATIONS)?;
    registry.register_all(fetch::OPERATIONS)?;
    Ok(registry)
}
