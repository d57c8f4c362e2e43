//! Harvest v2 operation tables.

mod clients;
mod projects;
mod reports;
mod time_entries;

use serde_json::Value;
use unrelated_api_tools::render::scalar;
use unrelated_api_tools::{Literal, ParamKind, ParameterSpec, Registry, RegistryError};

pub(crate) const PAGE: ParameterSpec = ParameterSpec::new("page", ParamKind::Integer)
    .with_default(Literal::Integer(1))
    .bounded(1, i64::MAX)
    .doc("Page number");

pub(crate) const PER_PAGE: ParameterSpec = ParameterSpec::new("per_page", ParamKind::Integer)
    .with_default(Literal::Integer(2000))
    .bounded(1, 2000)
    .doc("Records per page (1-2000)");

pub(crate) const UPDATED_SINCE: ParameterSpec = ParameterSpec::new("updated_since", ParamKind::DateTime)
    .doc("Only return records updated since this RFC 3339 timestamp");

/// Every Harvest operation, in listing order.
///
/// # Errors
///
/// Fails only if the static tables are inconsistent.
pub fn registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    registry.register_all(time_entries::OPERATIONS)?;
    registry.register_all(clients::OPERATIONS)?;
    registry.register_all(projects::OPERATIONS)?;
    registry.register_all(reports::OPERATIONS)?;
    Ok(registry)
}

/// `Page 1 of 3 (250 total)` for Harvest list envelopes.
pub(crate) fn page_summary(body: &Value) -> Option<String> {
    let total = scalar(body, "/total_entries")?;
    let page = scalar(body, "/page").unwrap_or_else(|| "1".to_string());
    let pages = scalar(body, "/total_pages").unwrap_or_else(|| "1".to_string());
    Some(format!("Page {page} of {pages} ({total} total)"))
}

/// Header, one line per item and the page summary; `empty` when there are no items.
pub(crate) fn list_text(title: &str, empty: &str, body: &Value, lines: Vec<String>) -> String {
    if lines.is_empty() {
        return empty.to_string();
    }
    let mut out = format!("{title} ({}):\n{}", lines.len(), lines.join("\n"));
    if let Some(summary) = page_summary(body) {
        out.push_str("\n\n");
        out.push_str(&summary);
    }
    out
}
