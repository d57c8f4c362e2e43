use crate::html;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;
use unrelated_api_tools::render::truncate_chars;
use unrelated_api_tools::upstream::ExternalResponse;
use unrelated_api_tools::{
    Arguments, CustomHandler, Handler, OperationSpec, ParamKind, ParameterSpec, UpstreamClient, UpstreamError,
};

pub(crate) const MAX_TEXT_CHARS: usize = 10_000;
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const FETCH_USER_AGENT: &str = "Mozilla/5.0 (compatible; UnrelatedFetcher/1.0)";

pub(super) static OPERATIONS: &[OperationSpec] = &[OperationSpec {
    name: "fetch_website",
    description: "Fetch a web page and return its readable text (scripts, styles and page chrome \
                  removed). Long pages are truncated.",
    handler: Handler::Custom(&FetchWebsite),
    params: &[ParameterSpec::new("url", ParamKind::Url)
        .required()
        .doc("http:// or https:// URL of the page")],
    render: render_page,
}];

/// One GET to an arbitrary page, outside the Brave base URL and without its credentials.
struct FetchWebsite;

#[async_trait]
impl CustomHandler for FetchWebsite {
    async fn call(&self, upstream: &UpstreamClient, arguments: &Arguments) -> Result<Value, UpstreamError> {
        let url = arguments
            .url("url")
            .ok_or_else(|| UpstreamError::Request("url is required".to_string()))?;
        let page = upstream
            .fetch_external(url, &[("User-Agent", FETCH_USER_AGENT)], FETCH_TIMEOUT)
            .await?;
        let text = page_text(&page);
        info!(url = %page.url, chars = text.chars().count(), "fetched page");
        Ok(json!({ "url": page.url.as_str(), "text": text }))
    }
}

fn page_text(page: &ExternalResponse) -> String {
    let raw = String::from_utf8_lossy(&page.body);
    if page.is_html() || (page.content_type.is_none() && raw.trim_start().starts_with('<')) {
        html::to_text(&raw)
    } else {
        html::non_blank_lines(&raw)
    }
}

fn render_page(body: &Value, _args: &Arguments) -> String {
    let text = body.get("text").and_then(Value::as_str).unwrap_or_default();
    if text.is_empty() {
        let url = body.get("url").and_then(Value::as_str).unwrap_or("the page");
        return format!("No readable text found at {url}.");
    }
    match truncate_chars(text, MAX_TEXT_CHARS) {
        (kept, true) => format!(
            "{kept}...\n[Content truncated due to length exceeding {MAX_TEXT_CHARS} characters]"
        ),
        (kept, false) => kept,
    }
}
