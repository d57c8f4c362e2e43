//! Brave status codes mapped to caller-facing messages, and the shape check for search bodies.

use serde_json::Value;
use unrelated_api_tools::ResponsePolicy;
use unrelated_api_tools::render::truncate_chars;
use unrelated_api_tools::upstream::{StatusCode, error_detail};

const CLIENT_ERROR_DETAIL_CHARS: usize = 100;
const UNEXPECTED_FORMAT: &str = "Unexpected response format from search API";

#[derive(Debug, Clone, Copy, Default)]
pub struct BravePolicy;

impl ResponsePolicy for BravePolicy {
    fn describe_status(&self, status: StatusCode, body: &Value) -> String {
        match status {
            StatusCode::UNAUTHORIZED => "API authentication failed - check your BRAVE_API_KEY".to_string(),
            StatusCode::FORBIDDEN => "Permission denied - check API key or subscription plan".to_string(),
            StatusCode::TOO_MANY_REQUESTS => {
                "Rate limit exceeded - please wait before trying again".to_string()
            }
            s if s.is_server_error() => format!(
                "Brave API server error: {} {}",
                s.as_u16(),
                s.canonical_reason().unwrap_or("Unknown")
            ),
            s => {
                let (detail, _) = truncate_chars(&error_detail(body), CLIENT_ERROR_DETAIL_CHARS);
                format!("API client error: {} - {detail}", s.as_u16())
            }
        }
    }

    fn check_body(&self, body: &Value) -> Result<(), String> {
        match body.pointer("/web/results") {
            Some(Value::Array(_)) => Ok(()),
            _ => Err(UNEXPECTED_FORMAT.to_string()),
        }
    }
}
