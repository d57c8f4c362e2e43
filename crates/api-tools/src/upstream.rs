//! Upstream HTTP client: one reusable `reqwest::Client`, process-wide credentials, and the
//! translation of HTTP outcomes into JSON values or [`UpstreamError`]s.

use crate::args::Arguments;
use crate::error::ConfigError;
use crate::safety::{MAX_REDIRECTS, OutboundHttpSafety, RedirectPolicy, redact_url, sanitize_reqwest_error};
use crate::schema::{ParamLocation, ParameterSpec};
use crate::semantics::HttpMethod;
use mime::Mime;
pub use reqwest::StatusCode;
use rmcp::model::JsonObject;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("http transport error: {0}")]
    Transport(String),

    /// Non-2xx response; `message` is already formatted for the caller.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("malformed response body: {0}")]
    Body(String),

    /// 2xx response whose body reports an application-level failure.
    #[error("{0}")]
    Api(String),

    #[error("outbound request blocked: {0}")]
    Blocked(String),

    #[error("invalid request: {0}")]
    Request(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Transport(format!("request timed out: {}", sanitize_reqwest_error(&value)));
        }
        Self::Transport(sanitize_reqwest_error(&value))
    }
}

/// Process-wide upstream credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    Bearer(String),
    Header { name: String, value: String },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Header { name, .. } => write!(f, "Header({name}: <redacted>)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: Url,
    pub auth: Auth,
    /// Sent with every request to the base URL.
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    /// Maximum response body size (bytes). `None` = unlimited.
    pub max_response_bytes: Option<usize>,
    /// Policy for requests to URLs other than the base URL.
    pub outbound: OutboundHttpSafety,
}

impl UpstreamConfig {
    /// Parse `base_url` and fill the remaining fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL does not parse or is not http(s).
    pub fn new(base_url: &str, auth: Auth) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                message: "scheme must be http or https".to_string(),
            });
        }
        Ok(Self {
            base_url: parsed,
            auth,
            headers: Vec::new(),
            timeout: Duration::from_secs(30),
            max_response_bytes: None,
            outbound: OutboundHttpSafety::default(),
        })
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Decides how HTTP outcomes become errors for a particular service.
pub trait ResponsePolicy: Send + Sync {
    /// Message for a non-2xx response.
    fn describe_status(&self, status: StatusCode, body: &Value) -> String {
        default_status_message(status, body)
    }

    /// Application-level failure carried inside a 2xx body.
    ///
    /// # Errors
    ///
    /// Returns the failure message when the body reports an error.
    fn check_body(&self, _body: &Value) -> Result<(), String> {
        Ok(())
    }
}

/// Status-only policy: non-2xx fails, every 2xx body is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl ResponsePolicy for DefaultPolicy {}

/// `API returned 422 Unprocessable Entity: <detail>`
#[must_use]
pub fn default_status_message(status: StatusCode, body: &Value) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    format!("API returned {} {reason}: {}", status.as_u16(), error_detail(body))
}

/// Best-effort human detail from an error body.
#[must_use]
pub fn error_detail(body: &Value) -> String {
    const CANDIDATES: [&str; 5] = [
        "/message",
        "/error_description",
        "/error/detail",
        "/error/message",
        "/detail",
    ];
    if let Some(s) = CANDIDATES
        .iter()
        .find_map(|p| body.pointer(p).and_then(Value::as_str))
    {
        return s.to_string();
    }
    match body {
        Value::Null => "(empty body)".to_string(),
        Value::String(s) if s.trim().is_empty() => "(empty body)".to_string(),
        Value::String(s) => s.trim().to_string(),
        Value::Object(o) => match o.get("error").and_then(Value::as_str) {
            Some(e) => e.to_string(),
            None => body.to_string(),
        },
        other => other.to_string(),
    }
}

/// Method, path, query and body of one request to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonObject>,
}

impl UpstreamRequest {
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Route validated arguments into the path template, query string and JSON body.
    ///
    /// Operations that declare any body parameter always send a JSON object, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Request`] if a path placeholder is left unresolved.
    pub fn from_arguments(
        method: HttpMethod,
        path_template: &str,
        parameters: &[ParameterSpec],
        arguments: &Arguments,
    ) -> Result<Self, UpstreamError> {
        let mut path = if path_template.starts_with('/') {
            path_template.to_string()
        } else {
            format!("/{path_template}")
        };
        let mut query = Vec::new();
        let mut body = parameters
            .iter()
            .any(|p| p.location == ParamLocation::Body)
            .then(JsonObject::new);

        for param in parameters {
            let Some(value) = arguments.get(param.name) else {
                continue;
            };
            match param.location {
                ParamLocation::Path => {
                    let placeholder = format!("{{{}}}", param.wire_name());
                    path = path.replace(&placeholder, &encode_path_segment(&value.to_wire_string()));
                }
                ParamLocation::Query => {
                    query.push((param.wire_name().to_string(), value.to_wire_string()));
                }
                ParamLocation::Body => {
                    if let Some(body) = body.as_mut() {
                        body.insert(param.wire_name().to_string(), value.to_json());
                    }
                }
            }
        }

        if path.contains('{') {
            return Err(UpstreamError::Request(format!(
                "unresolved path parameter in '{path}'"
            )));
        }

        Ok(Self {
            method,
            path,
            query,
            body,
        })
    }
}

/// Raw response of a request outside the base URL.
#[derive(Debug, Clone)]
pub struct ExternalResponse {
    pub url: Url,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ExternalResponse {
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.mime()
            .is_some_and(|m| m.subtype() == mime::HTML || m.subtype() == "xhtml")
    }

    #[must_use]
    pub fn mime(&self) -> Option<Mime> {
        self.content_type.as_deref()?.parse::<Mime>().ok()
    }
}

/// Shared upstream client; clones share the connection pool.
#[derive(Clone)]
pub struct UpstreamClient {
    inner: Arc<UpstreamClientInner>,
}

struct UpstreamClientInner {
    config: UpstreamConfig,
    client: reqwest::Client,
    /// Never follows redirects on its own; `fetch_external` checks each hop.
    external: reqwest::Client,
    policy: Arc<dyn ResponsePolicy>,
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &redact_url(&self.inner.config.base_url))
            .field("auth", &self.inner.config.auth)
            .field("timeout", &self.inner.config.timeout)
            .finish_non_exhaustive()
    }
}

impl UpstreamClient {
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the underlying HTTP client cannot be built.
    pub fn new(config: UpstreamConfig, policy: Arc<dyn ResponsePolicy>) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::Client(sanitize_reqwest_error(&e)))?;
        let external = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::Client(sanitize_reqwest_error(&e)))?;
        Ok(Self {
            inner: Arc::new(UpstreamClientInner {
                config,
                client,
                external,
                policy,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &UpstreamConfig {
        &self.inner.config
    }

    /// Send one request to the base URL and decode its JSON body.
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns an [`UpstreamError`] for transport failures, non-2xx statuses, oversized or
    /// malformed bodies, and bodies rejected by the [`ResponsePolicy`].
    pub async fn execute(&self, request: UpstreamRequest) -> Result<Value, UpstreamError> {
        let inner = &*self.inner;
        let url = build_url(&inner.config.base_url, &request.path, &request.query)?;
        debug!(method = %request.method, url = %redact_url(&url), "upstream request");

        let mut builder = inner.client.request(request.method.to_reqwest(), url);
        builder = apply_auth(&inner.config.auth, builder);
        for (name, value) in &inner.config.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = read_response_body_limited_bytes(response, inner.config.max_response_bytes).await?;
        debug!(status = status.as_u16(), bytes = bytes.len(), "upstream response");

        if status.is_success() {
            let body = decode_json_body(&bytes)?;
            inner.policy.check_body(&body).map_err(UpstreamError::Api)?;
            Ok(body)
        } else {
            let body = decode_error_body(&bytes);
            Err(UpstreamError::Status {
                status: status.as_u16(),
                message: inner.policy.describe_status(status, &body),
            })
        }
    }

    /// GET a URL outside the base URL, without credentials, after checking it against the
    /// outbound safety policy. With [`RedirectPolicy::Checked`] every redirect target is checked
    /// again before it is followed, up to [`MAX_REDIRECTS`] hops.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Blocked`] for disallowed destinations (including redirect
    /// targets) and [`UpstreamError::Status`] (`HTTP 404 Not Found`) for non-2xx responses.
    pub async fn fetch_external(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<ExternalResponse, UpstreamError> {
        let inner = &*self.inner;
        let outbound = &inner.config.outbound;
        outbound.check_url(url).await?;

        let mut current = url.clone();
        let mut hops = 0;
        let response = loop {
            debug!(url = %redact_url(&current), hops, "external fetch");
            let mut builder = inner.external.get(current.clone()).timeout(timeout);
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }
            let response = builder.send().await?;

            if outbound.redirects == RedirectPolicy::None || !response.status().is_redirection() {
                break response;
            }
            let Some(location) = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
            else {
                break response;
            };
            if hops == MAX_REDIRECTS {
                return Err(UpstreamError::Transport(format!(
                    "too many redirects (more than {MAX_REDIRECTS})"
                )));
            }
            let next = outbound.check_redirect(&current, &location).await?;
            current = next;
            hops += 1;
        };

        let status = response.status();
        let final_url = current;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = read_response_body_limited_bytes(response, inner.config.max_response_bytes).await?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            });
        }

        Ok(ExternalResponse {
            url: final_url,
            content_type,
            body,
        })
    }
}

fn apply_auth(auth: &Auth, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match auth {
        Auth::Bearer(token) => request.bearer_auth(token),
        Auth::Header { name, value } => request.header(name, value),
        Auth::None => request,
    }
}

fn build_url(base_url: &Url, path: &str, query: &[(String, String)]) -> Result<Url, UpstreamError> {
    let raw = format!("{}{}", base_url.as_str().trim_end_matches('/'), path);
    let mut url = Url::parse(&raw).map_err(|e| UpstreamError::Request(format!("Invalid URL: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

fn decode_json_body(bytes: &[u8]) -> Result<Value, UpstreamError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| UpstreamError::Body(format!("invalid JSON: {e}")))
}

fn decode_error_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| json!(String::from_utf8_lossy(bytes).into_owned()))
}

async fn read_response_body_limited_bytes(
    mut response: reqwest::Response,
    max_bytes: Option<usize>,
) -> Result<Vec<u8>, UpstreamError> {
    let Some(max) = max_bytes else {
        return Ok(response.bytes().await?.to_vec());
    };

    if let Some(len) = response.content_length()
        && len > max as u64
    {
        return Err(UpstreamError::Body(format!(
            "response too large: {len} bytes (limit {max})"
        )));
    }

    let mut out: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if out.len().saturating_add(chunk.len()) > max {
            return Err(UpstreamError::Body(format!(
                "response too large: exceeded {max} bytes"
            )));
        }
        out.extend_from_slice(&chunk);
    }

    Ok(out)
}

fn encode_path_segment(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::coerce_arguments;
    use crate::schema::{ParamKind, ParameterSpec};
    use unrelated_test_support::MockUpstream;

    const PARAMS: &[ParameterSpec] = &[
        ParameterSpec::new("client_id", ParamKind::Integer).required().in_path(),
        ParameterSpec::new("from_date", ParamKind::Date).wire("from"),
        ParameterSpec::new("name", ParamKind::String).in_body(),
        ParameterSpec::new("is_active", ParamKind::Boolean).in_body(),
    ];

    fn client(base_url: &str, policy: Arc<dyn ResponsePolicy>) -> UpstreamClient {
        let config = UpstreamConfig::new(base_url, Auth::Bearer("secret-token".into()))
            .expect("config")
            .with_header("X-Account", "42");
        UpstreamClient::new(config, policy).expect("client")
    }

    #[test]
    fn request_routes_arguments_by_location() {
        let raw = serde_json::from_value(json!({
            "client_id": 9,
            "from_date": "2024-02-01",
            "name": "Acme & Co"
        }))
        .expect("object");
        let args = coerce_arguments(PARAMS, &raw).expect("valid");
        let req = UpstreamRequest::from_arguments(HttpMethod::Patch, "/clients/{client_id}", PARAMS, &args)
            .expect("request");

        assert_eq!(req.path, "/clients/9");
        assert_eq!(req.query, vec![("from".to_string(), "2024-02-01".to_string())]);
        let body = req.body.expect("body");
        assert_eq!(body.get("name"), Some(&json!("Acme & Co")));
        assert!(!body.contains_key("is_active"));
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let args = Arguments::default();
        let err = UpstreamRequest::from_arguments(HttpMethod::Get, "/clients/{client_id}", &[], &args)
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Request(_)));
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(encode_path_segment("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_path_segment("C0123-x_y.z~"), "C0123-x_y.z~");
    }

    #[test]
    fn error_detail_prefers_known_fields() {
        assert_eq!(error_detail(&json!({"message": "Hours can't be negative"})), "Hours can't be negative");
        assert_eq!(error_detail(&json!({"error": {"detail": "bad q"}})), "bad q");
        assert_eq!(error_detail(&json!({"ok": false, "error": "channel_not_found"})), "channel_not_found");
        assert_eq!(error_detail(&json!("plain text")), "plain text");
        assert_eq!(error_detail(&Value::Null), "(empty body)");
    }

    #[test]
    fn config_rejects_bad_base_urls() {
        assert!(matches!(
            UpstreamConfig::new("not a url", Auth::None),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            UpstreamConfig::new("ftp://example.com", Auth::None),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn auth_debug_redacts_secrets() {
        let rendered = format!("{:?}", Auth::Bearer("xoxb-secret".into()));
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn execute_sends_auth_headers_query_and_body() {
        let mock = MockUpstream::builder()
            .json("PATCH", "/v2/clients/9", 200, json!({"id": 9, "name": "Acme"}))
            .start()
            .await
            .expect("mock");
        let upstream = client(&mock.url("/v2"), Arc::new(DefaultPolicy));

        let mut req = UpstreamRequest::new(HttpMethod::Patch, "/clients/9");
        req.query.push(("from".into(), "2024-02-01".into()));
        req.body = Some(serde_json::from_value(json!({"name": "Acme"})).expect("object"));

        let body = upstream.execute(req).await.expect("success");
        assert_eq!(body["name"], json!("Acme"));

        let recorded = mock.recorded();
        assert_eq!(recorded.len(), 1);
        let r = &recorded[0];
        assert_eq!(r.method, "PATCH");
        assert_eq!(r.path, "/v2/clients/9");
        assert_eq!(r.query_value("from"), Some("2024-02-01"));
        assert_eq!(r.header("authorization"), Some("Bearer secret-token"));
        assert_eq!(r.header("x-account"), Some("42"));
        assert_eq!(r.body, Some(json!({"name": "Acme"})));
    }

    #[tokio::test]
    async fn non_success_status_becomes_status_error_with_detail() {
        let mock = MockUpstream::builder()
            .json(
                "POST",
                "/time_entries",
                422,
                json!({"message": "Project can't be blank"}),
            )
            .start()
            .await
            .expect("mock");
        let upstream = client(&mock.base_url, Arc::new(DefaultPolicy));

        let err = upstream
            .execute(UpstreamRequest::new(HttpMethod::Post, "/time_entries"))
            .await
            .unwrap_err();
        match err {
            UpstreamError::Status { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(
                    message,
                    "API returned 422 Unprocessable Entity: Project can't be blank"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_body_is_null_and_malformed_body_is_an_error() {
        let mock = MockUpstream::builder()
            .empty("DELETE", "/clients/1", 200)
            .text("GET", "/clients", 200, "application/json", "{not json")
            .start()
            .await
            .expect("mock");
        let upstream = client(&mock.base_url, Arc::new(DefaultPolicy));

        let v = upstream
            .execute(UpstreamRequest::new(HttpMethod::Delete, "/clients/1"))
            .await
            .expect("empty ok");
        assert_eq!(v, Value::Null);

        let err = upstream
            .execute(UpstreamRequest::new(HttpMethod::Get, "/clients"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Body(_)), "{err}");
    }

    #[tokio::test]
    async fn policy_can_reject_successful_bodies() {
        struct OkFlag;
        impl ResponsePolicy for OkFlag {
            fn check_body(&self, body: &Value) -> Result<(), String> {
                match body.get("ok") {
                    Some(Value::Bool(false)) => Err(error_detail(body)),
                    _ => Ok(()),
                }
            }
        }

        let mock = MockUpstream::builder()
            .json("POST", "/chat.postMessage", 200, json!({"ok": false, "error": "not_in_channel"}))
            .start()
            .await
            .expect("mock");
        let upstream = client(&mock.base_url, Arc::new(OkFlag));
        let err = upstream
            .execute(UpstreamRequest::new(HttpMethod::Post, "/chat.postMessage"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "not_in_channel");
    }

    #[tokio::test]
    async fn oversized_responses_are_rejected() {
        let mock = MockUpstream::builder()
            .json("GET", "/big", 200, json!({"data": "x".repeat(4096)}))
            .start()
            .await
            .expect("mock");
        let mut config = UpstreamConfig::new(&mock.base_url, Auth::None).expect("config");
        config.max_response_bytes = Some(1024);
        let upstream = UpstreamClient::new(config, Arc::new(DefaultPolicy)).expect("client");

        let err = upstream
            .execute(UpstreamRequest::new(HttpMethod::Get, "/big"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too large"), "{err}");
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_query_strings() {
        let upstream = client("http://127.0.0.1:1", Arc::new(DefaultPolicy));
        let mut req = UpstreamRequest::new(HttpMethod::Get, "/search");
        req.query.push(("key".into(), "hunter2".into()));
        let err = upstream.execute(req).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn fetch_external_checks_policy_and_status() {
        let mock = MockUpstream::builder()
            .text("GET", "/page", 200, "text/html; charset=utf-8", "<p>hi</p>")
            .empty("GET", "/missing", 404)
            .start()
            .await
            .expect("mock");

        let restricted = client(&mock.base_url, Arc::new(DefaultPolicy));
        let url = Url::parse(&mock.url("/page")).expect("url");
        let err = restricted
            .fetch_external(&url, &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Blocked(_)));

        let mut config = UpstreamConfig::new(&mock.base_url, Auth::None).expect("config");
        config.outbound = OutboundHttpSafety::permissive();
        let permissive = UpstreamClient::new(config, Arc::new(DefaultPolicy)).expect("client");

        let page = permissive
            .fetch_external(&url, &[("User-Agent", "test-agent")], Duration::from_secs(5))
            .await
            .expect("fetched");
        assert!(page.is_html());
        assert_eq!(page.body, b"<p>hi</p>");

        let missing = Url::parse(&mock.url("/missing")).expect("url");
        let err = permissive
            .fetch_external(&missing, &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404 Not Found");

        let recorded = mock.recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].header("user-agent"), Some("test-agent"));
        assert_eq!(recorded[0].header("authorization"), None);
    }

    fn permissive_client(base_url: &str) -> UpstreamClient {
        let mut config = UpstreamConfig::new(base_url, Auth::None).expect("config");
        config.outbound = OutboundHttpSafety::permissive();
        UpstreamClient::new(config, Arc::new(DefaultPolicy)).expect("client")
    }

    #[tokio::test]
    async fn fetch_external_follows_checked_redirects_and_reports_the_final_url() {
        let mock = MockUpstream::builder()
            .redirect("GET", "/old", 301, "/moved")
            .redirect("GET", "/moved", 302, "page")
            .text("GET", "/page", 200, "text/plain", "landed")
            .start()
            .await
            .expect("mock");

        let url = Url::parse(&mock.url("/old")).expect("url");
        let page = permissive_client(&mock.base_url)
            .fetch_external(&url, &[("User-Agent", "test-agent")], Duration::from_secs(5))
            .await
            .expect("fetched");
        assert_eq!(page.url.as_str(), mock.url("/page"));
        assert_eq!(page.body, b"landed");

        let recorded = mock.recorded();
        assert_eq!(recorded.len(), 3);
        assert!(recorded.iter().all(|r| r.header("user-agent") == Some("test-agent")));
    }

    #[tokio::test]
    async fn fetch_external_rechecks_each_redirect_target() {
        let mock = MockUpstream::builder()
            .redirect("GET", "/hop", 302, "ftp://files.example.com/secret")
            .start()
            .await
            .expect("mock");

        let url = Url::parse(&mock.url("/hop")).expect("url");
        let err = permissive_client(&mock.base_url)
            .fetch_external(&url, &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Blocked(_)), "{err}");
        assert!(err.to_string().contains("unsupported URL scheme 'ftp'"));
        assert_eq!(mock.recorded().len(), 1);
    }

    #[tokio::test]
    async fn fetch_external_stops_redirect_loops() {
        let mock = MockUpstream::builder()
            .redirect("GET", "/loop", 302, "/loop")
            .start()
            .await
            .expect("mock");

        let url = Url::parse(&mock.url("/loop")).expect("url");
        let err = permissive_client(&mock.base_url)
            .fetch_external(&url, &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too many redirects"), "{err}");
        assert_eq!(mock.recorded().len(), MAX_REDIRECTS + 1);
    }

    #[tokio::test]
    async fn fetch_external_without_redirects_reports_the_3xx() {
        let mock = MockUpstream::builder()
            .redirect("GET", "/old", 302, "/page")
            .text("GET", "/page", 200, "text/plain", "landed")
            .start()
            .await
            .expect("mock");

        let mut config = UpstreamConfig::new(&mock.base_url, Auth::None).expect("config");
        config.outbound = OutboundHttpSafety {
            redirects: RedirectPolicy::None,
            ..OutboundHttpSafety::permissive()
        };
        let client = UpstreamClient::new(config, Arc::new(DefaultPolicy)).expect("client");

        let url = Url::parse(&mock.url("/old")).expect("url");
        let err = client
            .fetch_external(&url, &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 302 Found");
        assert_eq!(mock.recorded().len(), 1);
    }
}
