use serde_json::{Value, json};
use unrelated_api_tools::runtime::RuntimeArgs;
use unrelated_api_tools::{Dispatcher, ErrorKind, InvocationResult};
use unrelated_brave_search_mcp::{BraveConfig, build_dispatcher};
use unrelated_test_support::MockUpstream;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Test Page</title><style>body { font-family: Arial; }</style></head>
<body>
  <h1>Test Page Heading</h1>
  <p>This is a paragraph.</p>
  <script>console.log("This should be removed");</script>
</body>
</html>"#;

fn dispatcher(mock: &MockUpstream, allow_private_fetch: bool) -> Dispatcher {
    let config = BraveConfig {
        api_key: "brave-test-key".to_string(),
        base_url: mock.url("/res/v1"),
        allow_private_fetch,
    };
    build_dispatcher(&config, &RuntimeArgs::default()).expect("dispatcher")
}

fn args(v: Value) -> serde_json::Map<String, Value> {
    serde_json::from_value(v).expect("object arguments")
}

#[tokio::test]
async fn web_search_sends_key_and_defaults() {
    let mock = MockUpstream::builder()
        .json(
            "GET",
            "/res/v1/web/search",
            200,
            json!({"web": {"results": [
                {"title": "Test Result 1", "url": "https://example.com/1", "description": "This is test result 1"},
                {"title": "Test Result 2", "url": "https://example.com/2", "description": "This is test result 2"}
            ]}}),
        )
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock, false);

    let result = d.invoke("brave_web_search", &args(json!({"query": "test query"}))).await;
    assert!(result.is_success(), "{result:?}");
    let text = result.text();
    assert!(text.starts_with("[Result 1]\n  Title: Test Result 1"), "{text}");
    assert!(text.contains("[Result 2]\n  Title: Test Result 2\n  URL: https://example.com/2"));

    let sent = &mock.recorded()[0];
    assert_eq!(sent.header("x-subscription-token"), Some("brave-test-key"));
    assert_eq!(sent.header("accept"), Some("application/json"));
    assert_eq!(sent.query_value("q"), Some("test query"));
    assert_eq!(sent.query_value("count"), Some("10"));
    assert_eq!(sent.query_value("offset"), Some("0"));
    assert_eq!(sent.query_value("search_lang"), Some("en"));
}

#[tokio::test]
async fn empty_results_are_not_an_error() {
    let mock = MockUpstream::builder()
        .json("GET", "/res/v1/web/search", 200, json!({"web": {"results": []}}))
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock, false);

    let result = d.invoke("brave_web_search", &args(json!({"query": "zzzz"}))).await;
    assert_eq!(
        result,
        InvocationResult::Success {
            text: "No search results found for your query.".to_string()
        }
    );
}

#[tokio::test]
async fn bodies_without_web_results_are_upstream_errors() {
    let mock = MockUpstream::builder()
        .json("GET", "/res/v1/web/search", 200, json!({"query": {"original": "x"}}))
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock, false);

    let InvocationResult::Failure(failure) = d.invoke("brave_web_search", &args(json!({"query": "x"}))).await
    else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, ErrorKind::UpstreamError);
    assert_eq!(failure.message, "Unexpected response format from search API");
}

#[tokio::test]
async fn auth_and_rate_limit_failures_are_explained() {
    let mock = MockUpstream::builder()
        .json("GET", "/res/v1/web/search", 401, json!({"message": "bad token"}))
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock, false);
    let InvocationResult::Failure(failure) = d.invoke("brave_web_search", &args(json!({"query": "x"}))).await
    else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, ErrorKind::UpstreamError);
    assert_eq!(failure.message, "API authentication failed - check your BRAVE_API_KEY");

    let mock = MockUpstream::builder()
        .json("GET", "/res/v1/web/search", 429, json!({}))
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock, false);
    let result = d.invoke("brave_web_search", &args(json!({"query": "x"}))).await;
    assert!(result.text().contains("Rate limit exceeded"), "{}", result.text());
}

#[tokio::test]
async fn count_above_limit_is_rejected_without_a_request() {
    let mock = MockUpstream::builder().start().await.expect("mock");
    let d = dispatcher(&mock, false);

    let result = d
        .invoke("brave_web_search", &args(json!({"query": "x", "count": 50})))
        .await;
    assert_eq!(result.kind(), Some(ErrorKind::InvalidParameterValue));
    let missing = d.invoke("brave_web_search", &args(json!({"count": 5}))).await;
    assert_eq!(missing.kind(), Some(ErrorKind::MissingParameter));
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn fetch_website_returns_page_text_without_credentials() {
    let mock = MockUpstream::builder()
        .text("GET", "/page", 200, "text/html; charset=utf-8", PAGE)
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock, true);

    let result = d.invoke("fetch_website", &args(json!({"url": mock.url("/page")}))).await;
    assert_eq!(result.text(), "Test Page Heading\nThis is a paragraph.");

    let sent = &mock.recorded()[0];
    assert_eq!(sent.header("x-subscription-token"), None);
    assert!(sent.header("user-agent").is_some_and(|ua| ua.starts_with("Mozilla/5.0")));
}

#[tokio::test]
async fn fetch_website_reports_http_status() {
    let mock = MockUpstream::builder().start().await.expect("mock");
    let d = dispatcher(&mock, true);

    let result = d
        .invoke("fetch_website", &args(json!({"url": mock.url("/missing")})))
        .await;
    let InvocationResult::Failure(failure) = result else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, ErrorKind::UpstreamError);
    assert_eq!(failure.message, "HTTP 404 Not Found");
}

#[tokio::test]
async fn fetch_website_blocks_loopback_by_default() {
    let mock = MockUpstream::builder()
        .text("GET", "/page", 200, "text/html", PAGE)
        .start()
        .await
        .expect("mock");
    let d = dispatcher(&mock, false);

    let result = d.invoke("fetch_website", &args(json!({"url": mock.url("/page")}))).await;
    assert_eq!(result.kind(), Some(ErrorKind::UpstreamError));
    assert!(result.text().contains("blocked"), "{}", result.text());
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn fetch_website_rejects_non_http_urls() {
    let mock = MockUpstream::builder().start().await.expect("mock");
    let d = dispatcher(&mock, true);

    let result = d
        .invoke("fetch_website", &args(json!({"url": "ftp://example.com/file"})))
        .await;
    assert_eq!(result.kind(), Some(ErrorKind::InvalidParameterType));
    assert!(mock.recorded().is_empty());
}
