//! Test helpers: a scripted mock upstream HTTP server and a stdio MCP client.

use anyhow::Context as _;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpListener;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
enum MockBody {
    Json(Value),
    Text { content_type: String, body: String },
    Redirect { location: String },
    Empty,
}

#[derive(Debug, Clone)]
struct MockRoute {
    method: String,
    path: String,
    status: u16,
    body: MockBody,
}

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Header names are lowercase.
    pub headers: Vec<(String, String)>,
    /// Parsed JSON body, if the body was non-empty JSON.
    pub body: Option<Value>,
}

impl RecordedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
struct MockState {
    routes: Arc<Vec<MockRoute>>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Builder for [`MockUpstream`]. Routes match on method and exact path; anything else is a 404.
#[derive(Debug, Default)]
pub struct MockUpstreamBuilder {
    routes: Vec<MockRoute>,
}

impl MockUpstreamBuilder {
    #[must_use]
    pub fn json(mut self, method: &str, path: &str, status: u16, body: Value) -> Self {
        self.routes.push(MockRoute {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            status,
            body: MockBody::Json(body),
        });
        self
    }

    #[must_use]
    pub fn text(mut self, method: &str, path: &str, status: u16, content_type: &str, body: &str) -> Self {
        self.routes.push(MockRoute {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            status,
            body: MockBody::Text {
                content_type: content_type.to_string(),
                body: body.to_string(),
            },
        });
        self
    }

    #[must_use]
    pub fn empty(mut self, method: &str, path: &str, status: u16) -> Self {
        self.routes.push(MockRoute {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            status,
            body: MockBody::Empty,
        });
        self
    }

    /// Answer with `status` and a `Location` header. Relative locations are sent as given.
    #[must_use]
    pub fn redirect(mut self, method: &str, path: &str, status: u16, location: &str) -> Self {
        self.routes.push(MockRoute {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            status,
            body: MockBody::Redirect {
                location: location.to_string(),
            },
        });
        self
    }

    /// Bind an ephemeral localhost port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(self) -> anyhow::Result<MockUpstream> {
        let state = MockState {
            routes: Arc::new(self.routes),
            recorded: Arc::new(Mutex::new(Vec::new())),
        };
        let recorded = state.recorded.clone();

        let app = Router::new().fallback(handle).with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock upstream")?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(MockUpstream {
            base_url: format!("http://{addr}"),
            recorded,
            shutdown: Some(shutdown_tx),
        })
    }
}

/// Local HTTP server standing in for an upstream REST API.
pub struct MockUpstream {
    /// `http://127.0.0.1:<port>`, without a trailing slash.
    pub base_url: String,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    #[must_use]
    pub fn builder() -> MockUpstreamBuilder {
        MockUpstreamBuilder::default()
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedRequest> {
        self.recorded.lock().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let query = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();
    let headers = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = (!body.is_empty())
        .then(|| serde_json::from_slice::<Value>(&body).ok())
        .flatten();

    state.recorded.lock().push(RecordedRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query,
        headers,
        body,
    });

    let Some(route) = state
        .routes
        .iter()
        .find(|r| r.method == method.as_str() && r.path == uri.path())
    else {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "message": format!("no mock route for {method} {}", uri.path()) })),
        )
            .into_response();
    };

    let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match &route.body {
        MockBody::Json(v) => (status, axum::Json(v.clone())).into_response(),
        MockBody::Text { content_type, body } => {
            (status, [(header::CONTENT_TYPE, content_type.clone())], body.clone()).into_response()
        }
        MockBody::Redirect { location } => (status, [(header::LOCATION, location.clone())]).into_response(),
        MockBody::Empty => status.into_response(),
    }
}

/// Result of a `tools/call` as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

/// A spawned stdio MCP server plus a line-oriented JSON-RPC client for it.
///
/// The child is killed when the session is dropped.
pub struct StdioSession {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: i64,
    timeout: Duration,
}

impl StdioSession {
    /// Spawn `program` with exactly the given environment (the parent's is not inherited).
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    pub fn spawn(program: &str, envs: &[(&str, &str)]) -> anyhow::Result<Self> {
        let mut child = Command::new(program)
            .env_clear()
            .envs(envs.iter().copied())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn {program}"))?;
        let stdin = child.stdin.take().context("child stdin")?;
        let stdout = child.stdout.take().context("child stdout")?;
        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            timeout: Duration::from_secs(15),
        })
    }

    /// Write one raw line to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin is closed.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        let stdin = self.stdin.as_mut().context("stdin already closed")?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Next message from the server.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, EOF or a non-JSON line.
    pub async fn read_message(&mut self) -> anyhow::Result<Value> {
        let line = tokio::time::timeout(self.timeout, self.stdout.next_line())
            .await
            .context("timed out waiting for server output")??
            .context("server closed stdout")?;
        serde_json::from_str(&line).with_context(|| format!("server wrote non-JSON line: {line}"))
    }

    /// Send a request and wait for the response with the matching id.
    ///
    /// # Errors
    ///
    /// See [`StdioSession::read_message`].
    pub async fn request(&mut self, method: &str, params: Value) -> anyhow::Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        let msg = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        self.send_line(&msg.to_string()).await?;
        loop {
            let reply = self.read_message().await?;
            if reply.get("id") == Some(&json!(id)) {
                return Ok(reply);
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if stdin is closed.
    pub async fn notify(&mut self, method: &str, params: Value) -> anyhow::Result<()> {
        let msg = json!({ "jsonrpc": "2.0", "method": method, "params": params });
        self.send_line(&msg.to_string()).await
    }

    /// `initialize` followed by `notifications/initialized`; returns the initialize result.
    ///
    /// # Errors
    ///
    /// Returns an error if the server answers with a JSON-RPC error.
    pub async fn initialize(&mut self) -> anyhow::Result<Value> {
        let reply = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "unrelated-test", "version": "0" }
                }),
            )
            .await?;
        let result = reply
            .get("result")
            .cloned()
            .with_context(|| format!("initialize failed: {reply}"))?;
        self.notify("notifications/initialized", json!({})).await?;
        Ok(result)
    }

    /// Names of the tools the server lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the response has no tool array.
    pub async fn tool_names(&mut self) -> anyhow::Result<Vec<String>> {
        let reply = self.request("tools/list", json!({})).await?;
        let tools = reply
            .pointer("/result/tools")
            .and_then(Value::as_array)
            .with_context(|| format!("unexpected tools/list reply: {reply}"))?;
        Ok(tools
            .iter()
            .filter_map(|t| t.get("name").and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if the reply is a protocol error rather than a tool result.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> anyhow::Result<ToolOutcome> {
        let reply = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        let result = reply
            .get("result")
            .with_context(|| format!("tools/call returned an error: {reply}"))?;
        let text = result
            .pointer("/content/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let is_error = result.get("isError").and_then(Value::as_bool).unwrap_or(false);
        Ok(ToolOutcome { text, is_error })
    }

    /// Close stdin and wait for the server to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the process does not exit in time.
    pub async fn shutdown(mut self) -> anyhow::Result<ExitStatus> {
        drop(self.stdin.take());
        let status = tokio::time::timeout(self.timeout, self.child.wait())
            .await
            .context("server did not exit after stdin closed")??;
        Ok(status)
    }
}

/// Run `program` to completion with exactly the given environment and stdin closed.
///
/// # Errors
///
/// Returns an error if the process cannot be run or does not exit in time.
pub async fn run_to_exit(program: &str, envs: &[(&str, &str)]) -> anyhow::Result<std::process::Output> {
    let child = Command::new(program)
        .env_clear()
        .envs(envs.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawn {program}"))?;
    let output = tokio::time::timeout(Duration::from_secs(15), child.wait_with_output())
        .await
        .context("process did not exit")??;
    Ok(output)
}
