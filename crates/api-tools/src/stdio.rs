//! MCP over stdio: newline-delimited JSON-RPC 2.0.
//!
//! Messages are handled strictly one at a time. The next line is not read until the previous
//! invocation has produced its response.

use crate::dispatcher::{Dispatcher, InvocationRequest};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, trace, warn};

/// Protocol version answered when the client does not ask for one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read from stdin: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write to stdout: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Line-delimited JSON reader/writer, generic for tests.
pub struct StdioTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Next line with surrounding whitespace removed; `None` on EOF.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Read`] on I/O failure.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(TransportError::Read)?;
        if n == 0 {
            return Ok(None);
        }
        trace!(len = line.len(), "read message");
        Ok(Some(line.trim().to_string()))
    }

    /// # Errors
    ///
    /// Returns [`TransportError`] if the message cannot be serialized or written.
    pub async fn write_message(&mut self, message: &Value) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        self.writer.write_all(&line).await.map_err(TransportError::Write)?;
        self.writer.flush().await.map_err(TransportError::Write)?;
        trace!(len = line.len(), "wrote message");
        Ok(())
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner(), self.writer)
    }
}

/// What the server reports about itself in `initialize`.
#[derive(Debug, Clone, Copy)]
pub struct ServerIdentity {
    pub name: &'static str,
    pub version: &'static str,
    pub instructions: Option<&'static str>,
}

pub struct McpServer {
    dispatcher: Dispatcher,
    identity: ServerIdentity,
}

impl McpServer {
    #[must_use]
    pub fn new(dispatcher: Dispatcher, identity: ServerIdentity) -> Self {
        Self {
            dispatcher,
            identity,
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve until the input reaches EOF.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if reading or writing fails. Malformed messages are answered,
    /// not treated as errors.
    pub async fn serve<R, W>(&self, transport: &mut StdioTransport<R, W>) -> Result<(), TransportError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        while let Some(line) = transport.read_line().await? {
            if line.is_empty() {
                continue;
            }
            let response = match serde_json::from_str::<Value>(&line) {
                Ok(message) => self.handle_message(&message).await,
                Err(e) => {
                    warn!(error = %e, "unparsable JSON-RPC message");
                    Some(jsonrpc_err(&Value::Null, PARSE_ERROR, &format!("Parse error: {e}")))
                }
            };
            if let Some(response) = response {
                transport.write_message(&response).await?;
            }
        }
        info!("input closed, shutting down");
        Ok(())
    }

    /// Answer one JSON-RPC message. Notifications and client responses yield `None`.
    pub async fn handle_message(&self, message: &Value) -> Option<Value> {
        let method = message.get("method").and_then(Value::as_str);

        let Some(id) = message.get("id") else {
            match method {
                Some(m) => debug!(method = m, "notification"),
                None => warn!("ignoring message without id or method"),
            }
            return None;
        };

        let Some(method) = method else {
            if message.get("result").is_some() || message.get("error").is_some() {
                return None;
            }
            return Some(jsonrpc_err(id, INVALID_REQUEST, "Invalid Request: missing method"));
        };

        let params = message.get("params").cloned().unwrap_or(Value::Null);
        debug!(method, "request");

        let response = match method {
            "initialize" => jsonrpc_ok(id, &self.initialize_result(&params)),
            "ping" => jsonrpc_ok(id, &json!({})),
            "tools/list" => serialized(id, &json!({ "tools": self.tools_json() })),
            "tools/call" => match serde_json::from_value::<InvocationRequest>(params) {
                Ok(request) => {
                    let result = self.dispatcher.dispatch(&request).await;
                    serialized(id, &result.into_call_tool_result())
                }
                Err(e) => jsonrpc_err(id, INVALID_PARAMS, &format!("Invalid params: {e}")),
            },
            other => jsonrpc_err(id, METHOD_NOT_FOUND, &format!("Method not found: {other}")),
        };
        Some(response)
    }

    fn initialize_result(&self, params: &Value) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        let mut result = json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": { "name": self.identity.name, "version": self.identity.version },
        });
        if let Some(instructions) = self.identity.instructions {
            result["instructions"] = json!(instructions);
        }
        result
    }

    fn tools_json(&self) -> Value {
        Value::Array(
            self.dispatcher
                .list_tools()
                .iter()
                .filter_map(|tool| serde_json::to_value(tool).ok())
                .collect(),
        )
    }
}

/// Serve on the process's stdin/stdout.
///
/// # Errors
///
/// See [`McpServer::serve`].
pub async fn serve_stdio(server: &McpServer) -> Result<(), TransportError> {
    let mut transport = StdioTransport::new(tokio::io::stdin(), tokio::io::stdout());
    server.serve(&mut transport).await
}

fn serialized<T: Serialize>(id: &Value, result: &T) -> Value {
    match serde_json::to_value(result) {
        Ok(v) => jsonrpc_ok(id, &v),
        Err(e) => jsonrpc_err(id, INTERNAL_ERROR, &format!("failed to serialize result: {e}")),
    }
}

fn jsonrpc_ok(id: &Value, result: &Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn jsonrpc_err(id: &Value, code: i32, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
