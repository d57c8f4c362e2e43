//! Request dispatcher: lookup -> validate -> one upstream call -> render.

use crate::args::coerce_arguments;
use crate::error::{ErrorKind, Failure};
use crate::registry::{Handler, Registry};
use crate::upstream::{UpstreamClient, UpstreamRequest};
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// One tool call as received from the transport (`tools/call` params).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvocationRequest {
    #[serde(rename = "name")]
    pub operation: String,
    #[serde(default)]
    pub arguments: Option<JsonObject>,
}

/// Outcome of exactly one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    Success { text: String },
    Failure(Failure),
}

impl InvocationResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(f) => Some(f.kind),
        }
    }

    /// Text shown to the assistant: the rendered output, or the failure description.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Success { text } => text.clone(),
            Self::Failure(f) => f.to_string(),
        }
    }

    #[must_use]
    pub fn into_call_tool_result(self) -> CallToolResult {
        match self {
            Self::Success { text } => CallToolResult::success(vec![Content::text(text)]),
            Self::Failure(f) => CallToolResult {
                content: vec![Content::text(f.to_string())],
                structured_content: None,
                is_error: Some(true),
                meta: None,
            },
        }
    }
}

impl From<Result<String, Failure>> for InvocationResult {
    fn from(value: Result<String, Failure>) -> Self {
        match value {
            Ok(text) => Self::Success { text },
            Err(f) => Self::Failure(f),
        }
    }
}

/// Owns the registry and the upstream client for one service.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
    upstream: UpstreamClient,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Registry, upstream: UpstreamClient) -> Self {
        Self { registry, upstream }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.list_tools()
    }

    pub async fn dispatch(&self, request: &InvocationRequest) -> InvocationResult {
        let empty = JsonObject::new();
        let arguments = request.arguments.as_ref().unwrap_or(&empty);
        self.invoke(&request.operation, arguments).await
    }

    /// Run one operation to completion. Never panics on bad input; every outcome is a value.
    pub async fn invoke(&self, name: &str, arguments: &JsonObject) -> InvocationResult {
        let result = self.try_invoke(name, arguments).await;
        match &result {
            Ok(text) => info!(operation = name, bytes = text.len(), "invocation succeeded"),
            Err(f) => warn!(operation = name, kind = %f.kind, error = %f.message, "invocation failed"),
        }
        result.into()
    }

    async fn try_invoke(&self, name: &str, arguments: &JsonObject) -> Result<String, Failure> {
        let spec = self
            .registry
            .lookup(name)
            .map_err(|_| Failure::unknown_operation(name))?;

        let args = coerce_arguments(spec.params, arguments)?;
        let ignored: Vec<&str> = arguments
            .keys()
            .map(String::as_str)
            .filter(|k| !spec.params.iter().any(|p| p.name == *k))
            .collect();
        if !ignored.is_empty() {
            debug!(operation = name, ?ignored, "ignoring undeclared arguments");
        }
        debug!(operation = name, arguments = args.len(), "arguments validated");

        let body = match spec.handler {
            Handler::Endpoint { method, path } => {
                let request = UpstreamRequest::from_arguments(method, path, spec.params, &args)
                    .map_err(|e| Failure::upstream(e.to_string()))?;
                self.upstream.execute(request).await
            }
            Handler::Custom(handler) => handler.call(&self.upstream, &args).await,
        }
        .map_err(|e| Failure::upstream(e.to_string()))?;

        Ok((spec.render)(&body, &args))
    }
}
