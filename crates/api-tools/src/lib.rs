//! Shared runtime for the Unrelated REST adapters.
//!
//! Each adapter (Harvest, Brave Search, Slack) declares a static table of
//! [`registry::OperationSpec`]s. This crate turns such a table into an MCP tool server:
//! arguments are coerced against the declared parameters, each invocation makes exactly one
//! upstream HTTP call, and the response is rendered to text.
//!
//! Invocations are processed serially; there is no shared mutable state.

pub mod args;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod safety;
pub mod schema;
pub mod semantics;
pub mod stdio;
pub mod upstream;

pub use args::{ArgValue, Arguments};
pub use dispatcher::{Dispatcher, InvocationRequest, InvocationResult};
pub use error::{ConfigError, ErrorKind, Failure, RegistryError};
pub use registry::{CustomHandler, Handler, OperationSpec, Registry};
pub use schema::{Literal, ParamKind, ParameterSpec};
pub use semantics::HttpMethod;
pub use stdio::{McpServer, ServerIdentity, serve_stdio};
pub use upstream::{Auth, ResponsePolicy, UpstreamClient, UpstreamConfig, UpstreamError};
