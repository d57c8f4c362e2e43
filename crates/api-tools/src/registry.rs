//! Endpoint registry: operation name -> handler + declared parameters.

use crate::args::Arguments;
use crate::error::RegistryError;
use crate::schema::{ParamLocation, ParameterSpec, input_schema};
use crate::semantics::{HttpMethod, annotations_for_method};
use crate::upstream::{UpstreamClient, UpstreamError};
use async_trait::async_trait;
use rmcp::model::Tool;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Turns a decoded upstream body (and the validated arguments) into the tool's text output.
pub type Renderer = fn(&Value, &Arguments) -> String;

/// Operation whose single outbound request is not a plain call to the service base URL.
#[async_trait]
pub trait CustomHandler: Send + Sync {
    /// Method used for tool annotations.
    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    async fn call(&self, upstream: &UpstreamClient, arguments: &Arguments) -> Result<Value, UpstreamError>;
}

#[derive(Clone, Copy)]
pub enum Handler {
    /// One request to `{base_url}{path}`; parameters are routed by their location.
    Endpoint { method: HttpMethod, path: &'static str },
    Custom(&'static dyn CustomHandler),
}

impl Handler {
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::Endpoint { method, .. } => *method,
            Self::Custom(h) => h.method(),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endpoint { method, path } => write!(f, "Endpoint({method} {path})"),
            Self::Custom(h) => write!(f, "Custom({})", h.method()),
        }
    }
}

/// Static declaration of one operation.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: Handler,
    pub params: &'static [ParameterSpec],
    pub render: Renderer,
}

impl OperationSpec {
    /// MCP tool descriptor for this operation.
    #[must_use]
    pub fn tool(&self) -> Tool {
        let mut tool = Tool::new(self.name, self.description, Arc::new(input_schema(self.params)));
        tool.annotations = Some(annotations_for_method(self.handler.method()));
        tool
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.params.len());
        for param in self.params {
            if seen.contains(&param.name) {
                return Err(RegistryError::DuplicateParameter {
                    operation: self.name.to_string(),
                    parameter: param.name.to_string(),
                });
            }
            seen.push(param.name);
        }

        match self.handler {
            Handler::Endpoint { path, .. } => {
                for param in self.params.iter().filter(|p| p.location == ParamLocation::Path) {
                    if !path.contains(&format!("{{{}}}", param.wire_name())) {
                        return Err(RegistryError::InvalidOperation {
                            operation: self.name.to_string(),
                            reason: format!("path '{path}' has no placeholder for '{}'", param.name),
                        });
                    }
                    if !param.required {
                        return Err(RegistryError::InvalidOperation {
                            operation: self.name.to_string(),
                            reason: format!("path parameter '{}' must be required", param.name),
                        });
                    }
                }
            }
            Handler::Custom(_) => {
                if let Some(param) = self.params.iter().find(|p| p.location == ParamLocation::Path) {
                    return Err(RegistryError::InvalidOperation {
                        operation: self.name.to_string(),
                        reason: format!("custom handlers take no path parameters ('{}')", param.name),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Name-indexed set of operations, built once at startup.
#[derive(Debug, Default)]
pub struct Registry {
    operations: Vec<&'static OperationSpec>,
    index: HashMap<&'static str, usize>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// See [`Registry::register`].
    pub fn from_specs(specs: &'static [OperationSpec]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register_all(specs)?;
        Ok(registry)
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateOperation`] if the name is already registered, or a
    /// validation error for malformed parameter declarations.
    pub fn register(&mut self, spec: &'static OperationSpec) -> Result<(), RegistryError> {
        if self.index.contains_key(spec.name) {
            return Err(RegistryError::DuplicateOperation(spec.name.to_string()));
        }
        spec.validate()?;
        self.index.insert(spec.name, self.operations.len());
        self.operations.push(spec);
        Ok(())
    }

    /// # Errors
    ///
    /// Stops at the first spec [`Registry::register`] rejects.
    pub fn register_all(&mut self, specs: &'static [OperationSpec]) -> Result<(), RegistryError> {
        specs.iter().try_for_each(|spec| self.register(spec))
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownOperation`] if no operation has this name.
    pub fn lookup(&self, name: &str) -> Result<&'static OperationSpec, RegistryError> {
        self.index
            .get(name)
            .map(|&i| self.operations[i])
            .ok_or_else(|| RegistryError::UnknownOperation(name.to_string()))
    }

    /// Operations in registration order.
    pub fn operations(&self) -> impl Iterator<Item = &'static OperationSpec> + '_ {
        self.operations.iter().copied()
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.operations().map(OperationSpec::tool).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
