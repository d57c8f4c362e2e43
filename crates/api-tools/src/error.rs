//! Error types shared by the adapters.
//!
//! Two families live here:
//! - [`Failure`]: the per-invocation outcome returned to the assistant client. It is a value,
//!   never a panic, and never terminates the process.
//! - [`ConfigError`] / [`RegistryError`]: startup errors. They are fatal.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classification of a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No operation is registered under the requested name.
    UnknownOperation,
    /// A required parameter was absent (or `null`).
    MissingParameter,
    /// A parameter could not be coerced to its declared kind.
    InvalidParameterType,
    /// An enum parameter was outside its allowed values.
    InvalidEnumValue,
    /// A parameter had the right type but an unacceptable value (range, blank string).
    InvalidParameterValue,
    /// The upstream call failed: transport, timeout, non-2xx, malformed body.
    UpstreamError,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownOperation => "UnknownOperation",
            Self::MissingParameter => "MissingParameter",
            Self::InvalidParameterType => "InvalidParameterType",
            Self::InvalidEnumValue => "InvalidEnumValue",
            Self::InvalidParameterValue => "InvalidParameterValue",
            Self::UpstreamError => "UpstreamError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed invocation: a kind plus a human-readable message.
///
/// For [`ErrorKind::MissingParameter`] the message is exactly the parameter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_operation(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownOperation, name)
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingParameter, name)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamError, message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::UnknownOperation => write!(f, "Unknown tool: {}", self.message),
            ErrorKind::MissingParameter => {
                write!(f, "Missing required parameter: {}", self.message)
            }
            ErrorKind::InvalidParameterType => write!(f, "Invalid parameter type: {}", self.message),
            ErrorKind::InvalidEnumValue => write!(f, "Invalid enum value: {}", self.message),
            ErrorKind::InvalidParameterValue => {
                write!(f, "Invalid parameter value: {}", self.message)
            }
            ErrorKind::UpstreamError => write!(f, "Upstream error: {}", self.message),
        }
    }
}

impl std::error::Error for Failure {}

/// Errors raised while building a [`crate::registry::Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate operation '{0}'")]
    DuplicateOperation(String),

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("operation '{operation}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { operation: String, parameter: String },

    #[error("operation '{operation}' is invalid: {reason}")]
    InvalidOperation { operation: String, reason: String },
}

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting (usually a credential) is absent or blank.
    #[error("Configuration error: missing required setting {0}")]
    Missing(&'static str),

    /// A base URL could not be parsed.
    #[error("Configuration error: invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// Any other invalid setting.
    #[error("Configuration error: {0}")]
    Invalid(String),

    /// The shared HTTP client could not be constructed.
    #[error("Configuration error: failed to build HTTP client: {0}")]
    Client(String),

    /// The upstream rejected the configured credentials at startup.
    #[error("Configuration error: credential check failed: {0}")]
    CredentialCheck(String),

    #[error("Configuration error: {0}")]
    Registry(#[from] RegistryError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
