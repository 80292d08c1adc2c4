//! Error types for directory connections.
//!
//! This module provides the error hierarchy shared by every ldapkit crate, together with the
//! structured error record returned when a caller asks for details about the last failed
//! directory operation.

use serde::Serialize;
use thiserror::Error;

/// Main error type for directory operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Host input normalized to an empty set or produced an unusable address
    #[error("Invalid host configuration: {0}")]
    InvalidHostConfiguration(String),

    /// The transport failed to establish a session
    #[error("Connection failed: {0}")]
    Connection(String),

    /// One or more option-set calls were rejected by the transport
    #[error("Failed to set connection options: {failed:?}")]
    OptionSetFailure {
        /// Option codes that were rejected, in the order they were attempted
        failed: Vec<i32>,
    },

    /// An operation required an open connection
    #[error("Not connected to a directory server")]
    NotConnected,

    /// Bind was rejected by the server
    #[error("Bind failed ({code}): {message}")]
    Bind {
        /// LDAP result code
        code: i32,
        /// Server or client supplied message
        message: String,
    },

    /// A directory operation returned a non-success result code
    #[error("Operation failed ({code}): {message}")]
    Operation {
        /// LDAP result code
        code: i32,
        /// Server or client supplied message
        message: String,
    },

    /// Operation timed out
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to parse serialized configuration
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Specialized result type for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured record describing the last failed directory operation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DetailedError {
    /// LDAP result code
    pub code: i32,
    /// Human-readable message for the result code
    pub message: String,
    /// Diagnostic message reported by the server, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_message: Option<String>,
}

impl DetailedError {
    /// Creates a new detailed error record.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>, diagnostic_message: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            diagnostic_message,
        }
    }
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidHostConfiguration(_) => "INVALID_HOST_CONFIGURATION",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::OptionSetFailure { .. } => "OPTION_SET_FAILURE",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Bind { .. } => "BIND_FAILED",
            Self::Operation { .. } => "OPERATION_FAILED",
            Self::Timeout(_) => "TIMEOUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ParseError(_) => "PARSE_ERROR",
        }
    }

    /// Returns the LDAP result code carried by this error, if any.
    #[must_use]
    pub const fn result_code(&self) -> Option<i32> {
        match self {
            Self::Bind { code, .. } | Self::Operation { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
