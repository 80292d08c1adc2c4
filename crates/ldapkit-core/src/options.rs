//! Connection option codes and values.
//!
//! Option codes follow the numbering used by the OpenLDAP client library so that existing
//! configuration maps can be carried over unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size limit for search results.
pub const SIZELIMIT: i32 = 0x03;
/// Time limit (seconds) for search operations.
pub const TIMELIMIT: i32 = 0x04;
/// Whether referrals are chased automatically.
pub const REFERRALS: i32 = 0x08;
/// LDAP protocol version.
pub const PROTOCOL_VERSION: i32 = 0x11;
/// Timeout (seconds) for establishing the network connection.
pub const NETWORK_TIMEOUT: i32 = 0x5005;
/// Path to a PEM encoded CA certificate.
pub const X_TLS_CACERTFILE: i32 = 0x6002;
/// Server certificate verification policy.
pub const X_TLS_REQUIRE_CERT: i32 = 0x6006;

/// Never request or check the server certificate.
pub const X_TLS_NEVER: i64 = 0;
/// Require and verify the server certificate.
pub const X_TLS_HARD: i64 = 1;
/// Require and verify the server certificate (alias of hard).
pub const X_TLS_DEMAND: i64 = 2;
/// Request the certificate but proceed when it is missing or invalid.
pub const X_TLS_ALLOW: i64 = 3;
/// Request the certificate and fail only when an invalid one is supplied.
pub const X_TLS_TRY: i64 = 4;

/// Value supplied for a connection option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// String value
    Str(String),
}

impl OptionValue {
    /// Returns the value as an integer, accepting booleans and numeric strings.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Bool(value) => Some(i64::from(*value)),
            Self::Str(value) => value.trim().parse().ok(),
        }
    }

    /// Returns the value as a boolean, accepting integers.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Int(value) => Some(*value != 0),
            Self::Str(value) => match value.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
        }
    }

    /// Returns the value as a string slice when it holds one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}
