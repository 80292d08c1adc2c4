//! Connection configuration.
//!
//! This module holds the transport-security mode, default port, timeouts and the option map
//! applied to a directory connection, along with the facts derived from them (URI scheme,
//! whether passwords may be changed over the connection).

use crate::options::OptionValue;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Default LDAP port.
pub const DEFAULT_PORT: u16 = 389;
/// Default LDAPS port.
pub const DEFAULT_SSL_PORT: u16 = 636;
/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5;
/// Default operation timeout (seconds).
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Plain LDAP URI scheme, also used with STARTTLS.
pub const LDAP_SCHEME: &str = "ldap://";
/// LDAP over SSL URI scheme.
pub const LDAPS_SCHEME: &str = "ldaps://";

/// Transport-security mode of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecureTransport {
    /// Plain connection
    #[default]
    None,
    /// Encrypted before any protocol exchange (`ldaps://`)
    Ssl,
    /// Negotiated in-band with STARTTLS after a plain connection
    Tls,
}

/// Configuration for a directory connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConnectionConfig {
    /// Port used when `connect` is not given one
    #[validate(range(min = 1))]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Transport-security mode
    #[serde(default)]
    pub secure_transport: SecureTransport,

    /// Timeout for establishing a session, in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Timeout for individual operations, in seconds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// Whether to verify server certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to a custom CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Options applied to the transport before connecting, keyed by option code
    #[serde(default)]
    pub options: BTreeMap<i32, OptionValue>,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

const fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}

const fn default_tls_verify() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            secure_transport: SecureTransport::None,
            connection_timeout_secs: default_connection_timeout_secs(),
            operation_timeout_secs: default_operation_timeout_secs(),
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            options: BTreeMap::new(),
        }
    }
}

impl ConnectionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Checks the configuration ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`](crate::Error::ValidationError) describing the invalid
    /// fields.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }

    /// Sets the transport-security mode. The last call wins.
    pub fn set_secure_transport(&mut self, mode: SecureTransport) {
        self.secure_transport = mode;
    }

    /// Enables or disables SSL.
    ///
    /// Disabling only has an effect while SSL is the active mode.
    pub fn ssl(&mut self, enabled: bool) {
        self.toggle(SecureTransport::Ssl, enabled);
    }

    /// Enables or disables STARTTLS.
    ///
    /// Disabling only has an effect while TLS is the active mode.
    pub fn tls(&mut self, enabled: bool) {
        self.toggle(SecureTransport::Tls, enabled);
    }

    fn toggle(&mut self, mode: SecureTransport, enabled: bool) {
        if enabled {
            self.secure_transport = mode;
        } else if self.secure_transport == mode {
            self.secure_transport = SecureTransport::None;
        }
    }

    /// Returns the active transport-security mode.
    #[must_use]
    pub const fn secure_transport(&self) -> SecureTransport {
        self.secure_transport
    }

    /// Returns true when SSL is active.
    #[must_use]
    pub fn is_using_ssl(&self) -> bool {
        self.secure_transport == SecureTransport::Ssl
    }

    /// Returns true when STARTTLS is active.
    #[must_use]
    pub fn is_using_tls(&self) -> bool {
        self.secure_transport == SecureTransport::Tls
    }

    /// Returns the URI scheme for new connections.
    ///
    /// Only SSL changes the scheme; STARTTLS upgrades a plain `ldap://` connection.
    #[must_use]
    pub fn protocol(&self) -> &'static str {
        if self.is_using_ssl() {
            LDAPS_SCHEME
        } else {
            LDAP_SCHEME
        }
    }

    /// Returns true when the connection is encrypted, which servers require for password changes.
    #[must_use]
    pub fn can_change_passwords(&self) -> bool {
        self.secure_transport != SecureTransport::None
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the operation timeout duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Overrides the default port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the transport-security mode.
    #[must_use]
    pub const fn with_secure_transport(mut self, mode: SecureTransport) -> Self {
        self.secure_transport = mode;
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }

    /// Overrides the operation timeout in seconds.
    #[must_use]
    pub const fn with_operation_timeout_secs(mut self, seconds: u64) -> Self {
        self.operation_timeout_secs = seconds;
        self
    }

    /// Enables or disables certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the custom CA certificate path.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Adds an option applied to the transport before connecting.
    #[must_use]
    pub fn with_option(mut self, code: i32, value: impl Into<OptionValue>) -> Self {
        self.options.insert(code, value.into());
        self
    }
}
