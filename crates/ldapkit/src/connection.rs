//! Directory connection lifecycle.

use crate::transport::{DirectoryModification, Ldap3Transport, LdapEntry, SearchScope, Transport};
use crate::Result;
use ldapkit_core::error::{DetailedError, Error};
use ldapkit_core::hosts::{self, HostInput};
use ldapkit_core::options::OptionValue;
use ldapkit_core::result_code::{self, SUCCESS};
use ldapkit_core::{ConnectionConfig, SecureTransport};
use ldapkit_events::{
    AuthEvent, AuthEventKind, ConnectionEvent, ConnectionEventKind, ConnectionInfo, Event,
    EventLogger, QueryEvent,
};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

/// Lifecycle state of a directory connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session has been opened
    #[default]
    Unconnected,
    /// A session is open but not authenticated
    Connected,
    /// The session is authenticated
    Bound,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconnected => write!(f, "unconnected"),
            Self::Connected => write!(f, "connected"),
            Self::Bound => write!(f, "bound"),
        }
    }
}

/// A connection to one or more directory servers.
///
/// The connection is not internally synchronized; operations that change state take
/// `&mut self`.
pub struct DirectoryConnection {
    config: ConnectionConfig,
    transport: Box<dyn Transport>,
    events: EventLogger,
    hosts: Vec<String>,
    port: u16,
    host: Option<String>,
    state: ConnectionState,
}

impl DirectoryConnection {
    /// Creates a connection that uses the `ldap3` transport.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        let transport = Box::new(Ldap3Transport::new(&config));
        Self::with_transport(config, transport)
    }

    /// Creates a connection on top of the given transport.
    #[must_use]
    pub fn with_transport(config: ConnectionConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            port: config.port,
            config,
            transport,
            events: EventLogger::disabled(),
            hosts: Vec::new(),
            host: None,
            state: ConnectionState::Unconnected,
        }
    }

    /// Routes operation events to the given logger.
    #[must_use]
    pub fn with_event_logger(mut self, events: EventLogger) -> Self {
        self.events = events;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Sets the transport-security mode used by the next `connect`.
    pub fn set_secure_transport(&mut self, mode: SecureTransport) {
        self.config.set_secure_transport(mode);
    }

    /// Enables or disables SSL (`ldaps://`).
    pub fn ssl(&mut self, enabled: bool) {
        self.config.ssl(enabled);
    }

    /// Enables or disables STARTTLS.
    pub fn tls(&mut self, enabled: bool) {
        self.config.tls(enabled);
    }

    /// Returns true when SSL is active.
    #[must_use]
    pub fn is_using_ssl(&self) -> bool {
        self.config.is_using_ssl()
    }

    /// Returns true when STARTTLS is active.
    #[must_use]
    pub fn is_using_tls(&self) -> bool {
        self.config.is_using_tls()
    }

    /// Returns the URI scheme used for new connections.
    #[must_use]
    pub fn protocol(&self) -> &'static str {
        self.config.protocol()
    }

    /// Returns true when passwords may be changed over this connection.
    #[must_use]
    pub fn can_change_passwords(&self) -> bool {
        self.config.can_change_passwords()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns true once a bind has succeeded.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.state == ConnectionState::Bound
    }

    /// Returns true while a session is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state != ConnectionState::Unconnected
    }

    /// Returns the space-separated connection target, or `None` before the first `connect`.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Hosts passed to the last `connect`, in argument order.
    #[must_use]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Port used by the last `connect` (the configured default before that).
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the underlying transport once connected.
    #[must_use]
    pub fn connection(&self) -> Option<&dyn Transport> {
        if self.is_connected() {
            Some(self.transport.as_ref())
        } else {
            None
        }
    }

    /// Connects to the given hosts.
    ///
    /// Hosts may be a single name, a whitespace or comma separated string, or a list. One address
    /// is built per host with the current scheme and the given port (the configured port when
    /// `None`); the transport tries them in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHostConfiguration`] without touching any state when no usable host
    /// is given, and [`Error::Connection`] when no server could be reached.
    pub async fn connect(
        &mut self,
        hosts: impl Into<HostInput>,
        port: impl Into<Option<u16>>,
    ) -> Result<()> {
        let hosts = hosts::normalize(hosts)?;
        let port = port.into().unwrap_or(self.config.port);
        let addresses = hosts::build_addresses(self.config.protocol(), &hosts, port)?;

        self.hosts = hosts;
        self.port = port;
        self.host = Some(addresses.join(" "));

        self.apply_configured_options();

        self.emit(ConnectionEvent::new(ConnectionEventKind::Connecting, &*self).into());
        debug!(host = ?self.host, "Opening directory connection");

        let security = self.config.secure_transport();
        let outcome = self.transport.open(&addresses, security).await;
        match outcome {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                self.emit(ConnectionEvent::new(ConnectionEventKind::Connected, &*self).into());
                Ok(())
            }
            Err(err) => {
                self.emit(ConnectionEvent::new(ConnectionEventKind::ConnectionFailed, &*self).into());
                Err(err)
            }
        }
    }

    /// Binds with the given credentials; both absent performs an anonymous bind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before `connect`, or the transport error when the bind is
    /// rejected. The state is left unchanged on failure and the transport records the result code.
    pub async fn bind(
        &mut self,
        username: Option<&str>,
        password: Option<&SecretString>,
    ) -> Result<()> {
        let username = username.unwrap_or_default();
        let password = password.map_or("", |secret| secret.expose_secret());

        self.emit(AuthEvent::new(AuthEventKind::Binding, &*self, username).into());
        debug!(username, "Binding to directory");

        let outcome = self.transport.simple_bind(username, password).await;
        match outcome {
            Ok(()) => {
                self.state = ConnectionState::Bound;
                self.emit(AuthEvent::new(AuthEventKind::Bound, &*self, username).into());
                Ok(())
            }
            Err(err) => {
                self.emit(AuthEvent::new(AuthEventKind::Failed, &*self, username).into());
                Err(err)
            }
        }
    }

    /// Closes the session. Does nothing when not connected.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the unbind request fails.
    pub async fn unbind(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        self.transport.unbind().await?;
        self.state = ConnectionState::Unconnected;
        Ok(())
    }

    /// Runs a search and reports it as an executed query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before `connect`, or the transport error.
    pub async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&str],
    ) -> Result<Vec<LdapEntry>> {
        let selected = attributes
            .iter()
            .map(|attribute| (*attribute).to_string())
            .collect::<Vec<_>>();
        let started = Instant::now();
        let entries = self
            .transport
            .search(base_dn, scope, filter, &selected)
            .await?;

        self.emit(QueryEvent::new(&*self, base_dn, filter, selected, started.elapsed()).into());
        Ok(entries)
    }

    /// Applies modifications to an entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] before `connect`, or the transport error.
    pub async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        self.transport.modify(dn, modifications).await
    }

    /// Sets a single transport option. Returns false if it was rejected.
    pub fn set_option(&mut self, option: i32, value: impl Into<OptionValue>) -> bool {
        self.transport.set_option(option, &value.into())
    }

    /// Sets each option in iteration order.
    ///
    /// Every option is attempted even after a rejection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OptionSetFailure`] listing the rejected option codes.
    pub fn set_options<I, V>(&mut self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = (i32, V)>,
        V: Into<OptionValue>,
    {
        let failed = options
            .into_iter()
            .filter_map(|(option, value)| {
                (!self.transport.set_option(option, &value.into())).then_some(option)
            })
            .collect::<Vec<_>>();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::OptionSetFailure { failed })
        }
    }

    /// Result code of the most recent failed operation, 0 if none.
    #[must_use]
    pub fn err_no(&self) -> i32 {
        self.transport.last_error_code()
    }

    /// Message for the most recent error ("Success" when there is none).
    #[must_use]
    pub fn last_error(&self) -> String {
        let code = self.err_no();
        self.transport
            .error_detail(code)
            .map_or_else(|| result_code::describe(code).to_string(), |detail| detail.message)
    }

    /// Structured details about the most recent error, or `None` when there is no error.
    #[must_use]
    pub fn detailed_error(&self) -> Option<DetailedError> {
        let code = self.err_no();
        if code == SUCCESS {
            return None;
        }

        self.transport
            .error_detail(code)
            .map(|detail| DetailedError::new(code, detail.message, detail.diagnostic_message))
    }

    fn apply_configured_options(&mut self) {
        if self.config.options.is_empty() {
            return;
        }

        let configured = self.config.options.clone();
        if let Err(err) = self.set_options(configured) {
            warn!(error = %err, "Ignoring rejected connection options");
        }
    }

    fn emit(&self, event: Event<'_>) {
        self.events.log(&event);
    }
}

impl Default for DirectoryConnection {
    fn default() -> Self {
        Self::new(ConnectionConfig::default())
    }
}

impl ConnectionInfo for DirectoryConnection {
    fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    fn last_error(&self) -> String {
        DirectoryConnection::last_error(self)
    }
}

impl fmt::Debug for DirectoryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConnection")
            .field("host", &self.host)
            .field("state", &self.state)
            .field("secure_transport", &self.config.secure_transport())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
