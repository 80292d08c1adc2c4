//! Transport seam between a directory connection and the wire protocol.
//!
//! [`Transport`] is what a [`DirectoryConnection`](crate::DirectoryConnection) drives; the
//! default implementation, [`Ldap3Transport`], is backed by `ldap3`.

use crate::Result;
use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, LdapError, Mod, Scope, SearchEntry, SearchOptions};
use ldapkit_core::config::ConnectionConfig;
use ldapkit_core::error::Error;
use ldapkit_core::options::{self, OptionValue};
use ldapkit_core::result_code::{self, CONNECT_ERROR, SERVER_DOWN, SUCCESS, TIMEOUT};
use ldapkit_core::SecureTransport;
use native_tls::{Certificate, TlsConnector};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// LDAP entry returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map (values preserved order from server).
    pub attributes: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes.get(attribute).map(Vec::as_slice)
    }
}

/// LDAP modification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryModification {
    /// Add attribute values.
    Add {
        /// Attribute to modify.
        attribute: String,
        /// Values to add.
        values: Vec<String>,
    },
    /// Delete attribute values.
    Delete {
        /// Attribute to modify.
        attribute: String,
        /// Values to delete (empty removes attribute).
        values: Vec<String>,
    },
    /// Replace attribute values.
    Replace {
        /// Attribute to modify.
        attribute: String,
        /// Replacement values.
        values: Vec<String>,
    },
}

/// Error information the transport holds for a result code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportErrorDetail {
    /// Message for the result code.
    pub message: String,
    /// Diagnostic text returned by the server, if any.
    pub diagnostic_message: Option<String>,
}

/// Wire-level collaborator of a directory connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    /// Opens a session against the first reachable address, in order.
    async fn open(&mut self, addresses: &[String], security: SecureTransport) -> Result<()>;

    /// Performs a simple bind. Fails with [`Error::NotConnected`] when no session is open.
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;

    /// Closes the session.
    async fn unbind(&mut self) -> Result<()>;

    /// Runs a search. Fails with [`Error::NotConnected`] when no session is open.
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>>;

    /// Applies modifications to an entry. Fails with [`Error::NotConnected`] when no session is
    /// open.
    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()>;

    /// Sets a single option, returning false if it was rejected.
    fn set_option(&mut self, option: i32, value: &OptionValue) -> bool;

    /// Result code of the most recent operation (0 when it succeeded).
    fn last_error_code(&self) -> i32;

    /// Looks up the error information for a result code.
    fn error_detail(&self, code: i32) -> Option<TransportErrorDetail>;
}

#[derive(Debug, Clone)]
struct SessionSettings {
    connection_timeout: Duration,
    operation_timeout: Duration,
    tls_verify: bool,
    tls_ca_cert: Option<PathBuf>,
    size_limit: Option<i32>,
    time_limit: Option<i32>,
}

/// Transport backed by `ldap3`.
pub struct Ldap3Transport {
    settings: SessionSettings,
    session: Option<ldap3::Ldap>,
    last_code: i32,
    last_diagnostic: Option<String>,
}

impl Ldap3Transport {
    /// Creates a transport using the timeouts and TLS settings of the configuration.
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            settings: SessionSettings {
                connection_timeout: config.connection_timeout(),
                operation_timeout: config.operation_timeout(),
                tls_verify: config.tls_verify,
                tls_ca_cert: config.tls_ca_cert.clone(),
                size_limit: None,
                time_limit: None,
            },
            session: None,
            last_code: SUCCESS,
            last_diagnostic: None,
        }
    }

    fn record(&mut self, code: i32, diagnostic: Option<String>) {
        self.last_code = code;
        self.last_diagnostic = diagnostic.filter(|text| !text.is_empty());
    }

    fn record_ldap_error(&mut self, err: &LdapError) {
        let code = match err {
            LdapError::LdapResult { result } => i32::try_from(result.rc).unwrap_or(SERVER_DOWN),
            LdapError::Timeout { .. } => TIMEOUT,
            _ => SERVER_DOWN,
        };
        self.record(code, Some(err.to_string()));
    }

    fn check_result(
        &mut self,
        result: &ldap3::LdapResult,
        on_failure: impl FnOnce(i32, String) -> Error,
    ) -> Result<()> {
        let code = i32::try_from(result.rc).unwrap_or(SERVER_DOWN);
        self.record(code, Some(result.text.clone()));
        if code == SUCCESS {
            return Ok(());
        }
        Err(on_failure(code, result_code::describe(code).to_string()))
    }

    fn not_connected(&mut self) -> Error {
        self.record(CONNECT_ERROR, None);
        Error::NotConnected
    }

    fn timed_out(&mut self, operation: &str) -> Error {
        self.record(TIMEOUT, None);
        Error::Timeout(format!("LDAP {operation} timed out"))
    }

    fn set_limit(slot: &mut Option<i32>, value: &OptionValue) -> bool {
        match value.as_int().and_then(|limit| i32::try_from(limit).ok()) {
            Some(limit) if limit >= 0 => {
                *slot = Some(limit);
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl Transport for Ldap3Transport {
    async fn open(&mut self, addresses: &[String], security: SecureTransport) -> Result<()> {
        let mut failure = None;

        for address in addresses {
            let settings = match build_ldap_settings(&self.settings, security) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(error = %err, "Unable to prepare LDAP session settings");
                    self.record(CONNECT_ERROR, Some(err.to_string()));
                    return Err(Error::Connection(err.to_string()));
                }
            };
            debug!(address = %address, ?security, "Connecting to LDAP server");

            match LdapConnAsync::with_settings(settings, address).await {
                Ok((conn, ldap)) => {
                    ldap3::drive!(conn);
                    self.session = Some(ldap);
                    self.record(SUCCESS, None);
                    return Ok(());
                }
                Err(err) => {
                    warn!(address = %address, error = %err, "LDAP server unreachable");
                    self.record_ldap_error(&err);
                    failure = Some(format!("{address}: {err}"));
                }
            }
        }

        if failure.is_none() {
            self.record(SERVER_DOWN, None);
        }
        Err(Error::Connection(
            failure.unwrap_or_else(|| "no addresses to connect to".to_string()),
        ))
    }

    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let operation_timeout = self.settings.operation_timeout;
        let Some(ldap) = self.session.as_mut() else {
            return Err(self.not_connected());
        };

        let outcome = timeout(operation_timeout, ldap.simple_bind(dn, password)).await;
        match outcome {
            Err(_) => Err(self.timed_out("bind")),
            Ok(Err(err)) => {
                self.record_ldap_error(&err);
                Err(Error::Bind {
                    code: self.last_code,
                    message: err.to_string(),
                })
            }
            Ok(Ok(result)) => {
                self.check_result(&result, |code, message| Error::Bind { code, message })
            }
        }
    }

    async fn unbind(&mut self) -> Result<()> {
        let operation_timeout = self.settings.operation_timeout;
        let Some(mut ldap) = self.session.take() else {
            return Ok(());
        };

        let outcome = timeout(operation_timeout, ldap.unbind()).await;
        match outcome {
            Err(_) => Err(self.timed_out("unbind")),
            Ok(Err(err)) => {
                self.record_ldap_error(&err);
                Err(Error::Connection(err.to_string()))
            }
            Ok(Ok(())) => {
                self.record(SUCCESS, None);
                Ok(())
            }
        }
    }

    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>> {
        let operation_timeout = self.settings.operation_timeout;
        let mut search_options = SearchOptions::new();
        if let Some(limit) = self.settings.size_limit {
            search_options = search_options.sizelimit(limit);
        }
        if let Some(limit) = self.settings.time_limit {
            search_options = search_options.timelimit(limit);
        }
        let Some(ldap) = self.session.as_mut() else {
            return Err(self.not_connected());
        };

        let outcome = timeout(
            operation_timeout,
            ldap.with_search_options(search_options).search(
                base_dn,
                scope.into(),
                filter,
                attributes.to_vec(),
            ),
        )
        .await;

        let ldap3::SearchResult(entries, result) = match outcome {
            Err(_) => return Err(self.timed_out("search")),
            Ok(Err(err)) => {
                self.record_ldap_error(&err);
                return Err(Error::Operation {
                    code: self.last_code,
                    message: err.to_string(),
                });
            }
            Ok(Ok(search_result)) => search_result,
        };
        self.check_result(&result, |code, message| Error::Operation { code, message })?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| LdapEntry {
                dn: entry.dn,
                attributes: entry.attrs,
            })
            .collect())
    }

    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()> {
        let operation_timeout = self.settings.operation_timeout;
        let mods = modifications
            .iter()
            .map(|m| match m {
                DirectoryModification::Add { attribute, values } => Mod::Add(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Delete { attribute, values } => Mod::Delete(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
                DirectoryModification::Replace { attribute, values } => Mod::Replace(
                    attribute.clone(),
                    values.iter().cloned().collect::<HashSet<_>>(),
                ),
            })
            .collect::<Vec<_>>();
        let Some(ldap) = self.session.as_mut() else {
            return Err(self.not_connected());
        };

        let outcome = timeout(operation_timeout, ldap.modify(dn, mods)).await;
        match outcome {
            Err(_) => Err(self.timed_out("modify")),
            Ok(Err(err)) => {
                self.record_ldap_error(&err);
                Err(Error::Operation {
                    code: self.last_code,
                    message: err.to_string(),
                })
            }
            Ok(Ok(result)) => {
                self.check_result(&result, |code, message| Error::Operation { code, message })
            }
        }
    }

    fn set_option(&mut self, option: i32, value: &OptionValue) -> bool {
        let accepted = match option {
            options::PROTOCOL_VERSION => value.as_int() == Some(3),
            // Referral chasing is not supported.
            options::REFERRALS => value.as_bool() == Some(false),
            options::SIZELIMIT => Self::set_limit(&mut self.settings.size_limit, value),
            options::TIMELIMIT => Self::set_limit(&mut self.settings.time_limit, value),
            options::NETWORK_TIMEOUT => match value.as_int().and_then(|s| u64::try_from(s).ok()) {
                Some(seconds) if seconds > 0 => {
                    self.settings.connection_timeout = Duration::from_secs(seconds);
                    true
                }
                _ => false,
            },
            options::X_TLS_REQUIRE_CERT => match value.as_int() {
                Some(options::X_TLS_NEVER | options::X_TLS_ALLOW) => {
                    self.settings.tls_verify = false;
                    true
                }
                Some(options::X_TLS_HARD | options::X_TLS_DEMAND | options::X_TLS_TRY) => {
                    self.settings.tls_verify = true;
                    true
                }
                _ => false,
            },
            options::X_TLS_CACERTFILE => match value.as_str() {
                Some(path) if !path.is_empty() => {
                    self.settings.tls_ca_cert = Some(PathBuf::from(path));
                    true
                }
                _ => false,
            },
            _ => false,
        };

        if !accepted {
            debug!(option, value = %value, "LDAP option rejected");
        }
        accepted
    }

    fn last_error_code(&self) -> i32 {
        self.last_code
    }

    fn error_detail(&self, code: i32) -> Option<TransportErrorDetail> {
        let diagnostic_message = if code == self.last_code {
            self.last_diagnostic.clone()
        } else {
            None
        };

        Some(TransportErrorDetail {
            message: result_code::describe(code).to_string(),
            diagnostic_message,
        })
    }
}

fn build_ldap_settings(
    settings: &SessionSettings,
    security: SecureTransport,
) -> Result<LdapConnSettings> {
    let mut conn_settings = LdapConnSettings::new()
        .set_conn_timeout(settings.connection_timeout)
        .set_starttls(security == SecureTransport::Tls);

    if security == SecureTransport::None {
        return Ok(conn_settings);
    }

    if !settings.tls_verify {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to construct TLS connector: {err}"))
            })?;
        conn_settings = conn_settings
            .set_connector(connector)
            .set_no_tls_verify(true);
    } else if let Some(cert_path) = &settings.tls_ca_cert {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| Error::ConfigError(format!("failed to load CA certificate: {err}")))?;
        conn_settings = conn_settings.set_connector(connector);
    }

    Ok(conn_settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn transport() -> Ldap3Transport {
        Ldap3Transport::new(&ConnectionConfig::default())
    }

    #[test]
    fn fresh_transport_has_no_error() {
        let transport = transport();
        assert!(transport.session.is_none());
        assert_eq!(transport.last_error_code(), SUCCESS);
    }

    #[test]
    fn supported_options_are_accepted() {
        let mut transport = transport();

        assert!(transport.set_option(options::PROTOCOL_VERSION, &OptionValue::Int(3)));
        assert!(transport.set_option(options::REFERRALS, &OptionValue::Bool(false)));
        assert!(transport.set_option(options::SIZELIMIT, &OptionValue::Int(500)));
        assert!(transport.set_option(options::TIMELIMIT, &OptionValue::from("30")));
        assert!(transport.set_option(options::NETWORK_TIMEOUT, &OptionValue::Int(10)));
        assert!(transport.set_option(
            options::X_TLS_REQUIRE_CERT,
            &OptionValue::Int(options::X_TLS_NEVER)
        ));
        assert!(transport.set_option(
            options::X_TLS_CACERTFILE,
            &OptionValue::from("/etc/ssl/ca.pem")
        ));

        assert_eq!(transport.settings.size_limit, Some(500));
        assert_eq!(transport.settings.time_limit, Some(30));
        assert_eq!(transport.settings.connection_timeout, Duration::from_secs(10));
        assert!(!transport.settings.tls_verify);
        assert_eq!(
            transport.settings.tls_ca_cert.as_deref(),
            Some(Path::new("/etc/ssl/ca.pem"))
        );
    }

    #[test]
    fn unsupported_options_are_rejected() {
        let mut transport = transport();

        assert!(!transport.set_option(options::PROTOCOL_VERSION, &OptionValue::Int(2)));
        assert!(!transport.set_option(options::REFERRALS, &OptionValue::Bool(true)));
        assert!(!transport.set_option(options::SIZELIMIT, &OptionValue::Int(-1)));
        assert!(!transport.set_option(options::X_TLS_REQUIRE_CERT, &OptionValue::Int(9)));
        assert!(!transport.set_option(1, &OptionValue::from("value")));
    }

    #[test]
    fn error_detail_carries_diagnostic_for_last_code() {
        let mut transport = transport();
        transport.record(49, Some("80090308: LdapErr: DSID-0C09044E".to_string()));

        let detail = transport.error_detail(49).unwrap();
        assert_eq!(detail.message, "Invalid credentials");
        assert_eq!(
            detail.diagnostic_message.as_deref(),
            Some("80090308: LdapErr: DSID-0C09044E")
        );

        let other = transport.error_detail(32).unwrap();
        assert_eq!(other.message, "No such object");
        assert_eq!(other.diagnostic_message, None);
    }

    #[test]
    fn empty_diagnostic_is_dropped() {
        let mut transport = transport();
        transport.record(32, Some(String::new()));
        assert_eq!(transport.error_detail(32).unwrap().diagnostic_message, None);
    }

    #[tokio::test]
    async fn operations_without_a_session_record_connect_error() {
        let mut transport = transport();

        let result = transport.simple_bind("cn=admin", "secret").await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert_eq!(transport.last_error_code(), CONNECT_ERROR);

        transport.record(SUCCESS, None);
        let result = transport
            .search("dc=example,dc=com", SearchScope::Subtree, "(cn=*)", &[])
            .await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert_eq!(transport.last_error_code(), CONNECT_ERROR);

        transport.record(SUCCESS, None);
        let result = transport.modify("cn=jdoe,dc=example,dc=com", &[]).await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert_eq!(transport.last_error_code(), CONNECT_ERROR);
        assert_eq!(
            transport.error_detail(CONNECT_ERROR).unwrap().message,
            "Connect error"
        );

        assert!(transport.unbind().await.is_ok());
    }

    #[tokio::test]
    async fn open_without_addresses_fails() {
        let mut transport = transport();
        let result = transport.open(&[], SecureTransport::None).await;
        assert!(matches!(result, Err(Error::Connection(_))));
        assert_eq!(transport.last_error_code(), SERVER_DOWN);
    }

    #[tokio::test]
    async fn open_tries_every_address_and_reports_the_last_failure() {
        let mut transport = transport();
        let addresses = vec![
            "ldap://127.0.0.1:1".to_string(),
            "ldap://127.0.0.1:2".to_string(),
        ];

        let result = transport.open(&addresses, SecureTransport::None).await;

        match result {
            Err(Error::Connection(message)) => {
                assert!(message.starts_with("ldap://127.0.0.1:2: "), "{message}");
            }
            other => panic!("expected a connection error, got {other:?}"),
        }
        assert!(transport.session.is_none());
        assert_eq!(transport.last_error_code(), SERVER_DOWN);
        let detail = transport.error_detail(SERVER_DOWN).unwrap();
        assert_eq!(detail.message, "Can't contact LDAP server");
        assert!(detail.diagnostic_message.is_some_and(|text| !text.is_empty()));
    }

    #[tokio::test]
    async fn unreadable_ca_certificate_fails_the_open() {
        let config = ConnectionConfig::default()
            .with_secure_transport(SecureTransport::Ssl)
            .with_tls_ca_cert(PathBuf::from("/nonexistent/ldapkit/ca.pem"));
        let mut transport = Ldap3Transport::new(&config);

        let result = transport
            .open(&["ldaps://127.0.0.1:1".to_string()], SecureTransport::Ssl)
            .await;

        assert!(matches!(result, Err(Error::Connection(_))));
        assert_eq!(transport.last_error_code(), CONNECT_ERROR);
        let diagnostic = transport
            .error_detail(CONNECT_ERROR)
            .and_then(|detail| detail.diagnostic_message)
            .unwrap();
        assert!(diagnostic.contains("CA certificate"), "{diagnostic}");
    }
}
