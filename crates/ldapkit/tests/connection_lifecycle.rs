//! End-to-end tests for directory connections over a scripted transport.
//!
//! These tests drive `DirectoryConnection` only through the public API, using an in-memory
//! transport that records every call.

use async_trait::async_trait;
use ldapkit::events::{EventLogger, LogSink, Severity};
use ldapkit::result_code::{INVALID_CREDENTIALS, SUCCESS};
use ldapkit::{
    ConnectionConfig, DirectoryConnection, DirectoryModification, Error, LdapEntry, OptionValue,
    Result, SearchScope, SecretString, SecureTransport, Transport, TransportErrorDetail,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Open(Vec<String>, SecureTransport),
    Bind(String),
    Unbind,
    Search(String, String, Vec<String>),
    SetOption(i32, OptionValue),
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    reject_password: Option<String>,
    last_code: i32,
}

/// Transport that accepts every address and rejects one scripted password.
#[derive(Clone, Default)]
struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    fn rejecting(password: &str) -> Self {
        let transport = Self::default();
        transport.script.lock().unwrap().reject_password = Some(password.to_string());
        transport
    }

    fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&mut self, addresses: &[String], security: SecureTransport) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Open(addresses.to_vec(), security));
        script.last_code = SUCCESS;
        Ok(())
    }

    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(Call::Bind(dn.to_string()));
        if script.reject_password.as_deref() == Some(password) {
            script.last_code = INVALID_CREDENTIALS;
            return Err(Error::Bind {
                code: INVALID_CREDENTIALS,
                message: "Invalid credentials".to_string(),
            });
        }
        script.last_code = SUCCESS;
        Ok(())
    }

    async fn unbind(&mut self) -> Result<()> {
        self.script.lock().unwrap().calls.push(Call::Unbind);
        Ok(())
    }

    async fn search(
        &mut self,
        base_dn: &str,
        _scope: SearchScope,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>> {
        self.script.lock().unwrap().calls.push(Call::Search(
            base_dn.to_string(),
            filter.to_string(),
            attributes.to_vec(),
        ));
        Ok(Vec::new())
    }

    async fn modify(&mut self, _dn: &str, _modifications: &[DirectoryModification]) -> Result<()> {
        Ok(())
    }

    fn set_option(&mut self, option: i32, value: &OptionValue) -> bool {
        self.script
            .lock()
            .unwrap()
            .calls
            .push(Call::SetOption(option, value.clone()));
        option != 99
    }

    fn last_error_code(&self) -> i32 {
        self.script.lock().unwrap().last_code
    }

    fn error_detail(&self, code: i32) -> Option<TransportErrorDetail> {
        Some(TransportErrorDetail {
            message: ldapkit::result_code::describe(code).to_string(),
            diagnostic_message: (code == INVALID_CREDENTIALS)
                .then(|| "80090308: LdapErr: DSID-0C09044E, data 52e".to_string()),
        })
    }
}

#[derive(Default)]
struct MemorySink {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl LogSink for MemorySink {
    fn log(&self, severity: Severity, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }
}

fn connection_with(
    config: ConnectionConfig,
    transport: &ScriptedTransport,
    sink: &Arc<MemorySink>,
) -> DirectoryConnection {
    DirectoryConnection::with_transport(config, Box::new(transport.clone()))
        .with_event_logger(EventLogger::new(sink.clone()))
}

#[tokio::test]
async fn test_bind_and_search_produce_diagnostics_in_order() {
    let transport = ScriptedTransport::default();
    let sink = Arc::new(MemorySink::default());
    let mut ldap = connection_with(ConnectionConfig::default(), &transport, &sink);

    ldap.connect("dc01,dc02", 500).await.unwrap();
    let password = SecretString::from("secret".to_string());
    ldap.bind(Some("cn=admin,dc=example,dc=com"), Some(&password))
        .await
        .unwrap();
    ldap.search(
        "ou=People,dc=example,dc=com",
        SearchScope::Subtree,
        "(objectclass=person)",
        &["cn", "mail"],
    )
    .await
    .unwrap();

    assert!(ldap.is_bound());
    assert_eq!(
        transport.calls()[0],
        Call::Open(
            vec!["ldap://dc01:500".to_string(), "ldap://dc02:500".to_string()],
            SecureTransport::None
        )
    );

    let lines = sink.lines.lock().unwrap().clone();
    let messages = lines
        .iter()
        .map(|(_, message)| message.as_str())
        .collect::<Vec<_>>();
    assert_eq!(messages.len(), 3);
    assert_eq!(
        messages[0],
        "LDAP (ldap://dc01:500 ldap://dc02:500) - Operation: Binding - Username: cn=admin,dc=example,dc=com"
    );
    assert_eq!(
        messages[1],
        "LDAP (ldap://dc01:500 ldap://dc02:500) - Operation: Bound - Username: cn=admin,dc=example,dc=com"
    );
    assert!(messages[2].starts_with(
        "LDAP (ldap://dc01:500 ldap://dc02:500) - Operation: QueryExecuted - Base DN: ou=People,dc=example,dc=com - Filter: (objectclass=person) - Selected: (cn,mail) - Time Elapsed: "
    ));
    assert!(lines.iter().all(|(severity, _)| *severity == Severity::Info));
}

#[tokio::test]
async fn test_rejected_bind_is_reported_with_reason() {
    let transport = ScriptedTransport::rejecting("wrong");
    let sink = Arc::new(MemorySink::default());
    let mut ldap = connection_with(ConnectionConfig::default(), &transport, &sink);

    ldap.connect("dc01", None).await.unwrap();
    let password = SecretString::from("wrong".to_string());
    let result = ldap.bind(Some("jdoe"), Some(&password)).await;

    assert!(matches!(result, Err(Error::Bind { code: 49, .. })));
    assert!(!ldap.is_bound());
    assert_eq!(ldap.err_no(), INVALID_CREDENTIALS);
    assert_eq!(ldap.last_error(), "Invalid credentials");

    let detail = ldap.detailed_error().unwrap();
    assert_eq!(detail.code, INVALID_CREDENTIALS);
    assert_eq!(
        detail.diagnostic_message.as_deref(),
        Some("80090308: LdapErr: DSID-0C09044E, data 52e")
    );

    let lines = sink.lines.lock().unwrap().clone();
    assert_eq!(
        lines.last().unwrap(),
        &(
            Severity::Warning,
            "LDAP (ldap://dc01:389) - Operation: Failed - Username: jdoe - Reason: Invalid credentials"
                .to_string()
        )
    );
}

#[tokio::test]
async fn test_configured_options_and_tls_mode_reach_the_transport() {
    let transport = ScriptedTransport::default();
    let sink = Arc::new(MemorySink::default());
    let config = ConnectionConfig::default()
        .with_secure_transport(SecureTransport::Tls)
        .with_option(ldapkit::options::PROTOCOL_VERSION, 3)
        .with_option(99, "unsupported");
    let mut ldap = connection_with(config, &transport, &sink);

    ldap.connect(vec!["dc01".to_string()], None).await.unwrap();

    assert!(ldap.can_change_passwords());
    assert_eq!(ldap.host(), Some("ldap://dc01:389"));
    assert_eq!(
        transport.calls(),
        vec![
            Call::SetOption(ldapkit::options::PROTOCOL_VERSION, OptionValue::Int(3)),
            Call::SetOption(99, OptionValue::from("unsupported")),
            Call::Open(vec!["ldap://dc01:389".to_string()], SecureTransport::Tls),
        ]
    );
    assert!(sink.lines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unbind_and_reconnect_with_ssl() {
    let transport = ScriptedTransport::default();
    let sink = Arc::new(MemorySink::default());
    let mut ldap = connection_with(ConnectionConfig::default(), &transport, &sink);

    ldap.connect("dc01", None).await.unwrap();
    ldap.bind(None, None).await.unwrap();
    ldap.unbind().await.unwrap();
    assert!(ldap.connection().is_none());

    ldap.ssl(true);
    ldap.connect("dc01", ldapkit::DEFAULT_SSL_PORT).await.unwrap();

    assert_eq!(ldap.host(), Some("ldaps://dc01:636"));
    assert!(ldap.connection().is_some());
    assert!(!ldap.is_bound());
    assert!(transport.calls().contains(&Call::Unbind));
}

#[test]
fn test_detailed_error_is_none_without_error() {
    let transport = ScriptedTransport::default();
    let sink = Arc::new(MemorySink::default());
    let ldap = connection_with(ConnectionConfig::default(), &transport, &sink);

    assert_eq!(ldap.err_no(), 0);
    assert!(ldap.detailed_error().is_none());
    assert_eq!(ldap.last_error(), "Success");
}
