//! Directory (LDAP) connection client.
//!
//! This crate manages a connection to one or more directory servers: host normalization,
//! `ldap://` / `ldaps://` / STARTTLS selection, option handling, result-code interpretation, and
//! structured diagnostic events for binds and searches.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod connection;
mod transport;

pub use connection::{ConnectionState, DirectoryConnection};
pub use ldapkit_core::config::{DEFAULT_PORT, DEFAULT_SSL_PORT};
pub use ldapkit_core::{
    options, result_code, ConnectionConfig, DetailedError, Error, HostInput, OptionValue,
    SecureTransport,
};
pub use ldapkit_events as events;
pub use secrecy::SecretString;
pub use transport::{
    DirectoryModification, Ldap3Transport, LdapEntry, SearchScope, Transport,
    TransportErrorDetail,
};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = ldapkit_core::Result<T>;
