//! Host normalization and connection address construction.

use crate::{Error, Result};
use url::Url;

/// Host argument accepted by `connect`: a single (possibly delimited) string or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostInput {
    /// One host, or several separated by whitespace or commas.
    Delimited(String),
    /// Explicit list of hosts, used as-is.
    List(Vec<String>),
}

impl From<&str> for HostInput {
    fn from(value: &str) -> Self {
        Self::Delimited(value.to_string())
    }
}

impl From<String> for HostInput {
    fn from(value: String) -> Self {
        Self::Delimited(value)
    }
}

impl From<&String> for HostInput {
    fn from(value: &String) -> Self {
        Self::Delimited(value.clone())
    }
}

impl From<Vec<String>> for HostInput {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<&str>> for HostInput {
    fn from(value: Vec<&str>) -> Self {
        Self::List(value.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for HostInput {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|host| (*host).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HostInput {
    fn from(value: [&str; N]) -> Self {
        Self::List(value.iter().map(|host| (*host).to_owned()).collect())
    }
}

/// Normalizes host input into an ordered list of hosts.
///
/// Delimited strings are split on whitespace and commas with empty segments dropped. Lists are
/// passed through untouched, duplicates included.
///
/// # Errors
///
/// Returns [`Error::InvalidHostConfiguration`] when no host remains.
pub fn normalize(input: impl Into<HostInput>) -> Result<Vec<String>> {
    let hosts = match input.into() {
        HostInput::Delimited(value) => value
            .split(|ch: char| ch.is_whitespace() || ch == ',')
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect::<Vec<_>>(),
        HostInput::List(hosts) => hosts,
    };

    if hosts.is_empty() {
        return Err(Error::InvalidHostConfiguration(
            "no hosts were supplied".to_string(),
        ));
    }

    Ok(hosts)
}

/// Builds one `<scheme><host>:<port>` address per host.
///
/// # Errors
///
/// Returns [`Error::InvalidHostConfiguration`] if an address cannot be parsed as a URL.
pub fn build_addresses(scheme: &str, hosts: &[String], port: u16) -> Result<Vec<String>> {
    hosts
        .iter()
        .map(|host| {
            let address = format!("{scheme}{host}:{port}");
            Url::parse(&address).map_err(|err| {
                Error::InvalidHostConfiguration(format!("invalid address `{address}`: {err}"))
            })?;
            Ok(address)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_host_string() {
        assert_eq!(normalize("dc01").unwrap(), vec!["dc01".to_string()]);
    }

    #[test]
    fn delimited_string_preserves_order() {
        let hosts = normalize("dc02, dc01  dc03,,").unwrap();
        assert_eq!(hosts, vec!["dc02", "dc01", "dc03"]);
    }

    #[test]
    fn list_passes_through_with_duplicates() {
        let hosts = normalize(vec!["dc01", "dc02", "dc01"]).unwrap();
        assert_eq!(hosts, vec!["dc01", "dc02", "dc01"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            normalize(""),
            Err(Error::InvalidHostConfiguration(_))
        ));
        assert!(matches!(
            normalize(" , "),
            Err(Error::InvalidHostConfiguration(_))
        ));
        assert!(matches!(
            normalize(Vec::<String>::new()),
            Err(Error::InvalidHostConfiguration(_))
        ));
    }

    #[test]
    fn addresses_use_scheme_and_port() {
        let hosts = normalize(["dc01", "192.168.1.1"]).unwrap();
        let addresses = build_addresses("ldaps://", &hosts, 636).unwrap();
        assert_eq!(
            addresses,
            vec!["ldaps://dc01:636", "ldaps://192.168.1.1:636"]
        );
    }

    #[test]
    fn unparsable_address_is_rejected() {
        let hosts = vec!["dc 01".to_string()];
        assert!(matches!(
            build_addresses("ldap://", &hosts, 389),
            Err(Error::InvalidHostConfiguration(_))
        ));
    }
}
