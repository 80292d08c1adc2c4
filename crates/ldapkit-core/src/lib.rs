//! # ldapkit-core
//!
//! Core types shared by the ldapkit directory client crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and the detailed error record
//! - [`config`] - Connection configuration and transport-security mode
//! - [`hosts`] - Host normalization and connection address construction
//! - [`options`] - Connection option codes and values
//! - [`result_code`] - Descriptions of LDAP result codes

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod hosts;
pub mod options;
pub mod result_code;

// Re-export commonly used types
pub use config::{ConnectionConfig, SecureTransport};
pub use error::{DetailedError, Error, Result};
pub use hosts::HostInput;
pub use options::OptionValue;
