//! Diagnostic event pipeline for ldapkit.
//!
//! Directory operations produce [`Event`]s describing authentication attempts, model mutations
//! and executed queries. An [`EventLogger`] classifies each event, renders it as a single-line
//! record and hands it to a [`LogSink`].

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod event;
pub mod formatter;
pub mod logger;

pub use classifier::{classify, Classification};
pub use event::{
    AuthEvent, AuthEventKind, ConnectionEvent, ConnectionEventKind, ConnectionInfo,
    DirectoryModel, Event, ModelEvent, ModelEventKind, QueryEvent,
};
pub use formatter::{Diagnostic, Severity};
pub use logger::{EventLogger, LogSink, TracingSink};
