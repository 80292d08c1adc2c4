//! Rendering of classified events into single-line diagnostic records.

use crate::classifier::Classification;
use crate::event::{AuthEvent, Event, ModelEvent, QueryEvent};
use std::fmt;

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Normal operation
    Info,
    /// Failed authentication
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// A formatted diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Record severity
    pub severity: Severity,
    /// Single-line message
    pub message: String,
}

impl Diagnostic {
    fn info(message: String) -> Self {
        Self {
            severity: Severity::Info,
            message,
        }
    }
}

/// Formats an event according to its classification.
///
/// Returns `None` for unrecognized events, and when the classification does not match the
/// event variant.
#[must_use]
pub fn format(event: &Event<'_>, classification: Classification) -> Option<Diagnostic> {
    match (classification, event) {
        (Classification::Authentication, Event::Auth(auth)) => Some(format_auth(event, auth)),
        (Classification::ModelMutation, Event::Model(model)) => Some(format_model(event, model)),
        (Classification::QueryExecution, Event::Query(query)) => Some(format_query(event, query)),
        _ => None,
    }
}

fn prefix(event: &Event<'_>) -> String {
    let host = event.connection().host().unwrap_or_default();
    format!("LDAP ({host}) - Operation: {}", event.operation_name())
}

fn format_auth(event: &Event<'_>, auth: &AuthEvent<'_>) -> Diagnostic {
    let message = format!("{} - Username: {}", prefix(event), auth.username());

    if auth.is_failure() {
        return Diagnostic {
            severity: Severity::Warning,
            message: format!("{message} - Reason: {}", auth.connection().last_error()),
        };
    }

    Diagnostic::info(message)
}

fn format_model(event: &Event<'_>, model: &ModelEvent<'_>) -> Diagnostic {
    Diagnostic::info(format!(
        "{} - On: {} - Distinguished Name: {}",
        prefix(event),
        model.model().model_type(),
        model.model().dn()
    ))
}

fn format_query(event: &Event<'_>, query: &QueryEvent<'_>) -> Diagnostic {
    Diagnostic::info(format!(
        "{} - Base DN: {} - Filter: {} - Selected: ({}) - Time Elapsed: {}",
        prefix(event),
        query.base_dn(),
        query.unescaped_filter(),
        query.selected().join(","),
        query.time()
    ))
}
