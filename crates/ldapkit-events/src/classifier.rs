//! Event classification.

use crate::event::Event;

/// Category an event is logged under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Bind and credential checks
    Authentication,
    /// Entry model changes
    ModelMutation,
    /// Executed searches
    QueryExecution,
    /// Anything the diagnostic pipeline does not report on
    Unrecognized,
}

/// Assigns an event to its logging category based on its variant alone.
#[must_use]
pub fn classify(event: &Event<'_>) -> Classification {
    match event {
        Event::Auth(_) => Classification::Authentication,
        Event::Model(_) => Classification::ModelMutation,
        Event::Query(_) => Classification::QueryExecution,
        Event::Connection(_) => Classification::Unrecognized,
    }
}
