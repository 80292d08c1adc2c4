//! Diagnostic sinks and the event logging pipeline.

use crate::classifier::{classify, Classification};
use crate::event::Event;
use crate::formatter::{format, Severity};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Receives formatted diagnostic records.
///
/// Implementations handle their own failures; nothing is reported back to the pipeline.
#[cfg_attr(test, mockall::automock)]
pub trait LogSink: Send + Sync {
    /// Writes one record.
    fn log(&self, severity: Severity, message: &str);
}

/// Sink that forwards records to `tracing` under the `ldapkit::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!(target: "ldapkit::events", "{message}"),
            Severity::Warning => warn!(target: "ldapkit::events", "{message}"),
        }
    }
}

/// Classifies, formats and writes operation events to an optional sink.
#[derive(Clone, Default)]
pub struct EventLogger {
    sink: Option<Arc<dyn LogSink>>,
}

impl EventLogger {
    /// Creates a logger writing to the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a logger that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Creates a logger writing to `tracing`.
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    /// Returns true when a sink is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Logs a single event.
    pub fn log(&self, event: &Event<'_>) {
        let Some(sink) = &self.sink else {
            return;
        };

        let classification = classify(event);
        if classification == Classification::Unrecognized {
            return;
        }

        if let Some(diagnostic) = format(event, classification) {
            sink.log(diagnostic.severity, &diagnostic.message);
        }
    }
}

impl fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
