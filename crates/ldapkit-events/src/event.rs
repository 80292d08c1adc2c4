//! Operation events produced after directory operations complete.
//!
//! Events borrow the connection (and model) they describe; they are handed to an
//! [`EventLogger`](crate::EventLogger) once and dropped.

use std::time::Duration;

/// Read access to the connection facts needed to describe an event.
pub trait ConnectionInfo {
    /// Current connection target (space separated addresses), if `connect` was ever called.
    fn host(&self) -> Option<&str>;

    /// Human-readable message for the most recent error.
    fn last_error(&self) -> String;
}

/// A directory entry model, as seen by the logging pipeline.
pub trait DirectoryModel {
    /// Fully-qualified type name of the model (e.g. `app::models::User`).
    fn model_type(&self) -> &str;

    /// Distinguished name of the entry.
    fn dn(&self) -> &str;
}

/// Authentication event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    /// Credentials are about to be checked
    Attempting,
    /// A bind is about to be sent
    Binding,
    /// The bind succeeded
    Bound,
    /// The credentials were accepted
    Passed,
    /// The bind or credential check failed
    Failed,
}

impl AuthEventKind {
    /// Operation name reported in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Attempting => "Attempting",
            Self::Binding => "Binding",
            Self::Bound => "Bound",
            Self::Passed => "Passed",
            Self::Failed => "Failed",
        }
    }
}

/// Model mutation event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEventKind {
    /// Entry was loaded from the directory
    Retrieved,
    /// Entry is about to be created
    Creating,
    /// Entry was created
    Created,
    /// Entry is about to be updated
    Updating,
    /// Entry was updated
    Updated,
    /// Entry is about to be saved
    Saving,
    /// Entry was saved
    Saved,
    /// Entry is about to be deleted
    Deleting,
    /// Entry was deleted
    Deleted,
    /// Entry is about to be renamed
    Renaming,
    /// Entry was renamed
    Renamed,
}

impl ModelEventKind {
    /// Operation name reported in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Retrieved => "Retrieved",
            Self::Creating => "Creating",
            Self::Created => "Created",
            Self::Updating => "Updating",
            Self::Updated => "Updated",
            Self::Saving => "Saving",
            Self::Saved => "Saved",
            Self::Deleting => "Deleting",
            Self::Deleted => "Deleted",
            Self::Renaming => "Renaming",
            Self::Renamed => "Renamed",
        }
    }
}

/// Connection lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEventKind {
    /// A session is about to be opened
    Connecting,
    /// A session was opened
    Connected,
    /// No server could be reached
    ConnectionFailed,
}

impl ConnectionEventKind {
    /// Operation name reported in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::ConnectionFailed => "ConnectionFailed",
        }
    }
}

/// Authentication attempt against a connection.
pub struct AuthEvent<'a> {
    kind: AuthEventKind,
    connection: &'a dyn ConnectionInfo,
    username: String,
}

impl<'a> AuthEvent<'a> {
    /// Creates an authentication event.
    #[must_use]
    pub fn new(
        kind: AuthEventKind,
        connection: &'a dyn ConnectionInfo,
        username: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            connection,
            username: username.into(),
        }
    }

    /// Event kind.
    #[must_use]
    pub const fn kind(&self) -> AuthEventKind {
        self.kind
    }

    /// Connection the attempt was made on.
    #[must_use]
    pub fn connection(&self) -> &'a dyn ConnectionInfo {
        self.connection
    }

    /// Username (bind DN) used for the attempt. Empty for anonymous binds.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns true for the failed kind.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.kind == AuthEventKind::Failed
    }
}

/// Mutation (or retrieval) of a directory entry model.
pub struct ModelEvent<'a> {
    kind: ModelEventKind,
    connection: &'a dyn ConnectionInfo,
    model: &'a dyn DirectoryModel,
}

impl<'a> ModelEvent<'a> {
    /// Creates a model event.
    #[must_use]
    pub fn new(
        kind: ModelEventKind,
        connection: &'a dyn ConnectionInfo,
        model: &'a dyn DirectoryModel,
    ) -> Self {
        Self {
            kind,
            connection,
            model,
        }
    }

    /// Event kind.
    #[must_use]
    pub const fn kind(&self) -> ModelEventKind {
        self.kind
    }

    /// Connection the model belongs to.
    #[must_use]
    pub fn connection(&self) -> &'a dyn ConnectionInfo {
        self.connection
    }

    /// The affected model.
    #[must_use]
    pub fn model(&self) -> &'a dyn DirectoryModel {
        self.model
    }
}

/// A search that was executed.
pub struct QueryEvent<'a> {
    connection: &'a dyn ConnectionInfo,
    base_dn: String,
    unescaped_filter: String,
    selected: Vec<String>,
    time: f64,
}

impl<'a> QueryEvent<'a> {
    /// Operation name reported for executed queries.
    pub const NAME: &'static str = "QueryExecuted";

    /// Creates a query event, recording the elapsed time in milliseconds rounded to two
    /// decimal places.
    #[must_use]
    pub fn new(
        connection: &'a dyn ConnectionInfo,
        base_dn: impl Into<String>,
        unescaped_filter: impl Into<String>,
        selected: Vec<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            connection,
            base_dn: base_dn.into(),
            unescaped_filter: unescaped_filter.into(),
            selected,
            time: round_millis(elapsed),
        }
    }

    /// Connection the query ran on.
    #[must_use]
    pub fn connection(&self) -> &'a dyn ConnectionInfo {
        self.connection
    }

    /// Search base.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// Filter as written, before escaping.
    #[must_use]
    pub fn unescaped_filter(&self) -> &str {
        &self.unescaped_filter
    }

    /// Requested attributes, in request order.
    #[must_use]
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }
}

/// Connection lifecycle notification.
pub struct ConnectionEvent<'a> {
    kind: ConnectionEventKind,
    connection: &'a dyn ConnectionInfo,
}

impl<'a> ConnectionEvent<'a> {
    /// Creates a connection event.
    #[must_use]
    pub fn new(kind: ConnectionEventKind, connection: &'a dyn ConnectionInfo) -> Self {
        Self { kind, connection }
    }

    /// Event kind.
    #[must_use]
    pub const fn kind(&self) -> ConnectionEventKind {
        self.kind
    }

    /// Connection the event concerns.
    #[must_use]
    pub fn connection(&self) -> &'a dyn ConnectionInfo {
        self.connection
    }
}

/// Any event produced by the operation layer.
pub enum Event<'a> {
    /// Authentication attempt
    Auth(AuthEvent<'a>),
    /// Model mutation
    Model(ModelEvent<'a>),
    /// Executed query
    Query(QueryEvent<'a>),
    /// Connection lifecycle
    Connection(ConnectionEvent<'a>),
}

impl<'a> Event<'a> {
    /// Most specific operation name of the event (e.g. `Failed`, `Created`, `QueryExecuted`).
    #[must_use]
    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::Auth(event) => event.kind.name(),
            Self::Model(event) => event.kind.name(),
            Self::Query(_) => QueryEvent::NAME,
            Self::Connection(event) => event.kind.name(),
        }
    }

    /// Connection the event originated from.
    #[must_use]
    pub fn connection(&self) -> &'a dyn ConnectionInfo {
        match self {
            Self::Auth(event) => event.connection,
            Self::Model(event) => event.connection,
            Self::Query(event) => event.connection,
            Self::Connection(event) => event.connection,
        }
    }
}

impl<'a> From<AuthEvent<'a>> for Event<'a> {
    fn from(event: AuthEvent<'a>) -> Self {
        Self::Auth(event)
    }
}

impl<'a> From<ModelEvent<'a>> for Event<'a> {
    fn from(event: ModelEvent<'a>) -> Self {
        Self::Model(event)
    }
}

impl<'a> From<QueryEvent<'a>> for Event<'a> {
    fn from(event: QueryEvent<'a>) -> Self {
        Self::Query(event)
    }
}

impl<'a> From<ConnectionEvent<'a>> for Event<'a> {
    fn from(event: ConnectionEvent<'a>) -> Self {
        Self::Connection(event)
    }
}

#[allow(clippy::cast_precision_loss)]
fn round_millis(elapsed: Duration) -> f64 {
    let micros = elapsed.as_micros() as f64;
    (micros / 10.0).round() / 100.0
}
