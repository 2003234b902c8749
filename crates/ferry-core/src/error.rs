//! Engine error types.
//!
//! Errors are split by [`ErrorKind`] along the lines of how a migration run
//! reacts to them:
//!
//! - [`ErrorKind::Config`] and [`ErrorKind::Connection`] abort a run before
//!   any item is processed.
//! - [`ErrorKind::NotFound`] signals that there is nothing to work on (empty
//!   collection, no bucket under any naming convention).
//! - [`ErrorKind::Store`] and [`ErrorKind::Transform`] are raised per item and
//!   end up inside the [`MigrationReport`] instead of being returned.
//!
//! [`MigrationReport`]: crate::report::MigrationReport

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error kind enumeration for categorizing engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed credentials or request fields.
    Config,
    /// Project unreachable, unauthorized or connection setup failed.
    Connection,
    /// Nothing to operate on (empty collection, no bucket located).
    NotFound,
    /// Document or blob store I/O failure.
    Store,
    /// Record transform failure.
    Transform,
    /// Internal engine logic errors.
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Connection => "connection",
            Self::NotFound => "not_found",
            Self::Store => "store",
            Self::Transform => "transform",
            Self::Internal => "internal",
        }
    }

    /// Returns true for errors that stop a run before it starts.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Config | Self::Connection | Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine error with structured information.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    /// Creates a new [`Error`].
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error to this error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a configuration error naming a missing field.
    #[inline]
    pub fn missing_field(field: &'static str) -> Self {
        Self::new(ErrorKind::Config, format!("missing required field `{field}`"))
    }

    /// Creates a new connection error.
    #[inline]
    pub fn connection(
        project: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let project = project.into();
        let message = message.into();
        Self::new(ErrorKind::Connection, format!("{project}: {message}"))
    }

    /// Creates a new not-found error.
    #[inline]
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a new store error.
    #[inline]
    pub fn store(
        store: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let store = store.into();
        let message = message.into();
        Self::new(ErrorKind::Store, format!("{store}: {message}"))
    }

    /// Creates a new transform error.
    #[inline]
    pub fn transform(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Transform, message)
    }

    /// Creates a new internal error.
    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Returns the message followed by the messages of every source error.
    ///
    /// Used as the `reason` of per-item report entries.
    #[must_use]
    pub fn reason(&self) -> String {
        let mut reason = self.message.to_string();
        let mut source = StdError::source(self);
        while let Some(err) = source {
            reason.push_str(": ");
            reason.push_str(&err.to_string());
            source = err.source();
        }
        reason
    }
}
