//! Errors raised while assembling the service.
//!
//! Request-time failures use [`handler::Error`] instead.
//!
//! [`handler::Error`]: crate::handler::Error

/// Result type alias for service setup.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Service setup error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service configuration is invalid.
    #[error("invalid service configuration: {0}")]
    Config(String),

    /// A migration engine component rejected its settings.
    #[error(transparent)]
    Engine(#[from] ferry_core::Error),
}

impl From<crate::service::ServiceConfigBuilderError> for Error {
    fn from(err: crate::service::ServiceConfigBuilderError) -> Self {
        Self::Config(err.to_string())
    }
}
