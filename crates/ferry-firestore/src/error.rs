//! Internal error types for ferry-firestore.

use ferry_core::ErrorKind;
use thiserror::Error;

/// Result type alias for ferry-firestore operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Internal error type for ferry-firestore operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The service-account key could not be used to sign an assertion.
    #[error("invalid service-account key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
    /// The token endpoint refused the assertion.
    #[error("token request rejected ({status}): {message}")]
    Token {
        /// HTTP status code.
        status: u16,
        /// Error description returned by the endpoint.
        message: String,
    },
    /// Firestore answered with an error status.
    #[error("request failed ({status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message returned by Firestore.
        message: String,
    },
    /// A value could not be converted.
    #[error("invalid value: {0}")]
    Value(String),
}

impl Error {
    /// Returns the engine error kind this error maps to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Key(_) => ErrorKind::Config,
            Self::Token { .. } => ErrorKind::Connection,
            Self::Status { status, .. } if *status == 401 || *status == 403 => {
                ErrorKind::Connection
            }
            Self::Reqwest(err) if err.is_connect() => ErrorKind::Connection,
            _ => ErrorKind::Store,
        }
    }
}

impl From<Error> for ferry_core::Error {
    fn from(err: Error) -> Self {
        let kind = err.kind();
        let message = match &err {
            Error::Reqwest(e) if e.is_timeout() => "request timed out".to_owned(),
            Error::Reqwest(e) if e.is_connect() => "connection failed".to_owned(),
            other => other.to_string(),
        };

        ferry_core::Error::new(kind, format!("firestore: {message}")).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_map_by_code() {
        let denied = Error::Status {
            status: 403,
            message: "Missing or insufficient permissions.".into(),
        };
        assert_eq!(denied.kind(), ErrorKind::Connection);

        let aborted = Error::Status {
            status: 409,
            message: "Transaction aborted.".into(),
        };
        assert_eq!(aborted.kind(), ErrorKind::Store);
    }

    #[test]
    fn converts_into_engine_error() {
        let err: ferry_core::Error = Error::Value("integer out of range".into()).into();
        assert_eq!(err.kind(), ErrorKind::Store);
        assert!(err.message().starts_with("firestore:"));
    }
}
