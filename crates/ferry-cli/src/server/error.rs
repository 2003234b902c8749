//! Server startup and runtime errors.

use std::io;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Failure to start or keep serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening address could not be bound.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("server runtime error: {0}")]
    Runtime(#[source] io::Error),

    /// TLS material is missing or unreadable.
    #[cfg_attr(not(feature = "tls"), allow(dead_code))]
    #[error("TLS certificate error: {0}")]
    TlsCertificate(String),
}

impl ServerError {
    /// Returns true for errors a restart with the same configuration may
    /// fix, such as a port still held by a previous process.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Bind { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable
            ),
            Self::Runtime(_) => true,
            Self::TlsCertificate(_) => false,
        }
    }
}
