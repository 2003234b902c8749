//! Mapping of [`object_store::Error`] onto engine errors.

use ferry_core::{Error, ErrorKind};

/// Converts an [`object_store::Error`] raised on `bucket` into an engine error.
///
/// Authorization failures map to [`ErrorKind::Connection`], missing objects
/// to [`ErrorKind::NotFound`], everything else to [`ErrorKind::Store`].
pub(crate) fn from_object_store(bucket: &str, err: object_store::Error) -> Error {
    let kind = match &err {
        object_store::Error::NotFound { .. } => ErrorKind::NotFound,
        object_store::Error::PermissionDenied { .. }
        | object_store::Error::Unauthenticated { .. } => ErrorKind::Connection,
        object_store::Error::UnknownConfigurationKey { .. } => ErrorKind::Config,
        _ => ErrorKind::Store,
    };

    Error::new(kind, format!("{bucket}: {err}")).with_source(err)
}
