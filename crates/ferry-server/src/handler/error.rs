//! HTTP error type returned by handlers and extractors.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// Tracing target for errors turned into responses.
const TRACING_TARGET: &str = "ferry_server::handler::error";

/// The error type of HTTP handlers.
///
/// Carries an [`ErrorKind`] plus optional message, resource and context
/// that are merged into the kind's [`ErrorResponse`].
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    context: Option<Cow<'a, str>>,
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates a new [`Error`] with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
            message: None,
            resource: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Attaches debugging context.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Sets a message safe to show to the caller.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Names the resource the error is about.
    #[inline]
    pub fn with_resource(self, resource: impl Into<Cow<'a, str>>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the context if present.
    #[inline]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns the custom message if present.
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the resource if present.
    #[inline]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Converts this error into a static version by cloning all borrowed data.
    pub fn into_static(self) -> Error<'static> {
        Error {
            kind: self.kind,
            context: self.context.map(|c| Cow::Owned(c.into_owned())),
            message: self.message.map(|m| Cow::Owned(m.into_owned())),
            resource: self.resource.map(|r| Cow::Owned(r.into_owned())),
        }
    }
}

impl Default for Error<'static> {
    #[inline]
    fn default() -> Self {
        Self::new(ErrorKind::default())
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("status", &self.kind.status_code())
            .field("message", &self.message)
            .field("resource", &self.resource)
            .field("context", &self.context)
            .finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let response = self.kind.response();
        let message = self.message.as_deref().unwrap_or(&response.message);
        write!(f, "{} ({}): {message}", response.name, response.status)?;

        if let Some(context) = &self.context {
            write!(f, " - {context}")?;
        }
        if let Some(resource) = &self.resource {
            write!(f, " [resource: {resource}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error<'_> {}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let mut response = self.kind.response();

        if let Some(message) = self.message {
            response = response.with_message(message);
        }
        if let Some(resource) = self.resource {
            response = response.with_resource(resource);
        }
        if let Some(context) = self.context {
            response = response.with_context(context);
        }

        if response.status.is_server_error() {
            tracing::error!(
                target: TRACING_TARGET,
                name = %response.name,
                message = %response.message,
                "request failed"
            );
        }

        response.into_response()
    }
}

impl aide::OperationOutput for Error<'_> {
    type Inner = ErrorResponse<'static>;
}

impl From<ferry_core::Error> for Error<'static> {
    /// Maps engine errors onto status codes.
    ///
    /// Configuration errors are the caller's fault, a missing collection or
    /// bucket is a 404, and everything else (connection failures, broken
    /// environment credentials, store I/O) is a 500.
    fn from(err: ferry_core::Error) -> Self {
        use ferry_core::ErrorKind as Engine;

        let kind = match err.kind() {
            Engine::Config => ErrorKind::BadRequest,
            Engine::NotFound => ErrorKind::NotFound,
            Engine::Connection | Engine::Store | Engine::Transform | Engine::Internal => {
                ErrorKind::InternalServerError
            }
        };

        kind.with_message(err.message().to_owned())
            .with_resource(err.kind().as_str())
    }
}

/// Specialized [`Result`] type for handlers.
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Kinds of HTTP errors the API returns.
#[must_use = "error kinds do nothing unless used to create errors"]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400: invalid request body or credentials.
    BadRequest,
    /// 404: nothing to migrate, or no bucket located.
    NotFound,
    /// 500: connection, store or configuration failure.
    #[default]
    InternalServerError,
}

impl ErrorKind {
    /// Converts this error kind into a full [`Error`].
    #[inline]
    pub fn into_error(self) -> Error<'static> {
        Error::new(self)
    }

    /// Creates an [`Error`] with the specified context.
    #[inline]
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }

    /// Creates an [`Error`] with the specified message.
    #[inline]
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Creates an [`Error`] with the specified resource.
    #[inline]
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    /// Returns the HTTP status code for this error kind.
    #[inline]
    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the base response of this kind.
    #[inline]
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response().name)
    }
}

impl IntoResponse for ErrorKind {
    #[inline]
    fn into_response(self) -> Response {
        self.into_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_internal() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn builder_chaining() {
        let error = ErrorKind::NotFound
            .with_message("Collection `produtos` is empty")
            .with_resource("collection")
            .with_context("source acme-old");

        assert_eq!(error.message(), Some("Collection `produtos` is empty"));
        assert_eq!(error.resource(), Some("collection"));
        assert_eq!(error.context(), Some("source acme-old"));

        let display = error.to_string();
        assert!(display.contains("not_found"));
        assert!(display.contains("404"));
        assert!(display.contains("produtos"));
    }

    #[test]
    fn engine_errors_map_to_status() {
        let cases = [
            (ferry_core::Error::config("missing `privateKey`"), StatusCode::BAD_REQUEST),
            (ferry_core::Error::not_found("no bucket"), StatusCode::NOT_FOUND),
            (
                ferry_core::Error::connection("acme".to_owned(), "token rejected"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ferry_core::Error::internal("source credentials are not configured"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (engine, status) in cases {
            let error = Error::from(engine);
            assert_eq!(error.kind().status_code(), status);
        }
    }

    #[test]
    fn into_static_keeps_fields() {
        let message = String::from("borrowed");
        let error = ErrorKind::BadRequest.with_message(message.as_str()).into_static();
        drop(message);
        assert_eq!(error.message(), Some("borrowed"));
    }
}
