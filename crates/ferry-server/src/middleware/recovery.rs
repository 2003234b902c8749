//! Timeouts, panics and tower service errors turned into JSON responses.

use std::any::Any;
use std::future::ready;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::ErrorKind;

/// Tracing target for error recovery.
const TRACING_TARGET_ERROR: &str = "ferry_server::recovery::error";

/// Tracing target for panic recovery.
const TRACING_TARGET_PANIC: &str = "ferry_server::recovery::panic";

type ResponseFut = BoxFuture<'static, Response>;
type Panic = Box<dyn Any + Send + 'static>;

/// Request deadline applied to every route.
///
/// A whole-collection run copies every document of a project in one
/// request, so deployments migrating large projects raise this well above
/// the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Seconds a request may run before it is answered with a timeout error.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value = "600")
    )]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout: 600,
        }
    }
}

impl RecoveryConfig {
    /// Creates a configuration with the given deadline in seconds.
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            request_timeout: secs,
        }
    }

    /// Returns the request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Extension trait for `axum::`[`Router`] to apply recovery middleware.
pub trait RouterRecoveryExt<S> {
    /// Layers the timeout, panic and service error handlers.
    fn with_recovery(self, config: &RecoveryConfig) -> Self;

    /// Layers recovery middleware with the default deadline.
    fn with_default_recovery(self) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        let middlewares = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .layer(CatchPanicLayer::custom(catch_panic))
            .layer(TimeoutLayer::new(config.request_timeout()));

        self.layer(middlewares)
    }

    fn with_default_recovery(self) -> Self {
        self.with_recovery(&RecoveryConfig::default())
    }
}

fn handle_error(err: tower::BoxError) -> ResponseFut {
    use tower::timeout::error::Elapsed;

    let error = if err.is::<Elapsed>() {
        tracing::error!(
            target: TRACING_TARGET_ERROR,
            error = %err,
            "request timeout exceeded"
        );

        ErrorKind::InternalServerError
            .with_message("Request timeout")
            .with_context(
                "The request took too long and was terminated. Writes already \
                 committed to the target project are kept.",
            )
    } else {
        tracing::error!(
            target: TRACING_TARGET_ERROR,
            error = %err,
            "unknown middleware error"
        );

        ErrorKind::InternalServerError
            .with_message("An unexpected error occurred")
            .with_context(err.to_string())
    };

    ready(error.into_response()).boxed()
}

fn catch_panic(err: Panic) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic type");

    tracing::error!(
        target: TRACING_TARGET_PANIC,
        message = %message,
        "service panic"
    );

    ErrorKind::InternalServerError
        .with_message("An unexpected panic occurred")
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    #[test]
    fn default_deadline_covers_long_runs() {
        let config = RecoveryConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(600));
        assert_eq!(
            RecoveryConfig::with_timeout_secs(5).request_timeout(),
            Duration::from_secs(5)
        );
    }

    #[tokio::test]
    async fn panic_becomes_server_error() -> anyhow::Result<()> {
        async fn explode() -> &'static str {
            panic!("boom")
        }

        let app = Router::new()
            .route("/explode", get(explode))
            .with_default_recovery();
        let server = TestServer::new(app)?;

        let response = server.get("/explode").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["name"], "internal_server_error");
        assert!(!response.text().contains("boom"));
        Ok(())
    }

    #[tokio::test]
    async fn slow_request_times_out() -> anyhow::Result<()> {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "done"
        }

        let app = Router::new()
            .route("/slow", get(slow))
            .with_recovery(&RecoveryConfig::with_timeout_secs(1));
        let server = TestServer::new(app)?;

        let response = server.get("/slow").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<serde_json::Value>();
        assert_eq!(body["message"], "Request timeout");
        Ok(())
    }
}
