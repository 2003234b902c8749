//! Plain HTTP serving.

use axum::Router;
use tokio::net::TcpListener;

use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;
use crate::server::lifecycle::serve_with_shutdown;
use crate::server::{ServerError, ServerResult};

/// Binds the configured address and serves `app` over HTTP.
pub async fn serve_http(app: Router, config: ServerConfig) -> ServerResult<()> {
    let addr = config.server_addr();
    let listener = TcpListener::bind(addr).await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %addr,
            error = %err,
            "Failed to bind to address"
        );
        ServerError::Bind {
            address: addr.to_string(),
            source: err,
        }
    })?;

    serve_with_shutdown(&config, |graceful| async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = graceful.await;
            })
            .await
    })
    .await
}
