//! Shared serve loop: readiness logging, shutdown window, exit logging.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::config::ServerConfig;
use crate::server::{ServerError, ServerResult, shutdown_signal};
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Runs the future `serve_fn` builds until it completes, or until the
/// shutdown window closes after a signal.
///
/// `serve_fn` receives the graceful shutdown trigger to pass to the server.
pub(crate) async fn serve_with_shutdown<F>(
    config: &ServerConfig,
    serve_fn: impl FnOnce(oneshot::Receiver<()>) -> F,
) -> ServerResult<()>
where
    F: Future<Output = io::Result<()>>,
{
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        addr = %config.server_addr(),
        "Server is ready and listening for connections"
    );

    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "Server is bound to all interfaces and accepts credentials over the network"
        );
    }

    let (trigger, graceful) = oneshot::channel();
    let (started, deadline) = oneshot::channel();
    let window = config.shutdown_timeout();

    tokio::spawn(async move {
        shutdown_signal(window).await;
        let _ = trigger.send(());
        let _ = started.send(());
    });

    tokio::select! {
        result = serve_fn(graceful) => {
            result.map_err(|err| {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %err,
                    "Server encountered an error"
                );
                ServerError::Runtime(err)
            })?;
            tracing::info!(target: TRACING_TARGET_SERVER_SHUTDOWN, "Server shut down gracefully");
        }
        () = window_closed(deadline, window) => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = window.as_secs(),
                "Shutdown window closed with requests still in flight"
            );
        }
    }

    Ok(())
}

/// Resolves `window` after the shutdown signal, never without one.
async fn window_closed(signal: oneshot::Receiver<()>, window: Duration) {
    match signal.await {
        Ok(()) => tokio::time::sleep(window).await,
        Err(_) => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn window_waits_for_signal() {
        let (_tx, rx) = oneshot::channel();
        let closed = tokio::time::timeout(
            Duration::from_millis(50),
            window_closed(rx, Duration::ZERO),
        )
        .await;
        assert!(closed.is_err());
    }

    #[tokio::test]
    async fn window_closes_after_signal() {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(());
        let closed = tokio::time::timeout(
            Duration::from_secs(1),
            window_closed(rx, Duration::from_millis(10)),
        )
        .await;
        assert!(closed.is_ok());
    }

    #[tokio::test]
    async fn server_error_is_runtime_error() {
        let config = ServerConfig::default();
        let result = serve_with_shutdown(&config, |_| async {
            Err(io::Error::other("listener closed"))
        })
        .await;
        assert!(matches!(result, Err(ServerError::Runtime(_))));
    }
}
