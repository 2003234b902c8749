//! HTTPS serving with rustls.

use std::path::{Path, PathBuf};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;

use crate::TRACING_TARGET_SERVER_STARTUP;
use crate::config::ServerConfig;
use crate::server::lifecycle::serve_with_shutdown;
use crate::server::{ServerError, ServerResult};

/// Loads the certificate pair and serves `app` over HTTPS.
pub async fn serve_https(
    app: Router,
    config: ServerConfig,
    cert_path: PathBuf,
    key_path: PathBuf,
) -> ServerResult<()> {
    check_tls_file(&cert_path, "certificate")?;
    check_tls_file(&key_path, "private key")?;

    let tls = RustlsConfig::from_pem_file(&cert_path, &key_path)
        .await
        .map_err(|err| ServerError::TlsCertificate(format!("failed to load TLS files: {err}")))?;

    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        cert_path = %cert_path.display(),
        "TLS certificates loaded"
    );

    let addr = config.server_addr();
    let window = config.shutdown_timeout();
    serve_with_shutdown(&config, |graceful| async move {
        let handle = axum_server::Handle::new();
        let shutdown = handle.clone();
        tokio::spawn(async move {
            if graceful.await.is_ok() {
                shutdown.graceful_shutdown(Some(window));
            }
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await
    })
    .await
}

fn check_tls_file(path: &Path, what: &str) -> ServerResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        Ok(_) => Err(ServerError::TlsCertificate(format!(
            "{what} file is empty or not a file: {}",
            path.display()
        ))),
        Err(err) => Err(ServerError::TlsCertificate(format!(
            "cannot read {what} file {}: {err}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_rejected() {
        let err = check_tls_file(Path::new("does-not-exist.pem"), "certificate").unwrap_err();
        assert!(matches!(err, ServerError::TlsCertificate(msg) if msg.contains("certificate")));
    }
}
