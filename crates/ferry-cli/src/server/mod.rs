//! HTTP and HTTPS serving with graceful shutdown.
//!
//! The protocol is chosen at compile time: with the `tls` feature and both
//! certificate paths configured, the router is served over HTTPS.

mod error;
mod http_server;
#[cfg(feature = "tls")]
mod https_server;
mod lifecycle;
mod shutdown;

use axum::Router;
pub use error::{ServerError, ServerResult};
use shutdown::shutdown_signal;

use crate::config::ServerConfig;

/// Serves `app` until a shutdown signal arrives and in-flight requests
/// finish or the shutdown window closes.
pub async fn serve(app: Router, config: ServerConfig) -> ServerResult<()> {
    #[cfg(feature = "tls")]
    if let (Some(cert), Some(key)) = (config.tls_cert_path.clone(), config.tls_key_path.clone()) {
        return https_server::serve_https(app, config, cert, key).await;
    }

    http_server::serve_http(app, config).await
}
