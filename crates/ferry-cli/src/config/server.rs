//! HTTP server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
#[cfg(feature = "tls")]
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;

use crate::TRACING_TARGET_CONFIG;

/// Longest accepted graceful shutdown window in seconds.
const MAX_SHUTDOWN_TIMEOUT: u64 = 3600;

/// Network binding and shutdown behavior.
///
/// Migrations run inside requests, so the shutdown window should be long
/// enough for an in-flight run to finish its current collection.
#[derive(Debug, Clone, Args)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Address to bind. `0.0.0.0` listens on all interfaces.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// TCP port, 1024-65535.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds in-flight requests get to finish after a shutdown signal.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 120)]
    pub shutdown_timeout: u64,

    /// TLS certificate chain (PEM).
    #[cfg(feature = "tls")]
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<PathBuf>,

    /// TLS private key (PEM).
    #[cfg(feature = "tls")]
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            shutdown_timeout: 120,
            #[cfg(feature = "tls")]
            tls_cert_path: None,
            #[cfg(feature = "tls")]
            tls_key_path: None,
        }
    }
}

impl ServerConfig {
    /// Checks port, shutdown window and TLS paths.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.port < 1024 {
            return Err(anyhow!(
                "port {} is below 1024, use 1024-65535 to avoid requiring root privileges",
                self.port
            ));
        }

        if self.shutdown_timeout == 0 || self.shutdown_timeout > MAX_SHUTDOWN_TIMEOUT {
            return Err(anyhow!(
                "shutdown timeout of {} seconds is invalid, must be between 1 and {MAX_SHUTDOWN_TIMEOUT}",
                self.shutdown_timeout
            ));
        }

        #[cfg(feature = "tls")]
        if self.tls_cert_path.is_some() != self.tls_key_path.is_some() {
            return Err(anyhow!(
                "TLS certificate and key paths must be provided together"
            ));
        }

        Ok(())
    }

    /// Returns the address to bind.
    #[must_use]
    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the graceful shutdown window.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Returns true when bound to every interface.
    #[must_use]
    pub fn binds_to_all_interfaces(&self) -> bool {
        self.host.is_unspecified()
    }

    /// Returns true when both TLS paths are set.
    #[cfg(feature = "tls")]
    #[must_use]
    pub fn is_tls_enabled(&self) -> bool {
        self.tls_cert_path.is_some() && self.tls_key_path.is_some()
    }

    /// Logs server configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            host = %self.host,
            port = self.port,
            shutdown_timeout_secs = self.shutdown_timeout,
            tls = cfg!(feature = "tls"),
            "Server configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.binds_to_all_interfaces());
        assert_eq!(
            config.server_addr(),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080)
        );
    }

    #[test]
    fn privileged_ports_are_rejected() {
        let config = ServerConfig {
            port: 80,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shutdown_window_is_bounded() {
        let mut config = ServerConfig::default();

        config.shutdown_timeout = 0;
        assert!(config.validate().is_err());

        config.shutdown_timeout = MAX_SHUTDOWN_TIMEOUT + 1;
        assert!(config.validate().is_err());

        config.shutdown_timeout = 600;
        assert!(config.validate().is_ok());
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn unspecified_host_binds_everywhere() {
        let config = ServerConfig {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ..ServerConfig::default()
        };
        assert!(config.binds_to_all_interfaces());
    }

    #[cfg(feature = "tls")]
    #[test]
    fn tls_paths_come_in_pairs() {
        let config = ServerConfig {
            tls_cert_path: Some(PathBuf::from("cert.pem")),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(!config.is_tls_enabled());
    }
}
