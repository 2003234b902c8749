//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig         # Host, port, TLS, shutdown
//! ├── middleware: MiddlewareConfig # CORS, OpenAPI, request timeout
//! └── service: ServiceConfig       # Project credentials, batch size
//! ```
//!
//! Every option is a flag and an environment variable. Use `--help` to see
//! them all.

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
use ferry_server::service::ServiceConfig;
pub use middleware::MiddlewareConfig;
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "ferry")]
#[command(about = "Firestore document and blob migration server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, OpenAPI, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Project credentials and migration settings.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads the `.env` file (if enabled), then parses arguments, so values
    /// from the file act as environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with `RUST_LOG` filtering, `info` by default.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Validates every configuration group.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs the configuration. Private keys are reported only as present
    /// or absent.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        self.server.log();
        self.middleware.log();

        let service = &self.service;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            source_project_id = ?service.source_project_id,
            source_private_key = service.source_private_key.is_some(),
            target_project_id = ?service.target_project_id,
            target_private_key = service.target_private_key.is_some(),
            batch_size = service.batch_size,
            credential_collection = %service.credential_collection,
            http_timeout_secs = service.http_timeout_secs,
            "Service configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "tls").then_some("tls"),
            cfg!(feature = "dotenv").then_some("dotenv"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
