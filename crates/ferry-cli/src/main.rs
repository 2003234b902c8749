#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use ferry_server::handler::routes;
use ferry_server::middleware::{
    RouterObservabilityExt, RouterOpenApiExt, RouterRecoveryExt, RouterSecurityExt,
    SecurityHeadersConfig,
};
use ferry_server::service::{ServiceConfig, ServiceState};

use crate::config::{Cli, MiddlewareConfig};
use crate::server::ServerError;

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "ferry_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "ferry_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "ferry_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        let transient = error
            .downcast_ref::<ServerError>()
            .is_some_and(ServerError::is_transient);
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            transient,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing();

    cli.log();
    cli.validate()?;

    let state = create_service_state(&cli.service)?;
    let router = create_router(state, &cli.middleware);

    server::serve(router, cli.server).await?;
    Ok(())
}

fn create_service_state(config: &ServiceConfig) -> anyhow::Result<ServiceState> {
    ServiceState::from_config(config).context("failed to create service state")
}

/// Creates the router with all middleware layers applied.
///
/// The last layer added is the outermost: recovery wraps observability,
/// which wraps security, which wraps the routes.
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    let api_routes: Router = routes()
        .with_open_api(&middleware.openapi)
        .with_state(state);

    api_routes
        .with_security(&middleware.cors, &SecurityHeadersConfig::default())
        .with_observability()
        .with_recovery(&middleware.recovery)
}
