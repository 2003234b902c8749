//! HTTP middleware configuration.
//!
//! The groups are defined in `ferry-server` and flattened here, so each one
//! is settable through flags and environment variables.

use clap::Args;
use ferry_server::middleware::{CorsConfig, OpenApiConfig, RecoveryConfig};

use crate::TRACING_TARGET_CONFIG;

/// CORS, OpenAPI and recovery settings.
#[derive(Debug, Clone, Args)]
pub struct MiddlewareConfig {
    /// Cross-origin access.
    #[clap(flatten)]
    pub cors: CorsConfig,

    /// OpenAPI document and reference page paths.
    #[clap(flatten)]
    pub openapi: OpenApiConfig,

    /// Request deadline.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            origins = ?self.cors.allowed_origins,
            credentials = self.cors.allow_credentials,
            "CORS configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            openapi_path = %self.openapi.open_api_json,
            scalar_path = %self.openapi.scalar_ui,
            "OpenAPI configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            "Recovery configuration"
        );
    }
}
