//! Health check handler.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use jiff::Timestamp;

use crate::extract::Json;
use crate::handler::Result;
use crate::handler::response::HealthStatus;
use crate::service::{MigrationService, ServiceState};

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "ferry_server::handler::monitors";

/// Reports that the service is up.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(migrations): State<MigrationService>,
) -> Result<(StatusCode, Json<HealthStatus>)> {
    let status = HealthStatus {
        is_healthy: true,
        updated_at: Timestamp::now(),
        active_connections: migrations.active_connections(),
    };

    tracing::debug!(
        target: TRACING_TARGET,
        active_connections = status.active_connections,
        "health status reported"
    );

    Ok((StatusCode::OK, Json(status)))
}

fn health_status_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Get health status")
        .description("Returns liveness and the number of project connections currently open.")
        .response::<200, Json<HealthStatus>>()
}

/// Returns routes for health monitoring.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/health", get_with(health_status, health_status_docs))
        .with_path_items(|item| item.tag("Monitors"))
}
