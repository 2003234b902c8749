//! Monitor response types.

use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Health of the running service.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Whether the service accepts migration requests.
    pub is_healthy: bool,
    /// When this status was produced.
    pub updated_at: Timestamp,
    /// Project connections currently open.
    pub active_connections: usize,
}
