//! Migration response types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::service::ProjectProbe;

/// One project as seen by a connection check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCheck {
    /// Project the credentials belong to.
    pub project_id: String,
    /// Storage bucket located for the project, if any.
    pub bucket: Option<String>,
}

impl From<ProjectProbe> for ProjectCheck {
    fn from(probe: ProjectProbe) -> Self {
        Self {
            project_id: probe.project_id,
            bucket: probe.bucket,
        }
    }
}

/// Result of connecting to both projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheck {
    /// The source project.
    pub source: ProjectCheck,
    /// The target project.
    pub target: ProjectCheck,
}

/// Top-level collections of the source project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    /// Collection names, sorted.
    pub collections: Vec<String>,
}

/// Top-level folders of the source bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Folders {
    /// Bucket that was listed; absent when none was located.
    pub bucket: Option<String>,
    /// Folder prefixes ending in `/`, sorted.
    pub folders: Vec<String>,
}
