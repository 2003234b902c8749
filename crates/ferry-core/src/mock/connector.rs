use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;
use super::{MemoryBuckets, MemoryDocumentStore};
use crate::connection::{ConnectionRegistry, ProjectConnection, ProjectConnector, ProjectRole};
use crate::credentials::CloudCredentials;
use crate::error::{Error, Result};

/// Stores of one in-memory project.
#[derive(Debug, Clone, Default)]
pub struct MemoryProject {
    /// Document store.
    pub documents: Arc<MemoryDocumentStore>,
    /// Buckets.
    pub buckets: Arc<MemoryBuckets>,
}

/// Connector serving in-memory projects keyed by project id.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    projects: Mutex<HashMap<String, MemoryProject>>,
    unreachable: Mutex<HashSet<String>>,
    attempts: AtomicUsize,
    registry: ConnectionRegistry,
}

impl MemoryConnector {
    /// Creates a connector without projects.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty project, or returns the existing one.
    pub fn add_project(&self, project_id: &str) -> MemoryProject {
        lock(&self.projects)
            .entry(project_id.to_owned())
            .or_default()
            .clone()
    }

    /// Returns an existing project.
    #[must_use]
    pub fn project(&self, project_id: &str) -> Option<MemoryProject> {
        lock(&self.projects).get(project_id).cloned()
    }

    /// Makes connecting to `project_id` fail.
    pub fn fail_connect(&self, project_id: &str) {
        lock(&self.unreachable).insert(project_id.to_owned());
    }

    /// Returns the number of connection attempts so far.
    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Returns the connection registry.
    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

#[async_trait::async_trait]
impl ProjectConnector for MemoryConnector {
    async fn connect(
        &self,
        role: ProjectRole,
        credentials: &CloudCredentials,
    ) -> Result<ProjectConnection> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let project_id = credentials.project_id.as_str();

        if lock(&self.unreachable).contains(project_id) {
            return Err(Error::connection(project_id.to_owned(), "project unreachable"));
        }
        let Some(project) = self.project(project_id) else {
            return Err(Error::connection(project_id.to_owned(), "project not found"));
        };

        let lease = self.registry.register(role, project_id)?;
        Ok(ProjectConnection::new(
            lease,
            project_id,
            project.documents,
            project.buckets,
        ))
    }

    fn active_connections(&self) -> usize {
        self.registry.active_count()
    }
}
