use std::collections::HashSet;

use crate::TRACING_TARGET_MIGRATE;
use crate::error::{Error, Result};
use crate::report::{MigrationReport, ReportBuilder, SecretRedactor};
use crate::store::BlobStore;

/// Which source objects a blob run copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobSelection {
    /// Every object in the bucket.
    All,
    /// Objects whose path starts with one of these prefixes.
    Folders(Vec<String>),
}

impl BlobSelection {
    /// Builds a selection from the `migrateAll` flag and folder selectors.
    ///
    /// `migrate_all` wins over folders. Blank selectors are ignored; a
    /// request selecting nothing is a configuration error.
    pub fn from_request(migrate_all: bool, folders: Option<Vec<String>>) -> Result<Self> {
        if migrate_all {
            return Ok(Self::All);
        }

        let folders: Vec<String> = folders
            .unwrap_or_default()
            .into_iter()
            .filter(|folder| !folder.trim().is_empty())
            .collect();
        if folders.is_empty() {
            return Err(Error::config(
                "either `migrateAll` or at least one folder selector is required",
            ));
        }

        Ok(Self::Folders(folders))
    }
}

/// Copies bucket objects one at a time.
#[derive(Debug, Clone, Default)]
pub struct BlobMigrator {
    redactor: SecretRedactor,
}

impl BlobMigrator {
    /// Creates a blob migrator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scrubs error reasons with `redactor`.
    pub fn with_redactor(mut self, redactor: SecretRedactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Copies the selected objects from `source` to `target` under the same
    /// paths, with their content type and metadata.
    ///
    /// Failing to list the source is an error. Download and upload failures
    /// are recorded per object.
    pub async fn migrate(
        &self,
        source: &dyn BlobStore,
        target: &dyn BlobStore,
        selection: &BlobSelection,
    ) -> Result<MigrationReport> {
        let paths = candidates(source, selection).await?;
        let mut report = ReportBuilder::new().with_redactor(self.redactor.clone());

        tracing::info!(
            target: TRACING_TARGET_MIGRATE,
            source_bucket = %source.bucket(),
            target_bucket = %target.bucket(),
            objects = paths.len(),
            "blob migration started"
        );

        for path in paths {
            let copied = match source.download(&path).await {
                Ok(object) => {
                    let size = object.size();
                    target.upload(object).await.map(|()| size)
                }
                Err(err) => Err(err),
            };

            match copied {
                Ok(size) => {
                    tracing::debug!(
                        target: TRACING_TARGET_MIGRATE,
                        path = %path,
                        size,
                        "object copied"
                    );
                    report.record_migrated();
                }
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET_MIGRATE,
                        path = %path,
                        error = %err,
                        "object copy failed"
                    );
                    report.record_failure(path, &err);
                }
            }
        }

        let report = report.finish();
        tracing::info!(
            target: TRACING_TARGET_MIGRATE,
            total = report.total_items,
            migrated = report.migrated_count,
            errors = report.error_count,
            "blob migration finished"
        );

        Ok(report)
    }
}

/// Lists candidate paths in listing order, each path once.
async fn candidates(source: &dyn BlobStore, selection: &BlobSelection) -> Result<Vec<String>> {
    let listed = match selection {
        BlobSelection::All => source.list("").await?,
        BlobSelection::Folders(folders) => {
            let mut listed = Vec::new();
            for folder in folders {
                listed.extend(source.list(folder).await?);
            }
            listed
        }
    };

    let mut seen = HashSet::with_capacity(listed.len());
    Ok(listed
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect())
}
