//! Migration operations behind the HTTP handlers.

use std::fmt;
use std::sync::Arc;

use ferry_core::bucket::{BucketLocator, LocatedBucket};
use ferry_core::connection::{
    ProjectConnection, ProjectConnector, ProjectRole, connect_one, connect_pair,
};
use ferry_core::credentials::{CredentialResolver, CredentialSource};
use ferry_core::migrate::{
    BlobMigrator, BlobSelection, CollectionOutcome, DocumentMigrator, MigrationOptions,
    enumerate_collections,
};
use ferry_core::report::MigrationReport;
use ferry_core::{Error, Result};

/// Tracing target for migration operations.
const TRACING_TARGET: &str = "ferry_server::service::migration";

/// A connected project and the bucket located for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProbe {
    /// Project id.
    pub project_id: String,
    /// Located bucket, if any.
    pub bucket: Option<String>,
}

/// Top-level folders of a project bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    /// Bucket that was listed; `None` when none was located.
    pub bucket: Option<String>,
    /// Folder prefixes ending in `/`.
    pub folders: Vec<String>,
}

/// Runs migrations with connections opened per call.
///
/// Every operation opens its own connections and drops them before
/// returning, whether it succeeds or fails.
#[derive(Clone)]
pub struct MigrationService {
    connector: Arc<dyn ProjectConnector>,
    resolver: CredentialResolver,
    options: MigrationOptions,
    locator: Arc<BucketLocator>,
}

impl fmt::Debug for MigrationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationService")
            .field("options", &self.options)
            .field("active_connections", &self.active_connections())
            .finish_non_exhaustive()
    }
}

impl MigrationService {
    /// Creates a service with the default bucket naming conventions.
    pub fn new(
        connector: Arc<dyn ProjectConnector>,
        resolver: CredentialResolver,
        options: MigrationOptions,
    ) -> Self {
        Self {
            connector,
            resolver,
            options,
            locator: Arc::new(BucketLocator::default()),
        }
    }

    /// Replaces the bucket locator.
    pub fn with_locator(mut self, locator: BucketLocator) -> Self {
        self.locator = Arc::new(locator);
        self
    }

    /// Returns the number of project connections currently open.
    pub fn active_connections(&self) -> usize {
        self.connector.active_connections()
    }

    async fn locate(&self, connection: &ProjectConnection) -> Option<LocatedBucket> {
        self.locator
            .locate(connection.buckets(), connection.project_id())
            .await
    }

    /// Connects to both projects and locates their buckets.
    pub async fn verify(
        &self,
        source: &CredentialSource,
        target: &CredentialSource,
    ) -> Result<(ProjectProbe, ProjectProbe)> {
        let pair = connect_pair(self.connector.as_ref(), &self.resolver, source, target).await?;

        let probe = |connection: &ProjectConnection, bucket: Option<LocatedBucket>| ProjectProbe {
            project_id: connection.project_id().to_owned(),
            bucket: bucket.map(|located| located.name),
        };
        let source_bucket = self.locate(&pair.source).await;
        let target_bucket = self.locate(&pair.target).await;

        Ok((
            probe(&pair.source, source_bucket),
            probe(&pair.target, target_bucket),
        ))
    }

    /// Lists the top-level collections of the source project.
    pub async fn list_collections(&self, source: &CredentialSource) -> Result<Vec<String>> {
        let connection = connect_one(
            self.connector.as_ref(),
            &self.resolver,
            ProjectRole::Source,
            source,
        )
        .await?;
        enumerate_collections(connection.documents()).await
    }

    /// Copies one collection, or every collection when `collection` is
    /// `None`.
    ///
    /// Returns a not-found error when there is nothing to copy.
    pub async fn migrate_documents(
        &self,
        source: &CredentialSource,
        target: &CredentialSource,
        collection: Option<&str>,
    ) -> Result<MigrationReport> {
        let pair = connect_pair(self.connector.as_ref(), &self.resolver, source, target).await?;
        let migrator = DocumentMigrator::new(self.options.clone()).with_redactor(pair.redactor);
        let (from, to) = (pair.source.documents(), pair.target.documents());

        let outcome = match collection {
            Some(name) => migrator.migrate_collection(from, to, name).await?,
            None => migrator.migrate_all(from, to).await?,
        };

        match (outcome, collection) {
            (CollectionOutcome::Migrated(report), _) => Ok(report),
            (CollectionOutcome::NothingToMigrate, Some(name)) => Err(Error::not_found(format!(
                "collection `{name}` has no documents in {}",
                pair.source.project_id()
            ))),
            (CollectionOutcome::NothingToMigrate, None) => Err(Error::not_found(format!(
                "{} has no documents to migrate",
                pair.source.project_id()
            ))),
        }
    }

    /// Lists the top-level folders of the source bucket.
    ///
    /// A project without a located bucket yields an empty listing.
    pub async fn list_folders(&self, source: &CredentialSource) -> Result<FolderListing> {
        let connection = connect_one(
            self.connector.as_ref(),
            &self.resolver,
            ProjectRole::Source,
            source,
        )
        .await?;

        let Some(bucket) = self.locate(&connection).await else {
            return Ok(FolderListing::default());
        };
        let folders = bucket.store.list_folders().await?;

        Ok(FolderListing {
            bucket: Some(bucket.name),
            folders,
        })
    }

    /// Copies the selected blobs from the source bucket to the target
    /// bucket.
    ///
    /// The selection is checked before any connection is opened.
    pub async fn migrate_blobs(
        &self,
        source: &CredentialSource,
        target: &CredentialSource,
        migrate_all: bool,
        folders: Option<Vec<String>>,
    ) -> Result<MigrationReport> {
        let selection = BlobSelection::from_request(migrate_all, folders)?;
        let pair = connect_pair(self.connector.as_ref(), &self.resolver, source, target).await?;

        let source_bucket = self.locate(&pair.source).await.ok_or_else(|| {
            Error::not_found(format!("no bucket found for source {}", pair.source.project_id()))
        })?;
        let target_bucket = self.locate(&pair.target).await.ok_or_else(|| {
            Error::not_found(format!("no bucket found for target {}", pair.target.project_id()))
        })?;

        tracing::info!(
            target: TRACING_TARGET,
            source_bucket = %source_bucket.name,
            target_bucket = %target_bucket.name,
            migrate_all,
            "blob migration resolved buckets"
        );

        BlobMigrator::new()
            .with_redactor(pair.redactor)
            .migrate(
                source_bucket.store.as_ref(),
                target_bucket.store.as_ref(),
                &selection,
            )
            .await
    }
}
