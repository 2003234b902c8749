use jiff::Timestamp;

use super::MigrationOptions;
use super::collections::enumerate_collections;
use crate::TRACING_TARGET_MIGRATE;
use crate::error::Result;
use crate::report::{MigrationReport, ReportBuilder, SecretRedactor};
use crate::store::DocumentStore;
use crate::transform::{TransformEffect, TransformPipeline};
use crate::types::Document;

/// Outcome of migrating a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// The source held no documents.
    NothingToMigrate,
    /// Documents were attempted; the report holds the counts.
    Migrated(MigrationReport),
}

/// Copies document collections in size-bounded batches.
#[derive(Debug, Clone)]
pub struct DocumentMigrator {
    options: MigrationOptions,
    pipeline: TransformPipeline,
    redactor: SecretRedactor,
}

impl DocumentMigrator {
    /// Creates a migrator with the standard transform pipeline.
    ///
    /// The current time is captured once and backfills every missing
    /// timestamp of this run.
    pub fn new(options: MigrationOptions) -> Self {
        let pipeline =
            TransformPipeline::standard(options.credential_collection(), Timestamp::now());
        Self {
            options,
            pipeline,
            redactor: SecretRedactor::default(),
        }
    }

    /// Replaces the transform pipeline.
    pub fn with_pipeline(mut self, pipeline: TransformPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Scrubs error reasons with `redactor`.
    pub fn with_redactor(mut self, redactor: SecretRedactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Migrates one collection.
    ///
    /// Failing to read the source listing is an error. Unreadable
    /// documents, transform failures and commit failures are recorded per
    /// document and do not stop the run.
    pub async fn migrate_collection(
        &self,
        source: &dyn DocumentStore,
        target: &dyn DocumentStore,
        collection: &str,
    ) -> Result<CollectionOutcome> {
        let documents = source.list_documents(collection).await?;
        if documents.is_empty() {
            tracing::info!(
                target: TRACING_TARGET_MIGRATE,
                collection,
                "nothing to migrate"
            );
            return Ok(CollectionOutcome::NothingToMigrate);
        }

        let mut report = ReportBuilder::new().with_redactor(self.redactor.clone());
        if collection == self.options.credential_collection() {
            report = report.with_credential_counts();
        }

        let transform = self.pipeline.for_collection(collection);
        let mut batch = Batch::with_capacity(self.options.batch_size());

        tracing::info!(
            target: TRACING_TARGET_MIGRATE,
            collection,
            documents = documents.len(),
            batch_size = self.options.batch_size(),
            "collection migration started"
        );

        for listed in documents {
            let document = match listed {
                Ok(document) => document,
                Err(unreadable) => {
                    tracing::warn!(
                        target: TRACING_TARGET_MIGRATE,
                        collection,
                        document_id = %unreadable.id,
                        error = %unreadable.error,
                        "document could not be read"
                    );
                    report.record_failure(unreadable.id, &unreadable.error);
                    continue;
                }
            };

            let id = document.id.clone();
            match transform.apply(document) {
                Ok(outcome) => {
                    batch.stage(outcome.document, outcome.effect);
                    if batch.len() >= self.options.batch_size() {
                        batch.commit(target, collection, &mut report).await;
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET_MIGRATE,
                        collection,
                        document_id = %id,
                        error = %err,
                        "document transform failed"
                    );
                    report.record_failure(id, &err);
                }
            }
        }

        if !batch.is_empty() {
            batch.commit(target, collection, &mut report).await;
        }

        let report = report.finish();
        tracing::info!(
            target: TRACING_TARGET_MIGRATE,
            collection,
            total = report.total_items,
            migrated = report.migrated_count,
            errors = report.error_count,
            batches = report.batch_count,
            "collection migration finished"
        );

        Ok(CollectionOutcome::Migrated(report))
    }

    /// Migrates every collection of the source, in name order.
    ///
    /// A collection that cannot be read is recorded as one failed item
    /// named after the collection. Returns
    /// [`CollectionOutcome::NothingToMigrate`] when no collection holds a
    /// document.
    pub async fn migrate_all(
        &self,
        source: &dyn DocumentStore,
        target: &dyn DocumentStore,
    ) -> Result<CollectionOutcome> {
        let collections = enumerate_collections(source).await?;
        let mut merged = MigrationReport::default();
        let mut failures = ReportBuilder::new().with_redactor(self.redactor.clone());
        let mut attempted = false;

        for collection in &collections {
            match self.migrate_collection(source, target, collection).await {
                Ok(CollectionOutcome::Migrated(report)) => {
                    attempted = true;
                    merged.absorb(collection, report);
                }
                Ok(CollectionOutcome::NothingToMigrate) => {}
                Err(err) => {
                    attempted = true;
                    tracing::error!(
                        target: TRACING_TARGET_MIGRATE,
                        collection = %collection,
                        error = %err,
                        "collection could not be read"
                    );
                    failures.record_failure(collection.as_str(), &err);
                }
            }
        }

        if !attempted {
            return Ok(CollectionOutcome::NothingToMigrate);
        }

        let failures = failures.finish();
        merged.total_items += failures.total_items;
        merged.error_count += failures.error_count;
        merged.error_details.extend(failures.error_details);

        Ok(CollectionOutcome::Migrated(merged))
    }
}

/// Documents staged for the next commit.
struct Batch {
    documents: Vec<Document>,
    effects: Vec<TransformEffect>,
}

impl Batch {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            documents: Vec::with_capacity(capacity),
            effects: Vec::with_capacity(capacity),
        }
    }

    fn stage(&mut self, document: Document, effect: TransformEffect) {
        self.documents.push(document);
        self.effects.push(effect);
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Commits and records every staged document as migrated or failed.
    async fn commit(
        &mut self,
        target: &dyn DocumentStore,
        collection: &str,
        report: &mut ReportBuilder,
    ) {
        let documents = std::mem::take(&mut self.documents);
        let effects = std::mem::take(&mut self.effects);
        let ids: Vec<String> = documents.iter().map(|doc| doc.id.clone()).collect();

        report.record_batch();
        match target.commit(collection, documents).await {
            Ok(()) => {
                tracing::debug!(
                    target: TRACING_TARGET_MIGRATE,
                    collection,
                    writes = ids.len(),
                    "batch committed"
                );
                for effect in effects {
                    report.record_migrated();
                    match effect {
                        TransformEffect::Converted => report.record_converted(),
                        TransformEffect::AlreadySecure => report.record_already_secure(),
                        TransformEffect::Unchanged => {}
                    }
                }
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_MIGRATE,
                    collection,
                    writes = ids.len(),
                    error = %err,
                    "batch commit failed"
                );
                for id in ids {
                    report.record_failure(id, &err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mock::MemoryDocumentStore;
    use crate::transform::{RecordTransform, TransformOutcome, hash_password};
    use crate::types::Value;

    fn seeded(collection: &str, count: usize) -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for i in 1..=count {
            store.insert(
                collection,
                Document::empty(format!("doc-{i:02}")).with_field("n", i as i64),
            );
        }
        store
    }

    fn migrator(batch_size: usize) -> DocumentMigrator {
        DocumentMigrator::new(MigrationOptions::new(batch_size, "usuarios").unwrap())
    }

    fn migrated(outcome: CollectionOutcome) -> MigrationReport {
        match outcome {
            CollectionOutcome::Migrated(report) => report,
            CollectionOutcome::NothingToMigrate => panic!("expected a migration report"),
        }
    }

    struct FailOn(&'static str);

    impl RecordTransform for FailOn {
        fn apply(&self, document: Document) -> Result<TransformOutcome> {
            if document.id == self.0 {
                return Err(Error::transform("unreadable record"));
            }
            Ok(TransformOutcome::unchanged(document))
        }
    }

    #[tokio::test]
    async fn copies_documents_by_id() -> anyhow::Result<()> {
        let source = seeded("produtos", 3);
        let target = MemoryDocumentStore::new();

        let report = migrated(migrator(500).migrate_collection(&source, &target, "produtos").await?);
        assert_eq!(report.total_items, 3);
        assert_eq!(report.migrated_count, 3);
        assert_eq!(report.converted_credential_count, None);
        assert_eq!(target.documents("produtos"), source.documents("produtos"));
        assert!(source.commits().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn commit_count_is_ceiling_of_n_over_b() -> anyhow::Result<()> {
        for (n, b, expected) in [(10, 3, 4), (9, 3, 3), (1, 500, 1), (1001, 500, 3)] {
            let source = seeded("c", n);
            let target = MemoryDocumentStore::new();

            let report = migrated(migrator(b).migrate_collection(&source, &target, "c").await?);
            let commits = target.commits();
            assert_eq!(commits.len(), expected, "n={n} b={b}");
            assert_eq!(report.batch_count, expected);
            assert!(commits.iter().all(|commit| commit.ids.len() <= b));
        }
        Ok(())
    }

    #[tokio::test]
    async fn rerun_is_idempotent() -> anyhow::Result<()> {
        let source = seeded("produtos", 7);
        let target = MemoryDocumentStore::new();
        let migrator = migrator(3);

        migrator.migrate_collection(&source, &target, "produtos").await?;
        let first = target.documents("produtos");
        migrator.migrate_collection(&source, &target, "produtos").await?;

        assert_eq!(target.documents("produtos"), first);
        assert_eq!(first.len(), 7);
        Ok(())
    }

    #[tokio::test]
    async fn transform_failure_does_not_stop_the_run() -> anyhow::Result<()> {
        let source = seeded("produtos", 10);
        let target = MemoryDocumentStore::new();
        let migrator = migrator(500)
            .with_pipeline(TransformPipeline::identity().with_transform("produtos", FailOn("doc-04")));

        let report = migrated(migrator.migrate_collection(&source, &target, "produtos").await?);
        assert_eq!(report.migrated_count, 9);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.error_details[0].item_id, "doc-04");
        assert_eq!(report.error_details[0].reason, "unreadable record");

        let written: Vec<_> = target.documents("produtos").into_iter().map(|d| d.id).collect();
        assert!(!written.contains(&"doc-04".to_owned()));
        assert!(written.contains(&"doc-05".to_owned()));
        assert!(written.contains(&"doc-10".to_owned()));
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_document_fails_alone() -> anyhow::Result<()> {
        let source = seeded("medicoes", 5);
        source.fail_read("doc-03");
        let target = MemoryDocumentStore::new();

        let report = migrated(migrator(2).migrate_collection(&source, &target, "medicoes").await?);
        assert_eq!(report.total_items, 5);
        assert_eq!(report.migrated_count, 4);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.error_details[0].item_id, "doc-03");
        assert_eq!(report.batch_count, 2);

        let written: Vec<_> = target.documents("medicoes").into_iter().map(|d| d.id).collect();
        assert_eq!(written, vec!["doc-01", "doc-02", "doc-04", "doc-05"]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_commit_fails_its_batch_only() -> anyhow::Result<()> {
        let source = seeded("c", 7);
        let target = MemoryDocumentStore::new();
        target.fail_commit(2);

        let report = migrated(migrator(3).migrate_collection(&source, &target, "c").await?);
        assert_eq!(report.batch_count, 3);
        assert_eq!(report.migrated_count, 4);
        assert_eq!(report.error_count, 3);
        let failed: Vec<_> = report.error_details.iter().map(|e| e.item_id.as_str()).collect();
        assert_eq!(failed, vec!["doc-04", "doc-05", "doc-06"]);
        assert_eq!(target.documents("c").len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn empty_collection_is_nothing_to_migrate() -> anyhow::Result<()> {
        let source = MemoryDocumentStore::new();
        let target = MemoryDocumentStore::new();

        let outcome = migrator(500).migrate_collection(&source, &target, "vazia").await?;
        assert_eq!(outcome, CollectionOutcome::NothingToMigrate);
        assert!(target.commits().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_source_is_an_error() {
        let source = seeded("c", 2);
        source.fail_listing("c");
        let target = MemoryDocumentStore::new();

        assert!(migrator(500).migrate_collection(&source, &target, "c").await.is_err());
    }

    #[tokio::test]
    async fn usuarios_scenario() -> anyhow::Result<()> {
        let source = MemoryDocumentStore::new();
        let user2 = Document::empty("user2")
            .with_field("senhaHash", "5e884898da28047151d0e56f8dc6292773603d0d")
            .with_field("salt", "a1b2c3");
        let user3 = Document::empty("user3");
        source.insert("usuarios", Document::empty("user1").with_field("senha", "abc123"));
        source.insert("usuarios", user2.clone());
        source.insert("usuarios", user3.clone());
        let target = MemoryDocumentStore::new();

        let report = migrated(migrator(500).migrate_collection(&source, &target, "usuarios").await?);
        assert_eq!(report.total_items, 3);
        assert_eq!(report.migrated_count, 3);
        assert_eq!(report.error_count, 0);
        assert_eq!(report.converted_credential_count, Some(1));
        assert_eq!(report.already_secure_count, Some(1));

        let user1 = target.get("usuarios", "user1").expect("user1 written");
        assert!(!user1.fields.contains_key("senha"));
        let salt = user1.get("salt").and_then(Value::as_str).unwrap_or_default();
        assert_eq!(
            user1.get("senhaHash").and_then(Value::as_str),
            Some(hash_password("abc123", salt).as_str())
        );
        assert_eq!(target.get("usuarios", "user2"), Some(user2));
        assert_eq!(target.get("usuarios", "user3"), Some(user3));
        Ok(())
    }

    #[tokio::test]
    async fn migrate_all_merges_collections() -> anyhow::Result<()> {
        let source = seeded("produtos", 2);
        source.insert("usuarios", Document::empty("u1").with_field("senha", "x"));
        source.insert("clientes", Document::empty("c1"));
        source.fail_listing("clientes");
        let target = MemoryDocumentStore::new();

        let report = migrated(migrator(500).migrate_all(&source, &target).await?);
        assert_eq!(report.total_items, 4);
        assert_eq!(report.migrated_count, 3);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.error_details[0].item_id, "clientes");
        assert_eq!(report.converted_credential_count, Some(1));
        assert_eq!(report.collections.map(|c| c.len()), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn migrate_all_on_empty_project() -> anyhow::Result<()> {
        let source = MemoryDocumentStore::new();
        let target = MemoryDocumentStore::new();

        let outcome = migrator(500).migrate_all(&source, &target).await?;
        assert_eq!(outcome, CollectionOutcome::NothingToMigrate);
        Ok(())
    }
}
