//! Per-collection record transforms.
//!
//! Every document passes through the [`RecordTransform`] registered for its
//! collection before it is written to the target. Collections without a
//! registered transform are copied verbatim by [`Identity`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;

use crate::Result;
use crate::types::Document;

mod credential;

pub use credential::{CredentialFields, CredentialUpgrade, hash_password};

/// What a transform did to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformEffect {
    /// Copied as is.
    Unchanged,
    /// A legacy credential was replaced by a salted hash.
    Converted,
    /// The credential was already hashed and was not touched.
    AlreadySecure,
}

/// Result of transforming one document.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    /// Document to write to the target.
    pub document: Document,
    /// What was done to it.
    pub effect: TransformEffect,
}

impl TransformOutcome {
    /// Wraps a document copied as is.
    pub fn unchanged(document: Document) -> Self {
        Self {
            document,
            effect: TransformEffect::Unchanged,
        }
    }
}

/// Transform applied to each document of a collection.
///
/// An error skips the document and is recorded in the run report.
pub trait RecordTransform: Send + Sync {
    /// Transforms one document.
    fn apply(&self, document: Document) -> Result<TransformOutcome>;
}

/// Copies documents verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl RecordTransform for Identity {
    fn apply(&self, document: Document) -> Result<TransformOutcome> {
        Ok(TransformOutcome::unchanged(document))
    }
}

/// Maps collection names to their transforms.
#[derive(Clone)]
pub struct TransformPipeline {
    transforms: HashMap<String, Arc<dyn RecordTransform>>,
}

impl TransformPipeline {
    /// Creates a pipeline where every collection is copied verbatim.
    pub fn identity() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Creates the standard pipeline: the credential upgrade on
    /// `credential_collection`, identity everywhere else.
    ///
    /// `executed_at` backfills missing timestamps of upgraded records.
    pub fn standard(credential_collection: impl Into<String>, executed_at: Timestamp) -> Self {
        Self::identity().with_transform(
            credential_collection,
            CredentialUpgrade::new(CredentialFields::default(), executed_at),
        )
    }

    /// Registers `transform` for `collection`, replacing any previous one.
    pub fn with_transform(
        mut self,
        collection: impl Into<String>,
        transform: impl RecordTransform + 'static,
    ) -> Self {
        self.transforms.insert(collection.into(), Arc::new(transform));
        self
    }

    /// Returns the transform of `collection`.
    #[must_use]
    pub fn for_collection(&self, collection: &str) -> Arc<dyn RecordTransform> {
        self.transforms
            .get(collection)
            .cloned()
            .unwrap_or_else(|| Arc::new(Identity))
    }
}

impl fmt::Debug for TransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut collections: Vec<_> = self.transforms.keys().collect();
        collections.sort();
        f.debug_struct("TransformPipeline")
            .field("collections", &collections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_for_unregistered_collections() -> anyhow::Result<()> {
        let pipeline = TransformPipeline::standard("usuarios", Timestamp::UNIX_EPOCH);
        let doc = Document::empty("p1").with_field("senha", "abc123");

        let outcome = pipeline.for_collection("produtos").apply(doc.clone())?;
        assert_eq!(outcome, TransformOutcome::unchanged(doc));
        Ok(())
    }

    #[test]
    fn credential_collection_is_upgraded() -> anyhow::Result<()> {
        let pipeline = TransformPipeline::standard("usuarios", Timestamp::UNIX_EPOCH);
        let doc = Document::empty("u1").with_field("senha", "abc123");

        let outcome = pipeline.for_collection("usuarios").apply(doc)?;
        assert_eq!(outcome.effect, TransformEffect::Converted);
        assert!(!outcome.document.has("senha"));
        Ok(())
    }
}
