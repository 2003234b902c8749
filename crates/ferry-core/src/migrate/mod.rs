//! Document and blob migration.
//!
//! Both migrators read the source strictly read-only, write the target by
//! id or path with overwrite semantics, and keep going after per-item
//! failures. Re-running a migration converges on the same target state.

mod blobs;
mod collections;
mod documents;

pub use blobs::{BlobMigrator, BlobSelection};
pub use collections::enumerate_collections;
pub use documents::{CollectionOutcome, DocumentMigrator};

use crate::error::{Error, Result};
use crate::store::MAX_BATCH_SIZE;

/// Collection whose records get the credential upgrade by default.
pub const DEFAULT_CREDENTIAL_COLLECTION: &str = "usuarios";

/// Settings shared by every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    batch_size: usize,
    credential_collection: String,
}

impl MigrationOptions {
    /// Creates options, checking that `batch_size` is within `1..=500`.
    pub fn new(batch_size: usize, credential_collection: impl Into<String>) -> Result<Self> {
        if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(Error::config(format!(
                "batch size must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}"
            )));
        }

        let credential_collection = credential_collection.into();
        if credential_collection.trim().is_empty() {
            return Err(Error::config("credential collection must not be empty"));
        }

        Ok(Self {
            batch_size,
            credential_collection,
        })
    }

    /// Returns the number of writes per batch commit.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the collection whose records get the credential upgrade.
    #[must_use]
    pub fn credential_collection(&self) -> &str {
        &self.credential_collection
    }
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            credential_collection: DEFAULT_CREDENTIAL_COLLECTION.to_owned(),
        }
    }
}
