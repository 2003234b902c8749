//! Document-store and blob-store collaborators.
//!
//! The migrators only ever talk to these traits. `ferry-firestore` and
//! `ferry-object` implement them against Google Cloud, the [`mock`] module
//! implements them in memory.
//!
//! [`mock`]: crate::mock

mod blob;
mod document;

pub use blob::{BlobStore, BucketProvider};
pub use document::{DocumentStore, ListedDocument, UnreadableDocument};

/// Largest number of writes a single [`DocumentStore::commit`] accepts.
pub const MAX_BATCH_SIZE: usize = 500;
