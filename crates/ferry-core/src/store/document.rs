use crate::types::Document;
use crate::{Error, Result};

/// A listed document whose contents could not be read.
///
/// Reported against its id so the rest of the collection still migrates.
#[derive(Debug)]
pub struct UnreadableDocument {
    /// Id of the document, as far as the store could tell.
    pub id: String,
    /// Why the document could not be read.
    pub error: Error,
}

impl UnreadableDocument {
    /// Creates an unreadable document entry.
    pub fn new(id: impl Into<String>, error: Error) -> Self {
        Self {
            id: id.into(),
            error,
        }
    }
}

/// One entry of a collection listing.
pub type ListedDocument = std::result::Result<Document, UnreadableDocument>;

/// Collection-of-documents database of one project.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists the names of the top-level collections.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Reads every document of `collection`, in store order.
    ///
    /// An unknown collection yields an empty list. A document that was
    /// listed but cannot be decoded is returned as an
    /// [`UnreadableDocument`] in its place; only failing to read the
    /// listing itself is an error.
    async fn list_documents(&self, collection: &str) -> Result<Vec<ListedDocument>>;

    /// Upserts `documents` into `collection` by id as one atomic batch.
    ///
    /// Either every write is applied or none is. Callers never pass more
    /// than [`MAX_BATCH_SIZE`](super::MAX_BATCH_SIZE) documents.
    async fn commit(&self, collection: &str, documents: Vec<Document>) -> Result<()>;
}
