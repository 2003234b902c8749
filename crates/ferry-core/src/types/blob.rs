use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

/// An object held in a bucket, fully buffered in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct BlobObject {
    /// Object path, unique within a bucket.
    pub path: String,
    /// Object content.
    pub bytes: Bytes,
    /// MIME type of the content, if recorded.
    pub content_type: Option<String>,
    /// Custom metadata key/value pairs.
    pub metadata: BTreeMap<String, String>,
}

impl BlobObject {
    /// Creates a new object without content type or metadata.
    pub fn new(path: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
            content_type: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Adds a custom metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the content size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for BlobObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobObject")
            .field("path", &self.path)
            .field("size", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("metadata", &self.metadata)
            .finish()
    }
}
