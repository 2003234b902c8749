use std::sync::Arc;

use crate::Result;
use crate::types::BlobObject;

/// Handle to a single bucket.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the bucket name.
    fn bucket(&self) -> &str;

    /// Issues a cheap listing call to check that the bucket is reachable.
    ///
    /// Succeeds for an empty bucket.
    async fn probe(&self) -> Result<()>;

    /// Lists the paths of every object whose path starts with `prefix`.
    ///
    /// Matching is on the raw path string, so `img` matches both
    /// `img/a.png` and `imgs/b.png`. An empty prefix lists the whole bucket.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Lists top-level folder prefixes, each ending with `/`.
    async fn list_folders(&self) -> Result<Vec<String>>;

    /// Downloads an object with its content type and custom metadata.
    async fn download(&self, path: &str) -> Result<BlobObject>;

    /// Uploads an object, overwriting any object at the same path.
    async fn upload(&self, object: BlobObject) -> Result<()>;
}

/// Opens bucket handles of one project by name.
#[async_trait::async_trait]
pub trait BucketProvider: Send + Sync {
    /// Opens a handle to `bucket` without checking that it exists.
    async fn open(&self, bucket: &str) -> Result<Arc<dyn BlobStore>>;
}
