//! [`BlobStore`] over any [`ObjectStore`] backend.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ferry_core::Result;
use ferry_core::store::BlobStore;
use ferry_core::types::BlobObject;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::{Attribute, ObjectStore, PutOptions, PutPayload};

use crate::TRACING_TARGET;
use crate::error::from_object_store;

/// Cloneable handle to one named bucket.
#[derive(Clone)]
pub struct ObjectBucket {
    name: String,
    store: Arc<dyn ObjectStore>,
}

impl fmt::Debug for ObjectBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBucket")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ObjectBucket {
    /// Wraps a store already scoped to bucket `name`.
    pub fn new(name: impl Into<String>, store: impl ObjectStore) -> Self {
        Self::from_arc(name, Arc::new(store))
    }

    /// Wraps a shared store already scoped to bucket `name`.
    pub fn from_arc(name: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }
}

/// Returns the deepest full segment of `prefix`, the listing root that
/// covers every path starting with it.
fn listing_root(prefix: &str) -> Option<Path> {
    match prefix.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => Some(Path::from(parent)),
        _ => None,
    }
}

#[async_trait::async_trait]
impl BlobStore for ObjectBucket {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> Result<()> {
        match self.store.list(None).next().await {
            Some(Err(err)) => Err(from_object_store(&self.name, err)),
            _ => Ok(()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let root = listing_root(prefix);
        let mut paths: Vec<String> = self
            .store
            .list(root.as_ref())
            .map_ok(|meta| meta.location.to_string())
            .try_filter(|path| futures::future::ready(path.starts_with(prefix)))
            .try_collect()
            .await
            .map_err(|err| from_object_store(&self.name, err))?;
        paths.sort_unstable();

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %self.name,
            prefix,
            objects = paths.len(),
            "objects listed"
        );
        Ok(paths)
    }

    async fn list_folders(&self) -> Result<Vec<String>> {
        let listing = self
            .store
            .list_with_delimiter(None)
            .await
            .map_err(|err| from_object_store(&self.name, err))?;

        let mut folders: Vec<String> = listing
            .common_prefixes
            .iter()
            .map(|prefix| format!("{prefix}/"))
            .collect();
        folders.sort_unstable();
        Ok(folders)
    }

    async fn download(&self, path: &str) -> Result<BlobObject> {
        let location = Path::from(path);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|err| from_object_store(&self.name, err))?;

        let mut content_type = None;
        let mut metadata = BTreeMap::new();
        for (attribute, value) in result.attributes.iter() {
            match attribute {
                Attribute::ContentType => content_type = Some(value.to_string()),
                Attribute::Metadata(key) => {
                    metadata.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        let bytes = result
            .bytes()
            .await
            .map_err(|err| from_object_store(&self.name, err))?;

        Ok(BlobObject {
            path: path.to_owned(),
            bytes,
            content_type,
            metadata,
        })
    }

    async fn upload(&self, object: BlobObject) -> Result<()> {
        let location = Path::from(object.path.as_str());
        let mut opts = PutOptions::default();
        if let Some(content_type) = object.content_type {
            opts.attributes
                .insert(Attribute::ContentType, content_type.into());
        }
        for (key, value) in object.metadata {
            opts.attributes.insert(Attribute::Metadata(key.into()), value.into());
        }

        let size = object.bytes.len();
        self.store
            .put_opts(&location, PutPayload::from(object.bytes), opts)
            .await
            .map_err(|err| from_object_store(&self.name, err))?;

        tracing::trace!(
            target: TRACING_TARGET,
            bucket = %self.name,
            path = %object.path,
            size,
            "object uploaded"
        );
        Ok(())
    }
}
