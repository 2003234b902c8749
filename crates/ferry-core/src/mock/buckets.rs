use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::error::{Error, Result};
use crate::store::{BlobStore, BucketProvider};
use crate::types::BlobObject;

/// A single bucket kept in memory, objects ordered by path.
#[derive(Debug)]
pub struct MemoryBucket {
    name: String,
    objects: Mutex<BTreeMap<String, BlobObject>>,
    failing_objects: Mutex<HashSet<String>>,
    failing: AtomicBool,
}

impl MemoryBucket {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            objects: Mutex::default(),
            failing_objects: Mutex::default(),
            failing: AtomicBool::new(false),
        }
    }

    /// Stores an object without going through [`BlobStore::upload`].
    pub fn put(&self, object: BlobObject) {
        lock(&self.objects).insert(object.path.clone(), object);
    }

    /// Returns a stored object.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<BlobObject> {
        lock(&self.objects).get(path).cloned()
    }

    /// Returns every stored path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    /// Makes downloads and uploads of `path` fail.
    pub fn fail_object(&self, path: &str) {
        lock(&self.failing_objects).insert(path.to_owned());
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Error::store(self.name.clone(), "bucket unavailable"));
        }
        Ok(())
    }

    fn check_object(&self, path: &str) -> Result<()> {
        self.check()?;
        if lock(&self.failing_objects).contains(path) {
            return Err(Error::store(self.name.clone(), format!("`{path}` unavailable")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBucket {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> Result<()> {
        self.check()
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.check()?;
        Ok(lock(&self.objects)
            .keys()
            .filter(|path| path.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn list_folders(&self) -> Result<Vec<String>> {
        self.check()?;
        let folders: BTreeSet<String> = lock(&self.objects)
            .keys()
            .filter_map(|path| path.split_once('/'))
            .map(|(folder, _)| format!("{folder}/"))
            .collect();
        Ok(folders.into_iter().collect())
    }

    async fn download(&self, path: &str) -> Result<BlobObject> {
        self.check_object(path)?;
        self.get(path)
            .ok_or_else(|| Error::store(self.name.clone(), format!("`{path}` not found")))
    }

    async fn upload(&self, object: BlobObject) -> Result<()> {
        self.check_object(&object.path)?;
        self.put(object);
        Ok(())
    }
}

/// The buckets of one in-memory project.
#[derive(Debug, Default)]
pub struct MemoryBuckets {
    buckets: Mutex<HashMap<String, Arc<MemoryBucket>>>,
    probed: Mutex<Vec<String>>,
}

impl MemoryBuckets {
    /// Creates a project without buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty bucket, or returns the existing one.
    pub fn create(&self, name: &str) -> Arc<MemoryBucket> {
        Arc::clone(
            lock(&self.buckets)
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(MemoryBucket::new(name))),
        )
    }

    /// Returns an existing bucket.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Option<Arc<MemoryBucket>> {
        lock(&self.buckets).get(name).cloned()
    }

    /// Makes every call on bucket `name` fail.
    pub fn fail_bucket(&self, name: &str) {
        self.create(name).failing.store(true, Ordering::Relaxed);
    }

    /// Returns every bucket name passed to [`BucketProvider::open`], in order.
    #[must_use]
    pub fn probed(&self) -> Vec<String> {
        lock(&self.probed).clone()
    }
}

#[async_trait::async_trait]
impl BucketProvider for MemoryBuckets {
    async fn open(&self, bucket: &str) -> Result<Arc<dyn BlobStore>> {
        lock(&self.probed).push(bucket.to_owned());
        match self.bucket(bucket) {
            Some(found) => Ok(found as Arc<dyn BlobStore>),
            None => Err(Error::store(bucket.to_owned(), "bucket does not exist")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn folders_are_top_level_prefixes() -> anyhow::Result<()> {
        let buckets = MemoryBuckets::new();
        let bucket = buckets.create("b");
        bucket.put(BlobObject::new("avatars/u1.png", vec![1]));
        bucket.put(BlobObject::new("avatars/2024/u2.png", vec![2]));
        bucket.put(BlobObject::new("docs/a.pdf", vec![3]));
        bucket.put(BlobObject::new("root.txt", vec![4]));

        assert_eq!(
            bucket.list_folders().await?,
            vec!["avatars/".to_owned(), "docs/".to_owned()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_bucket_cannot_be_opened() {
        let buckets = MemoryBuckets::new();
        assert!(buckets.open("nope").await.is_err());
        assert_eq!(buckets.probed(), vec!["nope".to_owned()]);
    }
}
