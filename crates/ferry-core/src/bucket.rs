//! Bucket location by ordered name probing.
//!
//! Projects provisioned at different times name their default bucket
//! differently. [`BucketLocator`] asks each [`BucketNaming`] strategy for
//! candidate names, in order, and accepts the first candidate whose probe
//! succeeds. Later candidates are never probed.

use std::fmt;
use std::sync::Arc;

use crate::TRACING_TARGET_BUCKET;
use crate::store::{BlobStore, BucketProvider};

/// Strategy producing candidate bucket names for a project.
pub trait BucketNaming: Send + Sync {
    /// Returns candidate names, most preferred first.
    fn candidate_names(&self, project_id: &str) -> Vec<String>;
}

/// `{projectId}.appspot.com`, the legacy default bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppspotNaming;

impl BucketNaming for AppspotNaming {
    fn candidate_names(&self, project_id: &str) -> Vec<String> {
        vec![format!("{project_id}.appspot.com")]
    }
}

/// `{projectId}.firebasestorage.app`, the current default bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirebaseStorageNaming;

impl BucketNaming for FirebaseStorageNaming {
    fn candidate_names(&self, project_id: &str) -> Vec<String> {
        vec![format!("{project_id}.firebasestorage.app")]
    }
}

/// The bare project id.
#[derive(Debug, Clone, Copy, Default)]
pub struct BareProjectNaming;

impl BucketNaming for BareProjectNaming {
    fn candidate_names(&self, project_id: &str) -> Vec<String> {
        vec![project_id.to_owned()]
    }
}

/// A bucket that answered its probe.
#[derive(Clone)]
pub struct LocatedBucket {
    /// Bucket name.
    pub name: String,
    /// Handle to the bucket.
    pub store: Arc<dyn BlobStore>,
}

impl fmt::Debug for LocatedBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatedBucket")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Probes candidate bucket names in a fixed priority order.
pub struct BucketLocator {
    strategies: Vec<Box<dyn BucketNaming>>,
}

impl BucketLocator {
    /// Creates a locator with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy after the existing ones.
    pub fn with_strategy(mut self, strategy: impl BucketNaming + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Returns every candidate name for `project_id`, in probe order.
    #[must_use]
    pub fn candidates(&self, project_id: &str) -> Vec<String> {
        self.strategies
            .iter()
            .flat_map(|strategy| strategy.candidate_names(project_id))
            .collect()
    }

    /// Returns the first candidate bucket that can be opened and probed.
    ///
    /// Returns `None` when every candidate fails; that is a soft outcome and
    /// the caller decides what it means.
    pub async fn locate(
        &self,
        provider: &dyn BucketProvider,
        project_id: &str,
    ) -> Option<LocatedBucket> {
        for name in self.candidates(project_id) {
            let probed = match provider.open(&name).await {
                Ok(store) => store.probe().await.map(|()| store),
                Err(err) => Err(err),
            };

            match probed {
                Ok(store) => {
                    tracing::info!(
                        target: TRACING_TARGET_BUCKET,
                        project_id,
                        bucket = %name,
                        "bucket located"
                    );
                    return Some(LocatedBucket { name, store });
                }
                Err(err) => {
                    tracing::debug!(
                        target: TRACING_TARGET_BUCKET,
                        project_id,
                        bucket = %name,
                        error = %err,
                        "bucket candidate rejected"
                    );
                }
            }
        }

        tracing::warn!(
            target: TRACING_TARGET_BUCKET,
            project_id,
            "no bucket found under any naming convention"
        );
        None
    }
}

impl Default for BucketLocator {
    /// `{id}.appspot.com`, then `{id}.firebasestorage.app`, then `{id}`.
    fn default() -> Self {
        Self::empty()
            .with_strategy(AppspotNaming)
            .with_strategy(FirebaseStorageNaming)
            .with_strategy(BareProjectNaming)
    }
}

impl fmt::Debug for BucketLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketLocator")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}
