//! Google Cloud Storage bucket provider.

use std::fmt;
use std::sync::Arc;

use ferry_core::credentials::CloudCredentials;
use ferry_core::store::{BlobStore, BucketProvider};
use ferry_core::{Error, Result};
use object_store::gcp::GoogleCloudStorageBuilder;
use serde::Serialize;

use crate::TRACING_TARGET;
use crate::bucket::ObjectBucket;

/// Service-account key in the JSON layout the GCS builder reads.
#[derive(Clone, Serialize)]
pub struct ServiceAccountKey {
    private_key: String,
    private_key_id: String,
    client_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    gcs_base_url: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    disable_oauth: bool,
}

impl ServiceAccountKey {
    /// Builds the key of the account `credentials` belong to.
    pub fn from_credentials(credentials: &CloudCredentials) -> Self {
        Self {
            private_key: credentials.private_key.clone(),
            private_key_id: credentials.private_key_id.clone().unwrap_or_default(),
            client_email: credentials.client_email.clone(),
            gcs_base_url: None,
            disable_oauth: false,
        }
    }

    /// Points requests at another endpoint, such as a local emulator,
    /// which accepts unsigned requests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.gcs_base_url = Some(base_url.into());
        self.disable_oauth = true;
        self
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::internal("cannot encode service-account key").with_source(e))
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("gcs_base_url", &self.gcs_base_url)
            .finish_non_exhaustive()
    }
}

/// Opens the buckets of one project with its service-account key.
#[derive(Clone)]
pub struct GcsBuckets {
    project_id: String,
    key_json: Arc<str>,
}

impl fmt::Debug for GcsBuckets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsBuckets")
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl GcsBuckets {
    /// Creates a provider for the project `credentials` belong to.
    pub fn new(credentials: &CloudCredentials) -> Result<Self> {
        Self::with_key(
            &credentials.project_id,
            ServiceAccountKey::from_credentials(credentials),
        )
    }

    /// Creates a provider from an explicit key.
    pub fn with_key(project_id: &str, key: ServiceAccountKey) -> Result<Self> {
        Ok(Self {
            project_id: project_id.to_owned(),
            key_json: key.to_json()?.into(),
        })
    }

    /// Returns the project id.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[async_trait::async_trait]
impl BucketProvider for GcsBuckets {
    async fn open(&self, bucket: &str) -> Result<Arc<dyn BlobStore>> {
        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(bucket)
            .with_service_account_key(self.key_json.as_ref())
            .build()
            .map_err(|e| {
                Error::config(format!("{bucket}: cannot open bucket: {e}")).with_source(e)
            })?;

        tracing::debug!(
            target: TRACING_TARGET,
            project_id = %self.project_id,
            bucket,
            "bucket handle opened"
        );

        Ok(Arc::new(ObjectBucket::new(bucket, store)))
    }
}
