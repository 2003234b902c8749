//! Convenient re-exports for common use.

pub use crate::bucket::{BucketLocator, BucketNaming, LocatedBucket};
pub use crate::connection::{ProjectConnection, ProjectConnector, ProjectRole};
pub use crate::credentials::{CloudCredentials, CredentialSource};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::migrate::{BlobSelection, CollectionOutcome, MigrationOptions};
pub use crate::report::MigrationReport;
pub use crate::store::{BlobStore, BucketProvider, DocumentStore};
pub use crate::types::{BlobObject, Document, Fields, Value};
