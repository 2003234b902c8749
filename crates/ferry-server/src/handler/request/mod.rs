//! Request types.

mod credentials;
mod migrations;

pub use credentials::CredentialSelector;
pub use migrations::{
    BlobMigrationRequest, ConnectionRequest, DocumentMigrationRequest, SourceRequest,
};
