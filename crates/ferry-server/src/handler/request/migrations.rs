//! Migration request types.

use schemars::JsonSchema;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::CredentialSelector;

/// Request naming only the source project.
#[must_use]
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SourceRequest {
    /// Source project credentials.
    #[serde(default)]
    pub source: CredentialSelector,
}

/// Request naming both projects.
#[must_use]
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    /// Source project credentials.
    #[serde(default)]
    pub source: CredentialSelector,
    /// Target project credentials.
    #[serde(default)]
    pub target: CredentialSelector,
}

/// Copies one collection, or every collection when none is named.
#[must_use]
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMigrationRequest {
    /// Source project credentials.
    #[serde(default)]
    pub source: CredentialSelector,
    /// Target project credentials.
    #[serde(default)]
    pub target: CredentialSelector,
    /// Top-level collection to copy.
    #[validate(
        length(min = 1, max = 1500),
        custom(function = "validate_collection_name")
    )]
    pub collection_name: Option<String>,
}

/// Copies blobs under folder prefixes, or the whole bucket.
#[must_use]
#[derive(Debug, Clone, Default, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlobMigrationRequest {
    /// Source project credentials.
    #[serde(default)]
    pub source: CredentialSelector,
    /// Target project credentials.
    #[serde(default)]
    pub target: CredentialSelector,
    /// Path prefixes to copy, matched against the raw object path.
    #[validate(length(max = 1000))]
    pub folders: Option<Vec<String>>,
    /// Copy every object, ignoring `folders`.
    #[serde(default, alias = "migrateAllBlobs")]
    pub migrate_all: bool,
}

fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message("collection name must not be blank".into()));
    }
    if name.contains('/') {
        return Err(ValidationError::new("nested")
            .with_message("only top-level collections can be migrated".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn selectors_default_to_environment() -> anyhow::Result<()> {
        let request: DocumentMigrationRequest =
            serde_json::from_value(json!({ "collectionName": "produtos" }))?;
        assert!(matches!(request.source, CredentialSelector::Environment));
        assert!(matches!(request.target, CredentialSelector::Environment));
        assert!(request.validate().is_ok());
        Ok(())
    }

    #[test]
    fn collection_name_rules() {
        let named = |name: &str| DocumentMigrationRequest {
            collection_name: Some(name.to_owned()),
            ..Default::default()
        };

        assert!(named("usuarios").validate().is_ok());
        assert!(named("").validate().is_err());
        assert!(named("   ").validate().is_err());
        assert!(named("usuarios/u1/pedidos").validate().is_err());
        assert!(DocumentMigrationRequest::default().validate().is_ok());
    }

    #[test]
    fn blob_request_defaults() -> anyhow::Result<()> {
        let request: BlobMigrationRequest = serde_json::from_value(json!({
            "source": { "kind": "environment" },
            "target": { "kind": "environment" },
            "folders": ["avatars/"]
        }))?;
        assert!(!request.migrate_all);
        assert_eq!(request.folders.as_deref(), Some(&["avatars/".to_owned()][..]));
        Ok(())
    }

    #[test]
    fn migrate_all_blobs_is_accepted() -> anyhow::Result<()> {
        let request: BlobMigrationRequest =
            serde_json::from_value(json!({ "migrateAllBlobs": true }))?;
        assert!(request.migrate_all);
        assert!(request.folders.is_none());
        Ok(())
    }
}
