//! Document and blob migration handlers.
//!
//! Every handler opens fresh connections to the projects its request names
//! and releases them before the response is sent.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use ferry_core::report::MigrationReport;

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::{
    BlobMigrationRequest, ConnectionRequest, DocumentMigrationRequest, SourceRequest,
};
use crate::handler::response::{Collections, ConnectionCheck, ErrorResponse, Folders};
use crate::service::{MigrationService, ServiceState};

/// Tracing target for migration operations.
const TRACING_TARGET: &str = "ferry_server::handler::migrations";

/// Connects to both projects without migrating anything.
#[tracing::instrument(skip_all, fields(source = ?request.source.project_id()))]
async fn verify_connections(
    State(migrations): State<MigrationService>,
    ValidateJson(request): ValidateJson<ConnectionRequest>,
) -> Result<(StatusCode, Json<ConnectionCheck>)> {
    tracing::debug!(target: TRACING_TARGET, "Verifying project connections");

    let (source, target) = migrations
        .verify(&request.source.into(), &request.target.into())
        .await?;

    let check = ConnectionCheck {
        source: source.into(),
        target: target.into(),
    };

    tracing::info!(
        target: TRACING_TARGET,
        source = %check.source.project_id,
        target = %check.target.project_id,
        "Project connections verified"
    );

    Ok((StatusCode::OK, Json(check)))
}

fn verify_connections_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Verify project connections")
        .description(
            "Resolves both credential selectors, connects to both projects and \
             locates their storage buckets.",
        )
        .response::<200, Json<ConnectionCheck>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Lists the top-level collections of the source project.
#[tracing::instrument(skip_all, fields(source = ?request.source.project_id()))]
async fn list_collections(
    State(migrations): State<MigrationService>,
    ValidateJson(request): ValidateJson<SourceRequest>,
) -> Result<(StatusCode, Json<Collections>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing source collections");

    let collections = migrations.list_collections(&request.source.into()).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        count = collections.len(),
        "Source collections listed"
    );

    Ok((StatusCode::OK, Json(Collections { collections })))
}

fn list_collections_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List source collections")
        .description("Returns the top-level collection names of the source project, sorted.")
        .response::<200, Json<Collections>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Copies one collection, or every collection, to the target project.
#[tracing::instrument(
    skip_all,
    fields(
        source = ?request.source.project_id(),
        target = ?request.target.project_id(),
        collection = ?request.collection_name,
    )
)]
async fn migrate_documents(
    State(migrations): State<MigrationService>,
    ValidateJson(request): ValidateJson<DocumentMigrationRequest>,
) -> Result<(StatusCode, Json<MigrationReport>)> {
    tracing::info!(target: TRACING_TARGET, "Document migration requested");

    let report = migrations
        .migrate_documents(
            &request.source.into(),
            &request.target.into(),
            request.collection_name.as_deref(),
        )
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        total = report.total_items,
        migrated = report.migrated_count,
        errors = report.error_count,
        "Document migration finished"
    );

    Ok((StatusCode::OK, Json(report)))
}

fn migrate_documents_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Migrate documents")
        .description(
            "Copies the named collection, or every collection when `collectionName` is \
             omitted, in batched commits. Password fields of the credential collection \
             are replaced with salted hashes. Per-document failures are listed in the \
             report and do not fail the request.",
        )
        .response::<200, Json<MigrationReport>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Lists the top-level folders of the source bucket.
#[tracing::instrument(skip_all, fields(source = ?request.source.project_id()))]
async fn list_folders(
    State(migrations): State<MigrationService>,
    ValidateJson(request): ValidateJson<SourceRequest>,
) -> Result<(StatusCode, Json<Folders>)> {
    tracing::debug!(target: TRACING_TARGET, "Listing source folders");

    let listing = migrations.list_folders(&request.source.into()).await?;

    tracing::debug!(
        target: TRACING_TARGET,
        bucket = ?listing.bucket,
        count = listing.folders.len(),
        "Source folders listed"
    );

    let folders = Folders {
        bucket: listing.bucket,
        folders: listing.folders,
    };
    Ok((StatusCode::OK, Json(folders)))
}

fn list_folders_docs(op: TransformOperation) -> TransformOperation {
    op.summary("List source folders")
        .description(
            "Returns the top-level folder prefixes of the source bucket. The list is \
             empty and `bucket` is absent when no bucket was located.",
        )
        .response::<200, Json<Folders>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Copies blobs from the source bucket to the target bucket.
#[tracing::instrument(
    skip_all,
    fields(
        source = ?request.source.project_id(),
        target = ?request.target.project_id(),
        migrate_all = request.migrate_all,
    )
)]
async fn migrate_blobs(
    State(migrations): State<MigrationService>,
    ValidateJson(request): ValidateJson<BlobMigrationRequest>,
) -> Result<(StatusCode, Json<MigrationReport>)> {
    tracing::info!(target: TRACING_TARGET, "Blob migration requested");

    let report = migrations
        .migrate_blobs(
            &request.source.into(),
            &request.target.into(),
            request.migrate_all,
            request.folders,
        )
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        total = report.total_items,
        migrated = report.migrated_count,
        errors = report.error_count,
        "Blob migration finished"
    );

    Ok((StatusCode::OK, Json(report)))
}

fn migrate_blobs_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Migrate blobs")
        .description(
            "Copies every object whose path starts with one of `folders`, or the whole \
             bucket when `migrateAll` is set, keeping paths, content types and metadata.",
        )
        .response::<200, Json<MigrationReport>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<404, Json<ErrorResponse>>()
        .response::<500, Json<ErrorResponse>>()
}

/// Returns routes for migrations.
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route(
            "/migrations/verify",
            post_with(verify_connections, verify_connections_docs),
        )
        .api_route(
            "/migrations/collections",
            post_with(list_collections, list_collections_docs),
        )
        .api_route(
            "/migrations/documents",
            post_with(migrate_documents, migrate_documents_docs),
        )
        .api_route(
            "/migrations/folders",
            post_with(list_folders, list_folders_docs),
        )
        .api_route(
            "/migrations/blobs",
            post_with(migrate_blobs, migrate_blobs_docs),
        )
        .with_path_items(|item| item.tag("Migrations"))
}

#[cfg(test)]
mod tests {
    use ferry_core::types::{BlobObject, Document};
    use serde_json::json;

    use std::sync::Arc;

    use ferry_core::mock::MemoryConnector;

    use crate::handler::routes;
    use crate::handler::test::{
        SOURCE_PROJECT, TARGET_PROJECT, TEST_KEY, create_test_server_with_router,
        create_test_server_with_state, test_config,
    };
    use crate::service::{ServiceConfig, ServiceState};

    const SOURCE_BUCKET: &str = "acme-old.appspot.com";
    const TARGET_BUCKET: &str = "acme-new.firebasestorage.app";

    #[tokio::test]
    async fn verify_reports_located_buckets() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        connector.add_project(SOURCE_PROJECT).buckets.create(SOURCE_BUCKET);

        let response = server.post("/migrations/verify").json(&json!({})).await;
        response.assert_status_ok();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["source"]["projectId"], SOURCE_PROJECT);
        assert_eq!(body["source"]["bucket"], SOURCE_BUCKET);
        assert_eq!(body["target"]["projectId"], TARGET_PROJECT);
        assert!(body["target"]["bucket"].is_null());
        assert_eq!(connector.registry().active_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_project_is_server_error() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        connector.fail_connect(TARGET_PROJECT);

        let response = server.post("/migrations/verify").json(&json!({})).await;
        response.assert_status_internal_server_error();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["resource"], "connection");
        assert_eq!(connector.registry().active_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn incomplete_explicit_credentials_are_rejected() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/migrations/collections")
            .json(&json!({
                "source": {
                    "kind": "explicit",
                    "projectId": SOURCE_PROJECT,
                    "clientEmail": "ferry@acme-old.iam.gserviceaccount.com"
                }
            }))
            .await;
        response.assert_status_bad_request();

        let body = response.json::<serde_json::Value>();
        assert!(
            body["message"]
                .as_str()
                .is_some_and(|m| m.contains("privateKey") || m.contains("private_key"))
        );
        assert_eq!(connector.connect_attempts(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_environment_key_is_server_error() -> anyhow::Result<()> {
        let connector = Arc::new(MemoryConnector::new());
        connector.add_project(SOURCE_PROJECT);
        let config = ServiceConfig {
            source_private_key: Some("garbage".into()),
            ..test_config()
        };
        let state = ServiceState::with_connector(&config, connector.clone())?;
        let server = create_test_server_with_state(routes(), state)?;

        let response = server.post("/migrations/collections").json(&json!({})).await;
        response.assert_status_internal_server_error();

        let body = response.json::<serde_json::Value>();
        assert!(
            body["message"]
                .as_str()
                .is_some_and(|m| m.contains("SOURCE_PRIVATE_KEY") && !m.contains("garbage"))
        );
        assert_eq!(connector.connect_attempts(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn explicit_credentials_reach_their_project() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let other = connector.add_project("acme-staging");
        other.documents.insert("pedidos", Document::empty("o1"));

        let response = server
            .post("/migrations/collections")
            .json(&json!({
                "source": {
                    "kind": "explicit",
                    "projectId": "acme-staging",
                    "clientEmail": "ferry@acme-staging.iam.gserviceaccount.com",
                    "privateKey": TEST_KEY
                }
            }))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({ "collections": ["pedidos"] }));
        Ok(())
    }

    #[tokio::test]
    async fn collections_are_sorted() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let source = connector.add_project(SOURCE_PROJECT);
        source.documents.insert("usuarios", Document::empty("u1"));
        source.documents.insert("produtos", Document::empty("p1"));

        let response = server.post("/migrations/collections").json(&json!({})).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "collections": ["produtos", "usuarios"] }));
        Ok(())
    }

    #[tokio::test]
    async fn named_collection_is_copied() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let source = connector.add_project(SOURCE_PROJECT);
        source
            .documents
            .insert("produtos", Document::empty("p1").with_field("nome", "Mesa"));
        source
            .documents
            .insert("produtos", Document::empty("p2").with_field("preco", 120_i64));
        source.documents.insert("pedidos", Document::empty("o1"));

        let response = server
            .post("/migrations/documents")
            .json(&json!({ "collectionName": "produtos" }))
            .await;
        response.assert_status_ok();

        let report = response.json::<serde_json::Value>();
        assert_eq!(report["totalItems"], 2);
        assert_eq!(report["migratedCount"], 2);
        assert_eq!(report["errorCount"], 0);
        assert_eq!(report["batchCount"], 1);

        let target = connector.add_project(TARGET_PROJECT);
        assert_eq!(target.documents.documents("produtos").len(), 2);
        assert!(target.documents.documents("pedidos").is_empty());
        assert_eq!(connector.registry().active_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn credential_collection_is_hashed() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let source = connector.add_project(SOURCE_PROJECT);
        source.documents.insert(
            "usuarios",
            Document::empty("u1")
                .with_field("email", "ana@acme.com")
                .with_field("senha", "abc123"),
        );

        let response = server
            .post("/migrations/documents")
            .json(&json!({ "collectionName": "usuarios" }))
            .await;
        response.assert_status_ok();

        let report = response.json::<serde_json::Value>();
        assert_eq!(report["convertedCredentialCount"], 1);

        let target = connector.add_project(TARGET_PROJECT);
        let copied = target
            .documents
            .get("usuarios", "u1")
            .ok_or_else(|| anyhow::anyhow!("user was not copied"))?;
        assert!(!copied.has("senha"));
        assert!(copied.has("senhaHash"));
        assert!(copied.has("salt"));
        assert!(!response.text().contains("abc123"));
        Ok(())
    }

    #[tokio::test]
    async fn every_collection_is_copied_when_none_is_named() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let source = connector.add_project(SOURCE_PROJECT);
        source.documents.insert("produtos", Document::empty("p1"));
        source.documents.insert("pedidos", Document::empty("o1"));

        let response = server.post("/migrations/documents").json(&json!({})).await;
        response.assert_status_ok();

        let report = response.json::<serde_json::Value>();
        assert_eq!(report["totalItems"], 2);
        assert_eq!(report["collections"].as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn empty_collection_is_not_found() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/migrations/documents")
            .json(&json!({ "collectionName": "produtos" }))
            .await;
        response.assert_status_not_found();
        assert_eq!(connector.registry().active_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn collection_path_is_rejected() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/migrations/documents")
            .json(&json!({ "collectionName": "produtos/p1/itens" }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(connector.connect_attempts(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() -> anyhow::Result<()> {
        let (server, _) = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/migrations/documents")
            .content_type("application/json")
            .text("{ not json")
            .await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn folders_of_located_bucket() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let bucket = connector.add_project(SOURCE_PROJECT).buckets.create(SOURCE_BUCKET);
        bucket.put(BlobObject::new("avatars/u1.png", vec![1]));
        bucket.put(BlobObject::new("docs/a.pdf", vec![2]));

        let response = server.post("/migrations/folders").json(&json!({})).await;
        response.assert_status_ok();
        response.assert_json(&json!({
            "bucket": SOURCE_BUCKET,
            "folders": ["avatars/", "docs/"]
        }));
        Ok(())
    }

    #[tokio::test]
    async fn folders_without_bucket_are_empty() -> anyhow::Result<()> {
        let (server, _) = create_test_server_with_router(|_| routes())?;

        let response = server.post("/migrations/folders").json(&json!({})).await;
        response.assert_status_ok();

        let body = response.json::<serde_json::Value>();
        assert!(body["bucket"].is_null());
        assert_eq!(body["folders"], json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn blob_run_needs_a_selection() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;

        let response = server
            .post("/migrations/blobs")
            .json(&json!({ "folders": [] }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(connector.connect_attempts(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn selected_folders_are_copied() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let source = connector.add_project(SOURCE_PROJECT).buckets.create(SOURCE_BUCKET);
        source.put(BlobObject::new("avatars/u1.png", vec![1]).with_content_type("image/png"));
        source.put(BlobObject::new("docs/a.pdf", vec![2]));
        let target = connector.add_project(TARGET_PROJECT).buckets.create(TARGET_BUCKET);

        let response = server
            .post("/migrations/blobs")
            .json(&json!({ "folders": ["avatars/"] }))
            .await;
        response.assert_status_ok();

        let report = response.json::<serde_json::Value>();
        assert_eq!(report["totalItems"], 1);
        assert_eq!(report["migratedCount"], 1);
        assert_eq!(report["batchCount"], 0);

        assert_eq!(target.paths(), vec!["avatars/u1.png"]);
        assert_eq!(
            target
                .get("avatars/u1.png")
                .and_then(|object| object.content_type),
            Some("image/png".to_owned())
        );
        assert_eq!(connector.registry().active_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn migrate_all_blobs_copies_the_bucket() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let source = connector.add_project(SOURCE_PROJECT).buckets.create(SOURCE_BUCKET);
        source.put(BlobObject::new("avatars/u1.png", vec![1]));
        source.put(BlobObject::new("root.txt", vec![2]));
        let target = connector.add_project(TARGET_PROJECT).buckets.create(TARGET_BUCKET);

        let response = server
            .post("/migrations/blobs")
            .json(&json!({ "migrateAllBlobs": true }))
            .await;
        response.assert_status_ok();

        assert_eq!(target.paths(), vec!["avatars/u1.png", "root.txt"]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_target_bucket_is_not_found() -> anyhow::Result<()> {
        let (server, connector) = create_test_server_with_router(|_| routes())?;
        let source = connector.add_project(SOURCE_PROJECT).buckets.create(SOURCE_BUCKET);
        source.put(BlobObject::new("avatars/u1.png", vec![1]));

        let response = server
            .post("/migrations/blobs")
            .json(&json!({ "migrateAll": true }))
            .await;
        response.assert_status_not_found();
        assert_eq!(connector.registry().active_count(), 0);
        Ok(())
    }
}
