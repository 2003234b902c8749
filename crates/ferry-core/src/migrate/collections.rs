use crate::TRACING_TARGET_MIGRATE;
use crate::error::Result;
use crate::store::DocumentStore;

/// Lists the top-level collections of a project, sorted by name.
///
/// Read-only. Duplicate names reported by the store are collapsed.
pub async fn enumerate_collections(store: &dyn DocumentStore) -> Result<Vec<String>> {
    let mut collections = store.list_collections().await?;
    collections.sort();
    collections.dedup();

    tracing::debug!(
        target: TRACING_TARGET_MIGRATE,
        count = collections.len(),
        "collections enumerated"
    );

    Ok(collections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryDocumentStore;
    use crate::types::Document;

    #[tokio::test]
    async fn lists_collections_without_writing() -> anyhow::Result<()> {
        let store = MemoryDocumentStore::new();
        store.insert("usuarios", Document::empty("u1"));
        store.insert("produtos", Document::empty("p1"));

        let collections = enumerate_collections(&store).await?;
        assert_eq!(collections, vec!["produtos".to_owned(), "usuarios".to_owned()]);
        assert!(store.commits().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn empty_project_has_no_collections() -> anyhow::Result<()> {
        let store = MemoryDocumentStore::new();
        assert!(enumerate_collections(&store).await?.is_empty());
        Ok(())
    }
}
