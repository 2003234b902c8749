use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use super::lock;
use crate::error::{Error, Result};
use crate::store::{DocumentStore, ListedDocument, MAX_BATCH_SIZE, UnreadableDocument};
use crate::types::Document;

/// A commit applied to a [`MemoryDocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Collection written to.
    pub collection: String,
    /// Ids written, in batch order.
    pub ids: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, BTreeMap<String, Document>>,
    commits: Vec<CommitRecord>,
    commit_attempts: usize,
    failing_commits: HashSet<usize>,
    failing_documents: HashSet<String>,
    failing_listings: HashSet<String>,
    unreadable_documents: HashSet<String>,
}

/// Document store kept in memory, documents ordered by id.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: Mutex<State>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document without recording a commit.
    pub fn insert(&self, collection: &str, document: Document) {
        lock(&self.state)
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(document.id.clone(), document);
    }

    /// Returns every document of `collection`, ordered by id.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        lock(&self.state)
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns one document.
    #[must_use]
    pub fn get(&self, collection: &str, id: &str) -> Option<Document> {
        lock(&self.state)
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Returns every applied commit, oldest first.
    #[must_use]
    pub fn commits(&self) -> Vec<CommitRecord> {
        lock(&self.state).commits.clone()
    }

    /// Makes the `nth` commit attempt fail, counting from 1.
    pub fn fail_commit(&self, nth: usize) {
        lock(&self.state).failing_commits.insert(nth);
    }

    /// Makes every commit containing `id` fail.
    pub fn fail_document(&self, id: &str) {
        lock(&self.state).failing_documents.insert(id.to_owned());
    }

    /// Makes the document `id` be listed as unreadable.
    pub fn fail_read(&self, id: &str) {
        lock(&self.state)
            .unreadable_documents
            .insert(id.to_owned());
    }

    /// Makes reading `collection` fail.
    pub fn fail_listing(&self, collection: &str) {
        lock(&self.state)
            .failing_listings
            .insert(collection.to_owned());
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(lock(&self.state).collections.keys().cloned().collect())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<ListedDocument>> {
        let state = lock(&self.state);
        if state.failing_listings.contains(collection) {
            return Err(Error::store("memory", format!("cannot read `{collection}`")));
        }

        let Some(documents) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(documents
            .values()
            .map(|doc| {
                if state.unreadable_documents.contains(&doc.id) {
                    Err(UnreadableDocument::new(
                        doc.id.clone(),
                        Error::store("memory", format!("cannot decode `{}`", doc.id)),
                    ))
                } else {
                    Ok(doc.clone())
                }
            })
            .collect())
    }

    async fn commit(&self, collection: &str, documents: Vec<Document>) -> Result<()> {
        let mut state = lock(&self.state);
        state.commit_attempts += 1;

        if documents.len() > MAX_BATCH_SIZE {
            return Err(Error::store(
                "memory",
                format!("batch of {} exceeds {MAX_BATCH_SIZE} writes", documents.len()),
            ));
        }
        if state.failing_commits.contains(&state.commit_attempts) {
            return Err(Error::store("memory", "commit rejected"));
        }
        if let Some(doc) = documents
            .iter()
            .find(|doc| state.failing_documents.contains(&doc.id))
        {
            return Err(Error::store(
                "memory",
                format!("write of `{}` rejected", doc.id),
            ));
        }

        let ids = documents.iter().map(|doc| doc.id.clone()).collect();
        let docs = state.collections.entry(collection.to_owned()).or_default();
        for document in documents {
            docs.insert(document.id.clone(), document);
        }
        state.commits.push(CommitRecord {
            collection: collection.to_owned(),
            ids,
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn commit_is_all_or_nothing() -> anyhow::Result<()> {
        let store = MemoryDocumentStore::new();
        store.fail_document("b");

        let batch = vec![Document::empty("a"), Document::empty("b")];
        assert!(store.commit("c", batch).await.is_err());
        assert!(store.documents("c").is_empty());

        store.commit("c", vec![Document::empty("a")]).await?;
        assert_eq!(store.commits().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn unreadable_documents_are_listed_in_place() -> anyhow::Result<()> {
        let store = MemoryDocumentStore::new();
        store.insert("c", Document::empty("a"));
        store.insert("c", Document::empty("b"));
        store.fail_read("a");

        let listed = store.list_documents("c").await?;
        assert_eq!(listed.len(), 2);
        assert!(matches!(&listed[0], Err(unreadable) if unreadable.id == "a"));
        assert!(matches!(&listed[1], Ok(doc) if doc.id == "b"));
        Ok(())
    }

    #[tokio::test]
    async fn commit_upserts_by_id() -> anyhow::Result<()> {
        let store = MemoryDocumentStore::new();
        store.insert("c", Document::empty("a").with_field("v", 1_i64));

        store
            .commit("c", vec![Document::empty("a").with_field("v", 2_i64)])
            .await?;
        let docs = store.documents("c");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0], Document::empty("a").with_field("v", 2_i64));
        Ok(())
    }
}
