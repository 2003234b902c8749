//! Firestore REST client.

use std::fmt;
use std::sync::Arc;

use ferry_core::credentials::CloudCredentials;
use ferry_core::store::{DocumentStore, ListedDocument, MAX_BATCH_SIZE, UnreadableDocument};
use ferry_core::types::Document;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::auth::TokenSource;
use crate::config::FirestoreConfig;
use crate::error::{Error, Result};
use crate::value::{DatabasePath, WireDocument, document_id};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListCollectionIdsRequest<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListCollectionIdsResponse {
    #[serde(default)]
    collection_ids: Vec<String>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    /// Kept raw so one undecodable document does not fail its page.
    #[serde(default)]
    documents: Vec<serde_json::Value>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommitRequest {
    writes: Vec<Write>,
}

#[derive(Debug, Serialize)]
struct Write {
    update: WireDocument,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Inner client that holds the HTTP client and configuration.
struct FirestoreClientInner {
    http: Client,
    config: FirestoreConfig,
    project_id: String,
    path: DatabasePath,
    tokens: TokenSource,
}

/// Client for the default (or a named) database of one project.
///
/// Cheap to clone; clones share the HTTP client and the token cache.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

impl fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("project_id", &self.inner.project_id)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl FirestoreClient {
    /// Creates a client for the project the credentials belong to.
    ///
    /// Parses the private key but performs no network call.
    pub fn new(config: FirestoreConfig, credentials: &CloudCredentials) -> Result<Self> {
        let timeout = config.effective_timeout();

        tracing::debug!(
            target: TRACING_TARGET,
            project_id = %credentials.project_id,
            database = %config.database,
            timeout_ms = timeout.as_millis(),
            "creating firestore client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(FirestoreConfig::user_agent())
            .build()?;
        let tokens = TokenSource::new(credentials, config.token_url.clone())?;
        let path = DatabasePath::new(&credentials.project_id, &config.database);

        let inner = FirestoreClientInner {
            http,
            project_id: credentials.project_id.clone(),
            path,
            tokens,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the project id.
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// Obtains an access token, which proves the credentials are accepted.
    pub async fn verify(&self) -> Result<()> {
        self.inner.tokens.token(&self.inner.http).await?;
        tracing::debug!(
            target: TRACING_TARGET,
            project_id = %self.inner.project_id,
            "firestore credentials verified"
        );
        Ok(())
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/{}{suffix}",
            self.inner.config.base_url,
            self.inner.path.documents_root()
        )
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let token = self.inner.tokens.token(&self.inner.http).await?;
        let response = request.bearer_auth(token).send().await?;
        decode(response).await
    }

    /// Lists the top-level collection ids, following every page.
    pub async fn collection_ids(&self) -> Result<Vec<String>> {
        let url = self.url(":listCollectionIds");
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let body = ListCollectionIdsRequest {
                page_size: self.inner.config.effective_page_size(),
                page_token: page_token.as_deref(),
            };
            let page: ListCollectionIdsResponse =
                self.send(self.inner.http.post(&url).json(&body)).await?;

            ids.extend(page.collection_ids);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(ids)
    }

    /// Reads every document of a collection, following every page.
    ///
    /// A document that cannot be decoded is listed as unreadable; the rest
    /// of the page is kept.
    pub async fn documents(&self, collection: &str) -> Result<Vec<ListedDocument>> {
        let url = self.url(&format!("/{collection}"));
        let page_size = self.inner.config.effective_page_size().to_string();
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", page_size.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: ListDocumentsResponse =
                self.send(self.inner.http.get(&url).query(&query)).await?;
            for raw in page.documents {
                let listed = decode_listed(&self.inner.path, raw);
                if let Err(unreadable) = &listed {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        project_id = %self.inner.project_id,
                        collection,
                        document_id = %unreadable.id,
                        error = %unreadable.error,
                        "document could not be decoded"
                    );
                }
                documents.push(listed);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            project_id = %self.inner.project_id,
            collection,
            documents = documents.len(),
            unreadable = documents.iter().filter(|listed| listed.is_err()).count(),
            "collection read"
        );

        Ok(documents)
    }

    /// Writes documents as one atomic commit, replacing any document with
    /// the same id.
    pub async fn commit_documents(&self, collection: &str, documents: Vec<Document>) -> Result<()> {
        if documents.len() > MAX_BATCH_SIZE {
            return Err(Error::Value(format!(
                "commit of {} writes exceeds the limit of {MAX_BATCH_SIZE}",
                documents.len()
            )));
        }

        let count = documents.len();
        let writes = documents
            .into_iter()
            .map(|doc| Write {
                update: self.inner.path.encode_document(collection, doc),
            })
            .collect();

        let url = self.url(":commit");
        let _: serde_json::Value = self
            .send(self.inner.http.post(&url).json(&CommitRequest { writes }))
            .await?;

        tracing::debug!(
            target: TRACING_TARGET,
            project_id = %self.inner.project_id,
            collection,
            writes = count,
            "commit applied"
        );

        Ok(())
    }
}

/// Decodes one raw listed document, keeping its id when it cannot be read.
fn decode_listed(path: &DatabasePath, raw: serde_json::Value) -> ListedDocument {
    let id = raw
        .get("name")
        .and_then(serde_json::Value::as_str)
        .and_then(document_id)
        .unwrap_or("<unnamed>")
        .to_owned();

    serde_json::from_value::<WireDocument>(raw)
        .map_err(Error::from)
        .and_then(|wire| path.decode_document(wire))
        .map_err(|err| UnreadableDocument::new(id, err.into()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let envelope: ErrorEnvelope = response.json().await.unwrap_or_default();
    let message = match (envelope.error.status.as_str(), envelope.error.message.as_str()) {
        ("", "") => status.to_string(),
        ("", message) => message.to_owned(),
        (code, message) => format!("{code}: {message}"),
    };

    Err(Error::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_collections(&self) -> ferry_core::Result<Vec<String>> {
        Ok(self.collection_ids().await?)
    }

    async fn list_documents(&self, collection: &str) -> ferry_core::Result<Vec<ListedDocument>> {
        Ok(self.documents(collection).await?)
    }

    async fn commit(&self, collection: &str, documents: Vec<Document>) -> ferry_core::Result<()> {
        Ok(self.commit_documents(collection, documents).await?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn commit_body_shape() -> anyhow::Result<()> {
        let path = DatabasePath::new("acme-new", "(default)");
        let body = CommitRequest {
            writes: vec![Write {
                update: path.encode_document("produtos", Document::empty("p1").with_field("n", 1_i64)),
            }],
        };

        assert_eq!(
            serde_json::to_value(&body)?,
            json!({
                "writes": [{
                    "update": {
                        "name": "projects/acme-new/databases/(default)/documents/produtos/p1",
                        "fields": { "n": { "integerValue": "1" } }
                    }
                }]
            })
        );
        Ok(())
    }

    #[test]
    fn list_request_omits_missing_token() -> anyhow::Result<()> {
        let body = ListCollectionIdsRequest {
            page_size: 300,
            page_token: None,
        };
        assert_eq!(serde_json::to_value(&body)?, json!({ "pageSize": 300 }));
        Ok(())
    }

    #[test]
    fn page_keeps_readable_documents() -> anyhow::Result<()> {
        let page: ListDocumentsResponse = serde_json::from_value(json!({
            "documents": [
                {
                    "name": "projects/acme-old/databases/(default)/documents/medicoes/m1",
                    "fields": { "ratio": { "doubleValue": "NaN" } }
                },
                {
                    "name": "projects/acme-old/databases/(default)/documents/medicoes/m2",
                    "fields": { "leitura": { "integerValue": "not-a-number" } }
                },
                {
                    "name": "projects/acme-old/databases/(default)/documents/medicoes/m3",
                    "fields": { "sensor": { "unknownValue": 1 } }
                },
                {
                    "name": "projects/acme-old/databases/(default)/documents/medicoes/m4",
                    "fields": { "leitura": { "integerValue": "7" } }
                }
            ]
        }))?;

        let path = DatabasePath::new("acme-old", "(default)");
        let listed: Vec<ListedDocument> = page
            .documents
            .into_iter()
            .map(|raw| decode_listed(&path, raw))
            .collect();

        assert!(matches!(&listed[0], Ok(doc) if doc.id == "m1"));
        assert!(matches!(&listed[1], Err(unreadable) if unreadable.id == "m2"));
        assert!(matches!(&listed[2], Err(unreadable) if unreadable.id == "m3"));
        assert!(matches!(&listed[3], Ok(doc) if doc.id == "m4"));
        Ok(())
    }

    #[test]
    fn empty_list_response_parses() -> anyhow::Result<()> {
        let page: ListDocumentsResponse = serde_json::from_value(json!({}))?;
        assert!(page.documents.is_empty());
        assert!(page.next_page_token.is_none());
        Ok(())
    }
}
