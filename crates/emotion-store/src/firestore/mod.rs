//! Firestore REST client implementing [`DocumentStore`].

pub mod value;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::{Credentials, Document, DocumentStore, StoreError};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

/// Firestore client for a single project's `(default)` database.
pub struct FirestoreClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct QueryItem {
    document: Option<WireDocument>,
}

impl FirestoreClient {
    /// Create a client for `base_url` (no trailing slash needed).
    pub fn new(base_url: &str, credentials: &Credentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: credentials.project_id.clone(),
            access_token: credentials.access_token.clone(),
        }
    }

    /// `{base}/projects/{project}/databases/(default)/documents`
    fn documents_root(&self) -> Result<Url, StoreError> {
        let raw = format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        );
        Url::parse(&raw).map_err(|e| StoreError::Other(format!("bad URL {raw}: {e}")))
    }

    /// Append `segments` to the documents root, each encoded as exactly one
    /// path segment.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, StoreError> {
        let segments: Vec<&str> = segments.into_iter().collect();
        if let Some(bad) = segments.iter().find(|s| !is_valid_segment(s)) {
            return Err(StoreError::InvalidPath(bad.to_string()));
        }
        let mut url = self.documents_root()?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Other(format!("{} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn collection_url(&self, collection: &str) -> Result<Url, StoreError> {
        self.url(path_segments(collection))
    }

    fn document_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        self.url(path_segments(collection).chain([id]))
    }

    /// `{root}:runQuery` or `{root}/{parent}:runQuery`.
    fn run_query_url(&self, parent: Option<&str>) -> Result<Url, StoreError> {
        let mut url = match parent {
            Some(parent) => self.url(path_segments(parent))?,
            None => self.documents_root()?,
        };
        let path = format!("{}:runQuery", url.path());
        url.set_path(&path);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        target: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(target.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url(collection)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            debug!(collection, page = documents.len(), "listing documents");
            let resp = match self.send(self.request(Method::GET, url), collection).await {
                Ok(resp) => resp,
                // An empty or never-written collection lists as nothing.
                Err(StoreError::NotFound(_)) => break,
                Err(e) => return Err(e),
            };
            let page: ListResponse = resp.json().await?;
            for doc in page.documents {
                documents.push(into_document(doc)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(collection, count = documents.len(), "listed documents");
        Ok(documents)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let (parent, collection_id) = split_collection(collection);
        let url = self.run_query_url(parent)?;

        let body = run_query_body(collection_id, field, value);
        let resp = self
            .send(self.request(Method::POST, url).json(&body), collection)
            .await?;
        let items: Vec<QueryItem> = resp.json().await?;

        let documents = items
            .into_iter()
            .filter_map(|item| item.document)
            .map(into_document)
            .collect::<Result<Vec<_>, _>>()?;
        info!(collection, field, count = documents.len(), "queried documents");
        Ok(documents)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let target = format!("{collection}/{id}");
        let mut url = self.document_url(collection, id)?;
        {
            let mut query = url.query_pairs_mut();
            for key in fields.keys() {
                query.append_pair("updateMask.fieldPaths", key);
            }
            // Update, never create.
            query.append_pair("currentDocument.exists", "true");
        }

        let body = json!({ "fields": value::encode_fields(fields) });
        self.send(self.request(Method::PATCH, url).json(&body), &target)
            .await?;
        info!(document = %target, fields = fields.len(), "updated document");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let target = format!("{collection}/{id}");
        let url = self.document_url(collection, id)?;
        match self.send(self.request(Method::DELETE, url), &target).await {
            Ok(_) | Err(StoreError::NotFound(_)) => {
                debug!(document = %target, "deleted document");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Firestore ids cannot be empty, `.`, `..`, or contain `/`.
fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('/')
}

/// `users/u1/history` → (`Some("users/u1")`, `"history"`); `history` → (`None`, `"history"`).
fn split_collection(collection: &str) -> (Option<&str>, &str) {
    match collection.trim_matches('/').rsplit_once('/') {
        Some((parent, id)) => (Some(parent), id),
        None => (None, collection.trim_matches('/')),
    }
}

/// Structured query: all documents in `collection_id` where `field == value`.
fn run_query_body(collection_id: &str, field: &str, value: &Value) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection_id }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": value::encode(value),
                }
            }
        }
    })
}

fn into_document(wire: WireDocument) -> Result<Document, StoreError> {
    let id = document_id(&wire.name).to_string();
    let fields = value::decode_fields(&wire.fields)?;
    Ok(Document { id, fields })
}

/// Last path segment of a full document resource name.
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
