//! The document-store seam.
//!
//! Collections are addressed by slash-separated paths: `users` for a root
//! collection, `users/{uid}/history` for a subcollection.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::StoreError;

/// A stored document: its id within the collection plus plain JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Minimal document-store operations the admin service needs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in a collection.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents in a collection whose `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// Overwrite the given fields of an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
