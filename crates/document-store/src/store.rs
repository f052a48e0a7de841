use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{Collection, Document, DocumentId, Filter, Pipeline, Result};

/// Core trait for document store implementations.
///
/// Every call is a discrete, non-transactional unit. Implementations must be
/// thread-safe (Send + Sync) and must return documents in insertion order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document body and returns its generated identity.
    async fn insert_one(&self, collection: Collection, body: Map<String, Value>)
    -> Result<DocumentId>;

    /// Returns every document matching the filter.
    async fn find(&self, collection: Collection, filter: Filter) -> Result<Vec<Document>>;

    /// Returns the document with the given identity.
    async fn find_one(&self, collection: Collection, id: DocumentId) -> Result<Option<Document>>;

    /// Replaces the body of a document, keeping its identity.
    ///
    /// Returns false if no document matched.
    async fn replace_one(
        &self,
        collection: Collection,
        id: DocumentId,
        body: Map<String, Value>,
    ) -> Result<bool>;

    /// Sets the given fields on a document, leaving other fields untouched.
    ///
    /// Returns false if no document matched.
    async fn update_one(
        &self,
        collection: Collection,
        id: DocumentId,
        set: Map<String, Value>,
    ) -> Result<bool>;

    /// Sets the given fields on every matching document.
    ///
    /// Returns the number of documents updated.
    async fn update_many(
        &self,
        collection: Collection,
        filter: Filter,
        set: Map<String, Value>,
    ) -> Result<u64>;

    /// Deletes a document. Returns false if no document matched.
    async fn delete_one(&self, collection: Collection, id: DocumentId) -> Result<bool>;

    /// Counts the documents matching the filter.
    async fn count_documents(&self, collection: Collection, filter: Filter) -> Result<u64>;

    /// Runs an aggregation pipeline, returning shaped JSON rows.
    async fn aggregate(&self, collection: Collection, pipeline: Pipeline) -> Result<Vec<Value>>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Checks whether a document exists.
    async fn exists(&self, collection: Collection, id: DocumentId) -> Result<bool> {
        Ok(self.find_one(collection, id).await?.is_some())
    }

    /// Sets a single field on a document.
    async fn set_field(
        &self,
        collection: Collection,
        id: DocumentId,
        field: &str,
        value: Value,
    ) -> Result<bool> {
        let mut set = Map::new();
        set.insert(field.to_string(), value);
        self.update_one(collection, id, set).await
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
