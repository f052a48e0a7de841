use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::document::ID_FIELD;
use crate::{
    Collection, Document, DocumentId, Filter, Pipeline, Result, StoreError, store::DocumentStore,
};

/// Store operations, used to inject failures in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    InsertOne,
    Find,
    FindOne,
    ReplaceOne,
    UpdateOne,
    UpdateMany,
    DeleteOne,
    CountDocuments,
    Aggregate,
}

/// In-memory document store implementation.
///
/// Provides the same interface as the PostgreSQL implementation and keeps
/// documents in insertion order. It also counts the operations it receives
/// and can be told to fail specific operations, which lets tests observe
/// what a caller did (or did not do) against the store.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
    operations: Arc<AtomicU64>,
    failing: Arc<RwLock<HashSet<Operation>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many operations have been issued against the store.
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::SeqCst)
    }

    /// Returns the number of documents in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    /// Makes every subsequent call of `operation` fail.
    pub async fn fail_operation(&self, operation: Operation) {
        self.failing.write().await.insert(operation);
    }

    /// Clears all injected failures.
    pub async fn heal(&self) {
        self.failing.write().await.clear();
    }

    async fn begin(&self, operation: Operation) -> Result<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.failing.read().await.contains(&operation) {
            tracing::warn!(?operation, "failing store operation on request");
            return Err(StoreError::Unavailable(format!(
                "injected failure for {operation:?}"
            )));
        }
        Ok(())
    }
}

fn apply_set(doc: &mut Document, set: &Map<String, Value>) {
    for (field, value) in set {
        if field != ID_FIELD {
            doc.body.insert(field.clone(), value.clone());
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert_one(
        &self,
        collection: Collection,
        body: Map<String, Value>,
    ) -> Result<DocumentId> {
        self.begin(Operation::InsertOne).await?;
        let id = DocumentId::new();
        let mut store = self.collections.write().await;
        store
            .entry(collection)
            .or_default()
            .push(Document::new(id, body));
        Ok(id)
    }

    async fn find(&self, collection: Collection, filter: Filter) -> Result<Vec<Document>> {
        self.begin(Operation::Find).await?;
        let store = self.collections.read().await;
        Ok(store
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(&self, collection: Collection, id: DocumentId) -> Result<Option<Document>> {
        self.begin(Operation::FindOne).await?;
        let store = self.collections.read().await;
        Ok(store
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn replace_one(
        &self,
        collection: Collection,
        id: DocumentId,
        body: Map<String, Value>,
    ) -> Result<bool> {
        self.begin(Operation::ReplaceOne).await?;
        let mut store = self.collections.write().await;
        let Some(doc) = store
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        else {
            return Ok(false);
        };
        *doc = Document::new(id, body);
        Ok(true)
    }

    async fn update_one(
        &self,
        collection: Collection,
        id: DocumentId,
        set: Map<String, Value>,
    ) -> Result<bool> {
        self.begin(Operation::UpdateOne).await?;
        let mut store = self.collections.write().await;
        let Some(doc) = store
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        else {
            return Ok(false);
        };
        apply_set(doc, &set);
        Ok(true)
    }

    async fn update_many(
        &self,
        collection: Collection,
        filter: Filter,
        set: Map<String, Value>,
    ) -> Result<u64> {
        self.begin(Operation::UpdateMany).await?;
        let mut store = self.collections.write().await;
        let mut updated = 0;
        if let Some(docs) = store.get_mut(&collection) {
            for doc in docs.iter_mut().filter(|d| filter.matches(d)) {
                apply_set(doc, &set);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_one(&self, collection: Collection, id: DocumentId) -> Result<bool> {
        self.begin(Operation::DeleteOne).await?;
        let mut store = self.collections.write().await;
        let Some(docs) = store.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() < before)
    }

    async fn count_documents(&self, collection: Collection, filter: Filter) -> Result<u64> {
        self.begin(Operation::CountDocuments).await?;
        let store = self.collections.read().await;
        Ok(store
            .get(&collection)
            .map_or(0, |docs| docs.iter().filter(|d| filter.matches(d)).count()) as u64)
    }

    async fn aggregate(&self, collection: Collection, pipeline: Pipeline) -> Result<Vec<Value>> {
        self.begin(Operation::Aggregate).await?;
        let store = self.collections.read().await;
        let empty = Vec::new();
        let locals = store.get(&collection).unwrap_or(&empty);

        let rows = locals
            .iter()
            .filter(|d| pipeline.match_id.is_none_or(|id| d.id == id))
            .map(|local| {
                let joined = match &pipeline.lookup {
                    Some(lookup) => {
                        let key = Filter::new().eq_id(lookup.foreign_field.clone(), local.id);
                        store
                            .get(&lookup.from)
                            .map(|docs| {
                                docs.iter()
                                    .filter(|d| key.matches(d))
                                    .map(Document::to_value)
                                    .collect()
                            })
                            .unwrap_or_default()
                    }
                    None => Vec::new(),
                };
                pipeline.shape(local, joined)
            })
            .collect();

        Ok(rows)
    }
}
