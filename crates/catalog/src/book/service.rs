//! Book service.

use std::sync::Arc;

use common::DocumentId;
use document_store::{Collection, DocumentStore, Filter, Pipeline, to_body};
use serde_json::{Map, Value};

use super::{BookInput, BookView, HAS_AUDIOBOOK_FIELD, joined_books};
use crate::audiobook::{BOOK_ID_FIELD, LinkLocks};
use crate::error::{CatalogError, Entity, parse_id};

/// Service for managing books and reading them joined with their audiobooks.
pub struct BookService<S: DocumentStore> {
    store: S,
    locks: Arc<LinkLocks>,
}

impl<S: DocumentStore> BookService<S> {
    pub fn new(store: S, locks: Arc<LinkLocks>) -> Self {
        Self { store, locks }
    }

    /// Lists every book with its `audiobooks` array attached.
    #[tracing::instrument(skip(self))]
    pub async fn list_with_audiobooks(&self) -> Result<Vec<BookView>, CatalogError> {
        self.joined(joined_books()).await
    }

    /// Returns the joined view of one book as a single-element list.
    #[tracing::instrument(skip(self))]
    pub async fn get_with_audiobooks(&self, raw_id: &str) -> Result<Vec<BookView>, CatalogError> {
        let id = parse_id(Entity::Book, raw_id)?;
        let views = self.joined(joined_books().match_id(id)).await?;
        if views.is_empty() {
            return Err(CatalogError::not_found(Entity::Book, id));
        }
        Ok(views)
    }

    /// Creates a book with no linked audiobooks.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: BookInput) -> Result<DocumentId, CatalogError> {
        let fields = input.validate()?;
        let mut body = to_body(&fields)?;
        body.insert(HAS_AUDIOBOOK_FIELD.to_string(), Value::Bool(false));

        let id = self.store.insert_one(Collection::Books, body).await?;
        metrics::counter!("catalog_documents_created_total", "collection" => Collection::Books.name())
            .increment(1);
        tracing::info!(book_id = %id, "book created");
        Ok(id)
    }

    /// Overwrites the client-editable fields. `hasAudiobook` is left alone.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, raw_id: &str, input: BookInput) -> Result<(), CatalogError> {
        let id = parse_id(Entity::Book, raw_id)?;
        let fields = input.validate()?;

        if !self
            .store
            .update_one(Collection::Books, id, to_body(&fields)?)
            .await?
        {
            return Err(CatalogError::not_found(Entity::Book, id));
        }
        tracing::info!(book_id = %id, "book updated");
        Ok(())
    }

    /// Deletes a book and clears `bookId` on the audiobooks that referenced it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), CatalogError> {
        let id = parse_id(Entity::Book, raw_id)?;

        let _guard = self.locks.acquire([id]).await;
        if !self.store.delete_one(Collection::Books, id).await? {
            return Err(CatalogError::not_found(Entity::Book, id));
        }

        let mut unlink = Map::new();
        unlink.insert(BOOK_ID_FIELD.to_string(), Value::Null);
        let unlinked = self
            .store
            .update_many(
                Collection::AudioBooks,
                Filter::new().eq_id(BOOK_ID_FIELD, id),
                unlink,
            )
            .await
            .map_err(|source| {
                metrics::counter!("catalog_link_sync_failures_total").increment(1);
                tracing::error!(book_id = %id, error = %source, "failed to unlink audiobooks of deleted book");
                CatalogError::LinkSync { book_id: id, source }
            })?;

        tracing::info!(book_id = %id, unlinked, "book deleted");
        Ok(())
    }

    async fn joined(&self, pipeline: Pipeline) -> Result<Vec<BookView>, CatalogError> {
        self.store
            .aggregate(Collection::Books, pipeline)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(CatalogError::from))
            .collect()
    }
}
