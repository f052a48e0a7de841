//! Audiobook service: CRUD routed through link maintenance.

use std::sync::Arc;

use common::DocumentId;
use document_store::{Collection, DocumentStore, Filter, to_body};

use super::links::{LinkLocks, LinkMaintainer};
use super::{Audiobook, AudiobookInput};
use crate::error::{CatalogError, Entity, parse_id};

/// Service for managing audiobooks.
///
/// Every write that can change a `bookId` runs under the audiobook's key and
/// the keys of the books involved, then restores the `hasAudiobook` flag of
/// those books before returning.
pub struct AudiobookService<S: DocumentStore> {
    store: S,
    links: LinkMaintainer<S>,
    locks: Arc<LinkLocks>,
}

impl<S: DocumentStore + Clone> AudiobookService<S> {
    pub fn new(store: S, locks: Arc<LinkLocks>) -> Self {
        Self {
            links: LinkMaintainer::new(store.clone()),
            store,
            locks,
        }
    }

    /// Returns every audiobook in store order.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Audiobook>, CatalogError> {
        let documents = self
            .store
            .find(Collection::AudioBooks, Filter::new())
            .await?;
        documents
            .iter()
            .map(|doc| doc.decode().map_err(CatalogError::from))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, raw_id: &str) -> Result<Audiobook, CatalogError> {
        let id = parse_id(Entity::Audiobook, raw_id)?;
        self.load(id).await
    }

    /// Creates an audiobook and marks its book as linked.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: AudiobookInput) -> Result<DocumentId, CatalogError> {
        let fields = input.validate()?;

        let _guard = self.locks.acquire(fields.book_id).await;
        if let Some(book_id) = fields.book_id {
            self.links.ensure_book_exists(book_id).await?;
        }

        let id = self
            .store
            .insert_one(Collection::AudioBooks, to_body(&fields)?)
            .await?;
        metrics::counter!("catalog_documents_created_total", "collection" => Collection::AudioBooks.name())
            .increment(1);
        tracing::info!(audiobook_id = %id, book_id = ?fields.book_id, "audiobook created");

        if let Some(book_id) = fields.book_id {
            self.links.link(book_id).await?;
        }
        Ok(id)
    }

    /// Replaces an audiobook's fields, moving the book link if `bookId`
    /// changed.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, raw_id: &str, input: AudiobookInput) -> Result<(), CatalogError> {
        let id = parse_id(Entity::Audiobook, raw_id)?;
        let fields = input.validate()?;

        let _audiobook_guard = self.locks.acquire([id]).await;
        let previous = self.load(id).await?.fields.book_id;

        let _book_guard = self
            .locks
            .acquire(previous.into_iter().chain(fields.book_id))
            .await;
        if let Some(book_id) = fields.book_id {
            self.links.ensure_book_exists(book_id).await?;
        }

        let replaced = self
            .store
            .replace_one(Collection::AudioBooks, id, to_body(&fields)?)
            .await?;
        if !replaced {
            return Err(CatalogError::not_found(Entity::Audiobook, id));
        }
        tracing::info!(audiobook_id = %id, ?previous, current = ?fields.book_id, "audiobook updated");

        self.links.relink(previous, fields.book_id).await
    }

    /// Deletes an audiobook, clearing its book's flag if it was the last link.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), CatalogError> {
        let id = parse_id(Entity::Audiobook, raw_id)?;

        let _audiobook_guard = self.locks.acquire([id]).await;
        let book_id = self.load(id).await?.fields.book_id;
        let _book_guard = self.locks.acquire(book_id).await;

        if !self.store.delete_one(Collection::AudioBooks, id).await? {
            return Err(CatalogError::not_found(Entity::Audiobook, id));
        }
        tracing::info!(audiobook_id = %id, ?book_id, "audiobook deleted");

        if let Some(book_id) = book_id {
            self.links.unlink_if_orphaned(book_id).await?;
        }
        Ok(())
    }

    async fn load(&self, id: DocumentId) -> Result<Audiobook, CatalogError> {
        self.store
            .find_one(Collection::AudioBooks, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(Entity::Audiobook, id))?
            .decode()
            .map_err(CatalogError::from)
    }
}
