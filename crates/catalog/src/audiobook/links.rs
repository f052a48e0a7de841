//! Keeps `books.hasAudiobook` in step with the audiobooks that reference a book.

use std::collections::HashMap;
use std::sync::Arc;

use common::DocumentId;
use document_store::{Collection, DocumentStore, DocumentStoreExt, Filter, StoreError};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::BOOK_ID_FIELD;
use crate::book::HAS_AUDIOBOOK_FIELD;
use crate::error::{CatalogError, Entity};

/// Per-key async locks serializing link maintenance within one process.
///
/// Callers take an audiobook key before any book keys. Book keys are always
/// taken together, sorted, through a single [`LinkLocks::acquire`] call.
#[derive(Debug, Default)]
pub struct LinkLocks {
    slots: Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>,
}

/// Held locks. Dropping the guard releases them.
#[derive(Debug)]
pub struct LinkGuard {
    _held: Vec<OwnedMutexGuard<()>>,
}

impl LinkLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every key, in ascending order, skipping duplicates.
    pub async fn acquire(&self, keys: impl IntoIterator<Item = DocumentId>) -> LinkGuard {
        let mut keys: Vec<DocumentId> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let slots: Vec<Arc<Mutex<()>>> = {
            let mut table = self.slots.lock().await;
            // Slots nobody else references are idle and can go.
            table.retain(|_, slot| Arc::strong_count(slot) > 1);
            keys.iter()
                .map(|key| Arc::clone(table.entry(*key).or_default()))
                .collect()
        };

        let mut held = Vec::with_capacity(slots.len());
        for slot in slots {
            held.push(slot.lock_owned().await);
        }
        LinkGuard { _held: held }
    }

    /// Number of keys with a live slot.
    pub async fn tracked(&self) -> usize {
        self.slots.lock().await.len()
    }
}

/// The store steps that maintain the `hasAudiobook` flag.
#[derive(Clone)]
pub struct LinkMaintainer<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> LinkMaintainer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Fails with `ReferenceNotFound` unless the book exists.
    pub async fn ensure_book_exists(&self, book_id: DocumentId) -> Result<(), CatalogError> {
        if self.store.exists(Collection::Books, book_id).await? {
            Ok(())
        } else {
            Err(CatalogError::not_found(Entity::Book, book_id))
        }
    }

    /// Marks the book as having an audiobook.
    #[tracing::instrument(skip(self))]
    pub async fn link(&self, book_id: DocumentId) -> Result<(), CatalogError> {
        self.set_flag(book_id, true).await?;
        metrics::counter!("catalog_audiobook_links_total", "change" => "link").increment(1);
        tracing::debug!(%book_id, "book linked");
        Ok(())
    }

    /// Clears the flag when no audiobook references the book any more.
    ///
    /// Returns whether the flag was cleared.
    #[tracing::instrument(skip(self))]
    pub async fn unlink_if_orphaned(&self, book_id: DocumentId) -> Result<bool, CatalogError> {
        let remaining = self
            .store
            .count_documents(
                Collection::AudioBooks,
                Filter::new().eq_id(BOOK_ID_FIELD, book_id),
            )
            .await
            .map_err(|source| link_sync_failure(book_id, source))?;

        if remaining > 0 {
            tracing::debug!(%book_id, remaining, "book still linked");
            return Ok(false);
        }

        self.set_flag(book_id, false).await?;
        metrics::counter!("catalog_audiobook_links_total", "change" => "unlink").increment(1);
        tracing::info!(%book_id, "last audiobook unlinked from book");
        Ok(true)
    }

    /// Applies a `bookId` change from `previous` to `current`.
    ///
    /// The unlink and link steps are independent: both are attempted and the
    /// first failure is returned.
    pub async fn relink(
        &self,
        previous: Option<DocumentId>,
        current: Option<DocumentId>,
    ) -> Result<(), CatalogError> {
        let unlinked = match previous {
            Some(old) if Some(old) != current => self.unlink_if_orphaned(old).await.map(drop),
            _ => Ok(()),
        };
        let linked = match current {
            Some(new) => self.link(new).await,
            None => Ok(()),
        };
        unlinked.and(linked)
    }

    async fn set_flag(&self, book_id: DocumentId, value: bool) -> Result<(), CatalogError> {
        self.store
            .set_field(
                Collection::Books,
                book_id,
                HAS_AUDIOBOOK_FIELD,
                Value::Bool(value),
            )
            .await
            .map(drop)
            .map_err(|source| link_sync_failure(book_id, source))
    }
}

fn link_sync_failure(book_id: DocumentId, source: StoreError) -> CatalogError {
    metrics::counter!("catalog_link_sync_failures_total").increment(1);
    tracing::error!(%book_id, error = %source, "failed to synchronize audiobook link");
    CatalogError::LinkSync { book_id, source }
}
