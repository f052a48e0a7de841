use std::collections::HashSet;

use common::DocumentId;
use document_store::{Collection, DocumentStore, DocumentStoreExt, Filter, to_body};
use futures_util::future::try_join_all;

use super::{Order, OrderFields, OrderInput, USER_ID_FIELD};
use crate::error::{CatalogError, Entity, parse_id};

/// Service for managing orders.
pub struct OrderService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>, CatalogError> {
        self.find(Filter::new()).await
    }

    /// Lists the orders placed by one user.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_user(&self, raw_user_id: &str) -> Result<Vec<Order>, CatalogError> {
        let user_id = parse_id(Entity::User, raw_user_id)?;
        if !self.store.exists(Collection::Users, user_id).await? {
            return Err(CatalogError::not_found(Entity::User, user_id));
        }
        self.find(Filter::new().eq_id(USER_ID_FIELD, user_id)).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, raw_id: &str) -> Result<Order, CatalogError> {
        let id = parse_id(Entity::Order, raw_id)?;
        self.store
            .find_one(Collection::Orders, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(Entity::Order, id))?
            .decode()
            .map_err(CatalogError::from)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: OrderInput) -> Result<DocumentId, CatalogError> {
        let fields = input.validate_for_create()?;
        self.ensure_references(&fields).await?;

        let id = self
            .store
            .insert_one(Collection::Orders, to_body(&fields)?)
            .await?;
        metrics::counter!("catalog_documents_created_total", "collection" => Collection::Orders.name())
            .increment(1);
        tracing::info!(order_id = %id, user_id = %fields.user_id, books = fields.book_ids.len(), "order created");
        Ok(id)
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, raw_id: &str, input: OrderInput) -> Result<(), CatalogError> {
        let id = parse_id(Entity::Order, raw_id)?;
        let fields = input.validate_for_update()?;
        self.ensure_references(&fields).await?;

        let mut set = to_body(&fields)?;
        if fields.tracking_number.is_none() {
            set.insert("trackingNumber".to_string(), serde_json::Value::Null);
        }
        if !self.store.update_one(Collection::Orders, id, set).await? {
            return Err(CatalogError::not_found(Entity::Order, id));
        }
        tracing::info!(order_id = %id, "order updated");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), CatalogError> {
        let id = parse_id(Entity::Order, raw_id)?;
        if !self.store.delete_one(Collection::Orders, id).await? {
            return Err(CatalogError::not_found(Entity::Order, id));
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    async fn find(&self, filter: Filter) -> Result<Vec<Order>, CatalogError> {
        self.store
            .find(Collection::Orders, filter)
            .await?
            .iter()
            .map(|doc| doc.decode().map_err(CatalogError::from))
            .collect()
    }

    /// Checks that the ordering user and every ordered book exist.
    async fn ensure_references(&self, fields: &OrderFields) -> Result<(), CatalogError> {
        if !self.store.exists(Collection::Users, fields.user_id).await? {
            return Err(CatalogError::not_found(Entity::User, fields.user_id));
        }

        let mut seen = HashSet::new();
        let book_ids: Vec<DocumentId> = fields
            .book_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let found = try_join_all(
            book_ids
                .iter()
                .map(|id| self.store.exists(Collection::Books, *id)),
        )
        .await?;
        match book_ids.iter().zip(found).find(|(_, exists)| !exists) {
            Some((missing, _)) => Err(CatalogError::not_found(Entity::Book, *missing)),
            None => Ok(()),
        }
    }
}
