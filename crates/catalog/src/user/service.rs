use chrono::Utc;
use common::DocumentId;
use document_store::{Collection, DocumentStore, Filter, to_body};

use super::{EMAIL_FIELD, StoredUser, UserFields, UserInput, UserView};
use crate::error::{CatalogError, Entity, parse_id};

/// Service for managing users.
///
/// Email uniqueness is checked with a lookup before each write; the check and
/// the write are separate store calls.
pub struct UserService<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserView>, CatalogError> {
        self.store
            .find(Collection::Users, Filter::new())
            .await?
            .iter()
            .map(|doc| doc.decode().map_err(CatalogError::from))
            .collect()
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, raw_id: &str) -> Result<UserView, CatalogError> {
        let id = parse_id(Entity::User, raw_id)?;
        self.load(id).await
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn create(&self, input: UserInput) -> Result<DocumentId, CatalogError> {
        let fields = input.validate()?;
        self.ensure_email_free(&fields, None).await?;

        let now = Utc::now();
        let body = to_body(&StoredUser {
            fields: &fields,
            created_at: now,
            updated_at: now,
        })?;
        let id = self.store.insert_one(Collection::Users, body).await?;
        metrics::counter!("catalog_documents_created_total", "collection" => Collection::Users.name())
            .increment(1);
        tracing::info!(user_id = %id, "user created");
        Ok(id)
    }

    /// Replaces a user's fields, keeping `createdAt`.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, raw_id: &str, input: UserInput) -> Result<(), CatalogError> {
        let id = parse_id(Entity::User, raw_id)?;
        let fields = input.validate()?;

        let existing = self.load(id).await?;
        self.ensure_email_free(&fields, Some(id)).await?;

        let body = to_body(&StoredUser {
            fields: &fields,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        })?;
        if !self.store.replace_one(Collection::Users, id, body).await? {
            return Err(CatalogError::not_found(Entity::User, id));
        }
        tracing::info!(user_id = %id, "user updated");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), CatalogError> {
        let id = parse_id(Entity::User, raw_id)?;
        if !self.store.delete_one(Collection::Users, id).await? {
            return Err(CatalogError::not_found(Entity::User, id));
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn load(&self, id: DocumentId) -> Result<UserView, CatalogError> {
        self.store
            .find_one(Collection::Users, id)
            .await?
            .ok_or_else(|| CatalogError::not_found(Entity::User, id))?
            .decode()
            .map_err(CatalogError::from)
    }

    async fn ensure_email_free(
        &self,
        fields: &UserFields,
        owner: Option<DocumentId>,
    ) -> Result<(), CatalogError> {
        let holders = self
            .store
            .find(
                Collection::Users,
                Filter::by(EMAIL_FIELD, fields.email.as_str()),
            )
            .await?;
        if holders.iter().any(|doc| Some(doc.id) != owner) {
            return Err(CatalogError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
        Ok(())
    }
}
