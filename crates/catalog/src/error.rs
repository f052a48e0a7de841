//! Catalog error types.

use common::DocumentId;
use document_store::StoreError;
use thiserror::Error;

/// The kinds of records the catalog manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Book,
    Audiobook,
    User,
    Order,
}

impl Entity {
    /// Lowercase noun used inside messages.
    pub fn noun(&self) -> &'static str {
        match self {
            Entity::Book => "book",
            Entity::Audiobook => "audiobook",
            Entity::User => "user",
            Entity::Order => "order",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Entity::Book => "Book",
            Entity::Audiobook => "Audiobook",
            Entity::User => "User",
            Entity::Order => "Order",
        };
        f.write_str(label)
    }
}

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An identity string is not well-formed.
    #[error("Invalid {} ID format", .entity.noun())]
    InvalidReferenceFormat { entity: Entity, value: String },

    /// A well-formed identity has no matching record.
    #[error("{entity} not found")]
    ReferenceNotFound { entity: Entity, id: DocumentId },

    /// A business rule forbids the requested association.
    #[error("Invalid association: {0}")]
    InvalidAssociation(String),

    /// Request fields failed validation.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The request conflicts with an existing record.
    #[error("{0}")]
    Conflict(String),

    /// An error occurred in the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The primary write committed but keeping the book link in sync failed.
    #[error("Failed to synchronize audiobook link for book {book_id}: {source}")]
    LinkSync {
        book_id: DocumentId,
        #[source]
        source: StoreError,
    },
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Store(StoreError::Serialization(e))
    }
}

impl CatalogError {
    pub(crate) fn not_found(entity: Entity, id: DocumentId) -> Self {
        CatalogError::ReferenceNotFound { entity, id }
    }
}

/// Parses an identity supplied by a caller.
///
/// Runs before any store access, so a malformed identity never costs a
/// round trip.
pub fn parse_id(entity: Entity, raw: &str) -> Result<DocumentId, CatalogError> {
    DocumentId::parse(raw).map_err(|_| CatalogError::InvalidReferenceFormat {
        entity,
        value: raw.to_string(),
    })
}
