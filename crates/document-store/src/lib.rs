pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::DocumentId;
pub use document::{Collection, Document, ID_FIELD, to_body};
pub use error::{Result, StoreError};
pub use memory::{InMemoryDocumentStore, Operation};
pub use postgres::PostgresDocumentStore;
pub use query::{Filter, Lookup, Pipeline, Projection};
pub use store::{DocumentStore, DocumentStoreExt};
