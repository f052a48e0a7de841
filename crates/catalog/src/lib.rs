//! Bookstore catalog: books, audiobooks, users and orders over a
//! [`DocumentStore`].
//!
//! Audiobook writes keep each book's `hasAudiobook` flag consistent with the
//! audiobooks referencing it, and book reads join the linked audiobooks into
//! a projected view.

pub mod audiobook;
pub mod book;
pub mod error;
pub mod order;
pub mod user;
pub mod validation;

use std::sync::Arc;

use document_store::DocumentStore;

pub use audiobook::{Audiobook, AudiobookInput, AudiobookService, LinkLocks};
pub use book::{Book, BookInput, BookService, BookView};
pub use error::{CatalogError, Entity};
pub use order::{Order, OrderInput, OrderService};
pub use user::{UserInput, UserService, UserView};

/// The services of the catalog, sharing one store and one set of link locks.
pub struct Catalog<S: DocumentStore> {
    pub books: BookService<S>,
    pub audiobooks: AudiobookService<S>,
    pub users: UserService<S>,
    pub orders: OrderService<S>,
}

impl<S: DocumentStore + Clone> Catalog<S> {
    pub fn new(store: S) -> Self {
        let locks = Arc::new(LinkLocks::new());
        Self {
            books: BookService::new(store.clone(), Arc::clone(&locks)),
            audiobooks: AudiobookService::new(store.clone(), locks),
            users: UserService::new(store.clone()),
            orders: OrderService::new(store),
        }
    }
}
