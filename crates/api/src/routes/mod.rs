pub mod audio;
pub mod books;
pub mod health;
pub mod index;
pub mod metrics;
pub mod orders;
pub mod users;
