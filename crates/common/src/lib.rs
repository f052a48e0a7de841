pub mod types;

pub use types::{DocumentId, IdParseError};
