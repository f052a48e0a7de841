//! Books and the joined book view.

mod service;
mod view;

pub use service::BookService;
pub use view::{AUDIOBOOKS_FIELD, AudiobookSummary, BookView, joined_books};

use common::DocumentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;
use crate::validation::{Violations, is_letters_and_spaces, is_title};

/// Derived book field recording whether any audiobook links to the book.
pub const HAS_AUDIOBOOK_FIELD: &str = "hasAudiobook";

/// Physical or digital edition of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintType {
    Paper,
    Hardback,
    Digital,
}

impl PrintType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Paper" => Some(PrintType::Paper),
            "Hardback" => Some(PrintType::Hardback),
            "Digital" => Some(PrintType::Digital),
            _ => None,
        }
    }
}

/// The client-editable fields of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub pages: u32,
    pub genre: String,
    pub print_type: PrintType,
    pub publisher: String,
}

/// A stored book.
///
/// `has_audiobook` is derived from audiobook links and is only ever
/// written by the link maintenance code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub fields: BookFields,
    #[serde(default)]
    pub has_audiobook: bool,
}

/// Book create/update request.
///
/// There is deliberately no `hasAudiobook` field: a value sent by a client
/// is ignored. `pages` stays raw JSON so that numeric strings are accepted
/// and anything else is reported as a field error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Option<Value>,
    pub genre: Option<String>,
    pub print_type: Option<String>,
    pub publisher: Option<String>,
}

/// Reads a positive page count from a JSON number or a numeric string.
fn page_count(raw: &Value) -> Option<u32> {
    let count: i64 = match raw {
        Value::Number(number) => number.as_i64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    u32::try_from(count).ok().filter(|pages| *pages >= 1)
}

impl BookInput {
    /// Validates the request into storable fields.
    pub fn validate(&self) -> Result<BookFields, CatalogError> {
        let mut v = Violations::new();

        let title = v.require(self.title.as_deref(), "Title is required");
        if let Some(title) = title {
            v.check(is_title(title), "Title contains invalid characters");
        }

        let author = v.require(self.author.as_deref(), "Author is required");
        if let Some(author) = author {
            v.check(
                is_letters_and_spaces(author),
                "Author must contain only letters",
            );
        }

        let pages = match self.pages.as_ref() {
            None => {
                v.check(false, "Pages are required");
                None
            }
            Some(Value::String(raw)) if raw.trim().is_empty() => {
                v.check(false, "Pages are required");
                None
            }
            Some(raw) => {
                let parsed = page_count(raw);
                v.check(parsed.is_some(), "Pages must be a positive integer");
                parsed
            }
        };

        let genre = v.require(self.genre.as_deref(), "Genre is required");
        if let Some(genre) = genre {
            v.check(
                is_letters_and_spaces(genre),
                "Genre must contain only letters",
            );
        }

        let print_type = v
            .require(self.print_type.as_deref(), "Print type required")
            .and_then(|raw| {
                let parsed = PrintType::parse(raw);
                v.check(
                    parsed.is_some(),
                    "Print type must be: Paper, Hardback, or Digital",
                );
                parsed
            });

        let publisher = v.require(self.publisher.as_deref(), "Publisher is required");
        if let Some(publisher) = publisher {
            v.check(
                is_letters_and_spaces(publisher),
                "Publisher must contain only letters",
            );
        }

        v.finish()?;
        let (
            Some(title),
            Some(author),
            Some(pages),
            Some(genre),
            Some(print_type),
            Some(publisher),
        ) = (title, author, pages, genre, print_type, publisher)
        else {
            return Err(CatalogError::Validation(vec![
                "Missing required book fields".to_string(),
            ]));
        };

        Ok(BookFields {
            title: title.to_string(),
            author: author.to_string(),
            pages,
            genre: genre.to_string(),
            print_type,
            publisher: publisher.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid_input() -> BookInput {
        BookInput {
            title: Some("Dune".into()),
            author: Some("Frank Herbert".into()),
            pages: Some(json!(412)),
            genre: Some("Science Fiction".into()),
            print_type: Some("Paper".into()),
            publisher: Some("Chilton Books".into()),
        }
    }

    #[test]
    fn valid_input_produces_fields() {
        let fields = valid_input().validate().unwrap();
        assert_eq!(fields.pages, 412);
        assert_eq!(fields.print_type, PrintType::Paper);
    }

    #[test]
    fn every_problem_is_reported() {
        let input = BookInput {
            title: Some("Dune!".into()),
            pages: Some(json!(0)),
            print_type: Some("Scroll".into()),
            ..valid_input()
        };

        let CatalogError::Validation(messages) = input.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(
            messages,
            vec![
                "Title contains invalid characters",
                "Pages must be a positive integer",
                "Print type must be: Paper, Hardback, or Digital",
            ]
        );
    }

    #[test]
    fn missing_fields_are_required() {
        let CatalogError::Validation(messages) = BookInput::default().validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(messages.len(), 6);
    }

    #[test]
    fn has_audiobook_in_payload_is_ignored() {
        let input: BookInput = serde_json::from_value(json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "pages": 412,
            "genre": "Science Fiction",
            "printType": "Digital",
            "publisher": "Chilton Books",
            "hasAudiobook": true
        }))
        .unwrap();
        let fields = serde_json::to_value(input.validate().unwrap()).unwrap();
        assert!(fields.get("hasAudiobook").is_none());
    }

    #[test]
    fn numeric_string_pages_are_accepted() {
        let input = BookInput {
            pages: Some(json!(" 310 ")),
            ..valid_input()
        };
        assert_eq!(input.validate().unwrap().pages, 310);
    }

    #[test]
    fn non_numeric_pages_are_a_field_error() {
        for pages in [json!("ten"), json!(12.5), json!(true), json!(-3)] {
            let input = BookInput {
                pages: Some(pages),
                ..valid_input()
            };
            let CatalogError::Validation(messages) = input.validate().unwrap_err() else {
                panic!("expected validation error");
            };
            assert_eq!(messages, vec!["Pages must be a positive integer"]);
        }
    }

    #[test]
    fn blank_pages_are_required() {
        let input = BookInput {
            pages: Some(json!("  ")),
            ..valid_input()
        };
        let CatalogError::Validation(messages) = input.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(messages, vec!["Pages are required"]);
    }
}
