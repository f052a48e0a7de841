//! Audiobooks and their link to a book.

mod links;
mod service;

pub use links::{LinkLocks, LinkMaintainer};
pub use service::AudiobookService;

use common::DocumentId;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Entity, parse_id};
use crate::validation::{Violations, char_len, is_clock_time};

/// Audiobook field referencing the linked book.
pub const BOOK_ID_FIELD: &str = "bookId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Aac,
    Wav,
}

impl AudioFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "mp3" => Some(AudioFormat::Mp3),
            "aac" => Some(AudioFormat::Aac),
            "wav" => Some(AudioFormat::Wav),
            _ => None,
        }
    }
}

/// A narrated reading of a book, or a standalone audio drama.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudiobookType {
    Standard,
    Audiodrama,
}

impl AudiobookType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(AudiobookType::Standard),
            "audiodrama" => Some(AudiobookType::Audiodrama),
            _ => None,
        }
    }
}

/// The stored fields of an audiobook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudiobookFields {
    pub title: String,
    pub author: String,
    pub voice_actor: String,
    pub recording_studio: String,
    pub genre: String,
    pub audio_format: AudioFormat,
    pub time: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AudiobookType>,
    #[serde(default)]
    pub book_id: Option<DocumentId>,
}

/// A stored audiobook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audiobook {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub fields: AudiobookFields,
}

/// Audiobook create/update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudiobookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub voice_actor: Option<String>,
    pub recording_studio: Option<String>,
    pub genre: Option<String>,
    pub audio_format: Option<String>,
    pub time: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub book_id: Option<String>,
}

/// Rejects links a given audiobook type may never carry.
pub fn check_association(
    kind: Option<AudiobookType>,
    book_id: Option<DocumentId>,
) -> Result<(), CatalogError> {
    if kind == Some(AudiobookType::Audiodrama) && book_id.is_some() {
        return Err(CatalogError::InvalidAssociation(
            "an audiodrama cannot be linked to a book".to_string(),
        ));
    }
    Ok(())
}

fn min_chars(
    v: &mut Violations,
    value: Option<&str>,
    min: usize,
    empty: &str,
    short: &str,
) -> Option<String> {
    let value = v.require(value, empty)?;
    v.check(char_len(value) >= min, short)
        .then(|| value.to_string())
}

impl AudiobookInput {
    /// Validates the request into storable fields.
    ///
    /// Field rules run first, then the `bookId` format check, then the
    /// association rule. None of them touch the store.
    pub fn validate(&self) -> Result<AudiobookFields, CatalogError> {
        let mut v = Violations::new();

        let title = min_chars(
            &mut v,
            self.title.as_deref(),
            10,
            "Title field cannot be empty",
            "Title must be at least 10 characters long",
        );
        let author = min_chars(
            &mut v,
            self.author.as_deref(),
            10,
            "Author field cannot be empty",
            "Author must be at least 10 characters long",
        );
        let voice_actor = min_chars(
            &mut v,
            self.voice_actor.as_deref(),
            10,
            "Actor field cannot be empty",
            "Actor must be at least 10 characters long",
        );
        let recording_studio = min_chars(
            &mut v,
            self.recording_studio.as_deref(),
            3,
            "Recording studio field cannot be empty",
            "Recording studio must be at least 3 characters long",
        );
        let genre = v
            .require(self.genre.as_deref(), "Genre field cannot be empty")
            .map(str::to_string);

        let audio_format = v
            .require(self.audio_format.as_deref(), "Format field cannot be empty")
            .and_then(|raw| {
                let parsed = AudioFormat::parse(raw);
                v.check(parsed.is_some(), "Format must be one of mp3, aac, wav");
                parsed
            });

        let time = v
            .require(self.time.as_deref(), "Time field cannot be empty")
            .and_then(|raw| {
                v.check(is_clock_time(raw), "Time must be in hh:mm format")
                    .then(|| raw.to_string())
            });

        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = AudiobookType::parse(raw);
                v.check(parsed.is_some(), "Type must be one of standard, audiodrama");
                parsed
            }
        };

        v.finish()?;

        let book_id = self
            .book_id
            .as_deref()
            .map(|raw| parse_id(Entity::Book, raw))
            .transpose()?;

        check_association(kind, book_id)?;

        let (
            Some(title),
            Some(author),
            Some(voice_actor),
            Some(recording_studio),
            Some(genre),
            Some(audio_format),
            Some(time),
        ) = (
            title,
            author,
            voice_actor,
            recording_studio,
            genre,
            audio_format,
            time,
        ) else {
            return Err(CatalogError::Validation(vec![
                "Missing required audiobook fields".to_string(),
            ]));
        };

        Ok(AudiobookFields {
            title,
            author,
            voice_actor,
            recording_studio,
            genre,
            audio_format,
            time,
            kind,
            book_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> AudiobookInput {
        AudiobookInput {
            title: Some("Mystery at Midnight".into()),
            author: Some("Sarah Johnson".into()),
            voice_actor: Some("Morgan Freeman".into()),
            recording_studio: Some("Audible Studios".into()),
            genre: Some("Mystery".into()),
            audio_format: Some("mp3".into()),
            time: Some("08:30".into()),
            kind: None,
            book_id: None,
        }
    }

    #[test]
    fn valid_input_without_link() {
        let fields = valid_input().validate().unwrap();
        assert_eq!(fields.audio_format, AudioFormat::Mp3);
        assert_eq!(fields.book_id, None);
        assert_eq!(fields.kind, None);
    }

    #[test]
    fn malformed_book_id_is_a_reference_error() {
        let input = AudiobookInput {
            book_id: Some("12345".into()),
            ..valid_input()
        };
        assert!(matches!(
            input.validate(),
            Err(CatalogError::InvalidReferenceFormat {
                entity: Entity::Book,
                ..
            })
        ));
    }

    #[test]
    fn audiodrama_with_book_is_rejected() {
        let input = AudiobookInput {
            kind: Some("audiodrama".into()),
            book_id: Some(DocumentId::new().to_string()),
            ..valid_input()
        };
        assert!(matches!(
            input.validate(),
            Err(CatalogError::InvalidAssociation(_))
        ));
    }

    #[test]
    fn audiodrama_without_book_is_fine() {
        let input = AudiobookInput {
            kind: Some("audiodrama".into()),
            ..valid_input()
        };
        let fields = input.validate().unwrap();
        assert_eq!(fields.kind, Some(AudiobookType::Audiodrama));
    }

    #[test]
    fn field_rules_are_reported_together() {
        let input = AudiobookInput {
            title: Some("Short".into()),
            audio_format: Some("flac".into()),
            time: Some("8:30".into()),
            ..valid_input()
        };
        let CatalogError::Validation(messages) = input.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(
            messages,
            vec![
                "Title must be at least 10 characters long",
                "Format must be one of mp3, aac, wav",
                "Time must be in hh:mm format",
            ]
        );
    }

    #[test]
    fn stored_fields_carry_null_book_id() {
        let value = serde_json::to_value(valid_input().validate().unwrap()).unwrap();
        assert_eq!(value["bookId"], serde_json::Value::Null);
        assert!(value.get("type").is_none());
    }
}
