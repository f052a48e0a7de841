//! Books joined with their audiobooks.

use common::DocumentId;
use document_store::{Collection, Lookup, Pipeline, Projection};
use serde::{Deserialize, Serialize};

use super::PrintType;
use crate::audiobook::{AudioFormat, AudiobookType, BOOK_ID_FIELD};

/// Array field the joined audiobooks are attached under.
pub const AUDIOBOOKS_FIELD: &str = "audiobooks";

const BOOK_VIEW_FIELDS: [&str; 7] = [
    "title",
    "author",
    "pages",
    "genre",
    "printType",
    "publisher",
    "hasAudiobook",
];

const AUDIOBOOK_SUMMARY_FIELDS: [&str; 6] = [
    "_id",
    "type",
    "voiceActor",
    "time",
    "recordingStudio",
    "audioFormat",
];

/// The audiobook fields exposed on a book view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudiobookSummary {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AudiobookType>,
    pub voice_actor: String,
    pub time: String,
    pub recording_studio: String,
    pub audio_format: AudioFormat,
}

/// A book with its linked audiobooks.
///
/// `audiobooks` is always present, empty when nothing links to the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub title: String,
    pub author: String,
    pub pages: u32,
    pub genre: String,
    pub print_type: PrintType,
    pub publisher: String,
    #[serde(default)]
    pub has_audiobook: bool,
    #[serde(default)]
    pub audiobooks: Vec<AudiobookSummary>,
}

/// Pipeline joining every book to the audiobooks whose `bookId` is the
/// book's identity, restricted to the view fields.
pub fn joined_books() -> Pipeline {
    Pipeline::new()
        .lookup(Lookup::new(
            Collection::AudioBooks,
            BOOK_ID_FIELD,
            AUDIOBOOKS_FIELD,
        ))
        .project(
            Projection::fields(BOOK_VIEW_FIELDS)
                .nested(AUDIOBOOKS_FIELD, AUDIOBOOK_SUMMARY_FIELDS),
        )
}
