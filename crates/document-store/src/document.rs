use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{DocumentId, Result, StoreError};

/// Field under which a document's identity appears in its JSON view.
pub const ID_FIELD: &str = "_id";

/// The collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Books,
    AudioBooks,
    Users,
    Orders,
}

impl Collection {
    /// Returns the collection's storage name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Books => "books",
            Collection::AudioBooks => "audioBook",
            Collection::Users => "users",
            Collection::Orders => "orders",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Serializes a typed model into a JSON object suitable as a document body.
pub fn to_body<T: Serialize>(model: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(model)? {
        Value::Object(body) => Ok(body),
        other => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// A stored document: an identity plus a JSON object body.
///
/// The body never contains `_id`; the identity is attached when the document
/// is rendered with [`Document::to_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub body: Map<String, Value>,
}

impl Document {
    /// Creates a document, dropping any `_id` key from the body.
    pub fn new(id: DocumentId, mut body: Map<String, Value>) -> Self {
        body.remove(ID_FIELD);
        Self { id, body }
    }

    /// Serializes a typed model into a document body.
    ///
    /// The model must serialize to a JSON object. An `_id` field on the
    /// model is discarded in favour of `id`.
    pub fn from_model<T: Serialize>(id: DocumentId, model: &T) -> Result<Self> {
        Ok(Self::new(id, to_body(model)?))
    }

    /// Returns the value of a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        if field == ID_FIELD {
            return None;
        }
        self.body.get(field)
    }

    /// Renders the document as a JSON object including `_id`.
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.body.len() + 1);
        object.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        for (key, value) in &self.body {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    /// Deserializes the document (including `_id`) into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}
