use serde_json::{Map, Value};

use crate::document::ID_FIELD;
use crate::{Collection, Document, DocumentId};

/// Equality filter over top-level document fields.
///
/// All conditions must hold. An expected `null` matches both an explicit
/// `null` and a missing field. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Creates a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter on a single field.
    pub fn by(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().eq(field, value)
    }

    /// Adds an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Adds an equality condition against a document identity.
    pub fn eq_id(self, field: impl Into<String>, id: DocumentId) -> Self {
        self.eq(field, Value::String(id.to_string()))
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            if field == ID_FIELD {
                return expected.as_str() == Some(doc.id.to_string().as_str());
            }
            match (doc.body.get(field), expected) {
                (None | Some(Value::Null), Value::Null) => true,
                (Some(actual), expected) => actual == expected,
                (None, _) => false,
            }
        })
    }
}

/// Join stage: attach every document of `from` whose `foreign_field` equals
/// the local document's identity, as an array under `as_field`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: Collection,
    pub foreign_field: String,
    pub as_field: String,
}

impl Lookup {
    pub fn new(
        from: Collection,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        Self {
            from,
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
        }
    }
}

/// Field whitelist applied to aggregation output.
///
/// `_id` is always kept at the top level. Nested fields apply to the
/// objects inside one array field, usually the lookup output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub fields: Vec<String>,
    pub nested: Option<(String, Vec<String>)>,
}

impl Projection {
    /// Keeps the given top-level fields.
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            nested: None,
        }
    }

    /// Keeps the given fields of each element of the `array` field.
    pub fn nested<I, S>(mut self, array: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nested = Some((array.into(), fields.into_iter().map(Into::into).collect()));
        self
    }

    /// Applies the projection to a rendered document.
    pub fn apply(&self, object: Map<String, Value>) -> Map<String, Value> {
        let mut object = object;
        let mut projected = Map::new();

        if let Some(id) = object.remove(ID_FIELD) {
            projected.insert(ID_FIELD.to_string(), id);
        }
        for field in &self.fields {
            if let Some(value) = object.remove(field) {
                projected.insert(field.clone(), value);
            }
        }
        if let Some((array, nested_fields)) = &self.nested
            && let Some(Value::Array(items)) = object.remove(array)
        {
            let items = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(mut inner) => {
                        let mut kept = Map::new();
                        for field in nested_fields {
                            if let Some(value) = inner.remove(field) {
                                kept.insert(field.clone(), value);
                            }
                        }
                        Value::Object(kept)
                    }
                    other => other,
                })
                .collect();
            projected.insert(array.clone(), Value::Array(items));
        }

        projected
    }
}

/// An aggregation over one collection: optional identity match, optional
/// lookup, optional projection, applied in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub match_id: Option<DocumentId>,
    pub lookup: Option<Lookup>,
    pub projection: Option<Projection>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the pipeline to a single document.
    pub fn match_id(mut self, id: DocumentId) -> Self {
        self.match_id = Some(id);
        self
    }

    /// Adds a lookup stage.
    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Adds a projection stage.
    pub fn project(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Shapes one joined row into its output value.
    ///
    /// Both backends fetch the local document and its joined documents, then
    /// share this step so that output shape does not depend on the backend.
    pub fn shape(&self, local: &Document, joined: Vec<Value>) -> Value {
        let mut object = local.body.clone();
        object.insert(ID_FIELD.to_string(), Value::String(local.id.to_string()));
        if let Some(lookup) = &self.lookup {
            object.insert(lookup.as_field.clone(), Value::Array(joined));
        }
        match &self.projection {
            Some(projection) => Value::Object(projection.apply(object)),
            None => Value::Object(object),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(body: Value) -> Document {
        let Value::Object(body) = body else {
            unreachable!()
        };
        Document::new(DocumentId::new(), body)
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&doc(json!({"a": 1}))));
    }

    #[test]
    fn filter_requires_all_conditions() {
        let d = doc(json!({"a": 1, "b": "x"}));
        assert!(Filter::by("a", 1).eq("b", "x").matches(&d));
        assert!(!Filter::by("a", 1).eq("b", "y").matches(&d));
        assert!(!Filter::by("c", 1).matches(&d));
    }

    #[test]
    fn null_filter_matches_missing_field() {
        assert!(Filter::by("bookId", Value::Null).matches(&doc(json!({}))));
        assert!(Filter::by("bookId", Value::Null).matches(&doc(json!({"bookId": null}))));
        assert!(!Filter::by("bookId", Value::Null).matches(&doc(json!({"bookId": "x"}))));
    }

    #[test]
    fn filter_on_identity() {
        let d = doc(json!({}));
        assert!(Filter::new().eq_id(ID_FIELD, d.id).matches(&d));
        assert!(!Filter::new().eq_id(ID_FIELD, DocumentId::new()).matches(&d));
    }

    #[test]
    fn projection_keeps_whitelisted_fields_only() {
        let projection = Projection::fields(["title"]).nested("audiobooks", ["_id", "time"]);
        let Value::Object(input) = json!({
            "_id": "b1",
            "title": "Dune",
            "secret": true,
            "audiobooks": [{"_id": "a1", "time": "08:30", "title": "dropped"}]
        }) else {
            unreachable!()
        };

        let output = Value::Object(projection.apply(input));
        assert_eq!(
            output,
            json!({
                "_id": "b1",
                "title": "Dune",
                "audiobooks": [{"_id": "a1", "time": "08:30"}]
            })
        );
    }

    #[test]
    fn shape_attaches_empty_lookup_array() {
        let pipeline = Pipeline::new()
            .lookup(Lookup::new(Collection::AudioBooks, "bookId", "audiobooks"))
            .project(Projection::fields(["title"]).nested("audiobooks", ["_id"]));
        let local = doc(json!({"title": "Dune"}));

        let shaped = pipeline.shape(&local, vec![]);
        assert_eq!(shaped["audiobooks"], json!([]));
        assert_eq!(shaped["title"], json!("Dune"));
    }
}
