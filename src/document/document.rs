//! Document structure for raw and reshaped search results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::field_value::FieldValue;
use crate::error::{GeneSearchError, Result};

/// A document returned by a backend, or produced by reshaping one.
///
/// Documents map field names to [`FieldValue`]s, which may themselves be
/// nested documents or arrays. Key order carries no meaning; a sorted map is
/// used so that serialized output is stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Document {
    /// The field values for this document
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document {
            fields: BTreeMap::new(),
        }
    }

    /// Build a document from a JSON object map.
    pub fn from_json_map(map: Map<String, Value>) -> Self {
        Document {
            fields: map
                .into_iter()
                .map(|(key, value)| (key, FieldValue::from(value)))
                .collect(),
        }
    }

    /// Build a document from a JSON value, which must be an object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_json_map(map)),
            other => Err(GeneSearchError::invalid_argument(format!(
                "Expected a JSON object for a document, found {other}"
            ))),
        }
    }

    /// Parse a document from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(json)?)
    }

    /// Convert the document into a JSON object value.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Add a field value to the document.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value from the document.
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Remove a field from the document.
    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Keep only the fields for which the predicate returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &mut FieldValue) -> bool,
    {
        self.fields.retain(|key, value| keep(key, value));
    }

    /// Get all field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|s| s.as_str()).collect()
    }

    /// Get all field values.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Collect every value reachable through a dotted path.
    ///
    /// Arrays met along the way are traversed element by element, and an
    /// array found at the end of the path contributes its elements, so
    /// `transcripts.id` yields the id of every transcript.
    pub fn values_at(&self, path: &str) -> Vec<&FieldValue> {
        let mut values = Vec::new();
        collect_values(self, path, &mut values);
        values
    }

    /// Check whether any value exists at a dotted path.
    pub fn contains_path(&self, path: &str) -> bool {
        !self.values_at(path).is_empty()
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }
}

fn collect_values<'a>(doc: &'a Document, path: &str, out: &mut Vec<&'a FieldValue>) {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let Some(value) = doc.get_field(head) else {
        return;
    };
    match (rest, value) {
        (None, FieldValue::Array(items)) => out.extend(items.iter()),
        (None, FieldValue::Null) => {}
        (None, value) => out.push(value),
        (Some(rest), FieldValue::Object(sub)) => collect_values(sub, rest, out),
        (Some(rest), FieldValue::Array(items)) => {
            for item in items.iter() {
                if let FieldValue::Object(sub) = item {
                    collect_values(sub, rest, out);
                }
            }
        }
        (Some(_), _) => {}
    }
}

impl TryFrom<Value> for Document {
    type Error = GeneSearchError;

    fn try_from(value: Value) -> Result<Self> {
        Document::from_json(value)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.to_json()
    }
}

impl FromIterator<(String, FieldValue)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Document {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// A builder for constructing documents in a fluent manner.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        DocumentBuilder {
            document: Document::new(),
        }
    }

    /// Add a text field to the document.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document.add_field(name, FieldValue::Text(value.into()));
        self
    }

    /// Add an integer field to the document.
    pub fn add_integer<S: Into<String>>(mut self, name: S, value: i64) -> Self {
        self.document.add_field(name, FieldValue::Integer(value));
        self
    }

    /// Add a float field to the document.
    pub fn add_float<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.document.add_field(name, FieldValue::Float(value));
        self
    }

    /// Add a boolean field to the document.
    pub fn add_boolean<S: Into<String>>(mut self, name: S, value: bool) -> Self {
        self.document.add_field(name, FieldValue::Boolean(value));
        self
    }

    /// Add a nested document.
    pub fn add_object<S: Into<String>>(mut self, name: S, value: Document) -> Self {
        self.document.add_field(name, FieldValue::from(value));
        self
    }

    /// Add an array of nested documents.
    pub fn add_objects<S: Into<String>>(mut self, name: S, values: Vec<Document>) -> Self {
        self.document.add_field(name, FieldValue::from(values));
        self
    }

    /// Add a field with a generic value.
    pub fn add_field<S: Into<String>>(mut self, name: S, value: FieldValue) -> Self {
        self.document.add_field(name, value);
        self
    }

    /// Build the final document.
    pub fn build(self) -> Document {
        self.document
    }
}
