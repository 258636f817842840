//! Field value types for documents.
//!
//! This module defines the [`FieldValue`] enum which represents every value a
//! backend can return inside a document: scalars, nested documents and arrays.
//! Nested parts are held behind [`Arc`] so that cloning a document, or
//! building a flattened row from a parent, shares unmodified sub-trees instead
//! of copying them.
//!
//! # Supported Types
//!
//! - **Text** - String data
//! - **Integer** - 64-bit signed integers
//! - **Float** - 64-bit floating-point numbers
//! - **Boolean** - true/false values
//! - **Array** - Arrays of values (typically sub-documents)
//! - **Object** - Nested documents
//! - **Null** - Explicit null values
//!
//! # Examples
//!
//! ```
//! use genesearch::document::field_value::FieldValue;
//!
//! let text_value = FieldValue::Text("BRCA2".to_string());
//! assert_eq!(text_value.as_text(), Some("BRCA2"));
//!
//! let int_value = FieldValue::Integer(32315474);
//! assert_eq!(int_value.to_term_string(), Some("32315474".to_string()));
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::document::document::Document;

/// Represents a value for a field in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FieldValue {
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Array of values
    Array(Arc<Vec<FieldValue>>),
    /// Nested document
    Object(Arc<Document>),
    /// Null value
    Null,
}

impl FieldValue {
    /// Convert to text if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret the value as a number.
    ///
    /// Text values holding a decimal number are accepted, since backends
    /// frequently store coordinates and counts as strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Convert to boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            FieldValue::Text(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            FieldValue::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Get the elements if this is an array.
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Get the nested document if this is an object.
    pub fn as_object(&self) -> Option<&Document> {
        match self {
            FieldValue::Object(doc) => Some(doc),
            _ => None,
        }
    }

    /// Check whether this is an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check whether this is a scalar (text, number or boolean).
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldValue::Text(_) | FieldValue::Integer(_) | FieldValue::Float(_) | FieldValue::Boolean(_)
        )
    }

    /// String form used when comparing a stored value against a query term.
    ///
    /// Returns `None` for nulls, arrays and objects.
    pub fn to_term_string(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Convert into a `serde_json::Value`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::Number((*i).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Array(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Object(doc) => doc.to_json(),
            FieldValue::Null => Value::Null,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    FieldValue::Float(f)
                } else {
                    FieldValue::Text(n.to_string())
                }
            }
            Value::String(s) => FieldValue::Text(s),
            Value::Array(items) => {
                FieldValue::Array(Arc::new(items.into_iter().map(FieldValue::from).collect()))
            }
            Value::Object(map) => FieldValue::Object(Arc::new(Document::from_json_map(map))),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Document> for FieldValue {
    fn from(value: Document) -> Self {
        FieldValue::Object(Arc::new(value))
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::Array(Arc::new(value))
    }
}

impl From<Vec<Document>> for FieldValue {
    fn from(value: Vec<Document>) -> Self {
        FieldValue::Array(Arc::new(value.into_iter().map(FieldValue::from).collect()))
    }
}
