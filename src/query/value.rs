//! Query values decoded from JSON.
//!
//! Every value of a query object is decoded exactly once into a
//! [`QueryValue`]; everything downstream pattern-matches on it instead of
//! inspecting raw JSON.

use serde_json::{Map, Value};

use crate::error::{GeneSearchError, Result};

/// A decoded query value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// A single scalar, stringified.
    Scalar(String),
    /// A non-empty list of scalars, stringified.
    List(Vec<String>),
    /// A nested query object, keys in document order.
    Object(Vec<(String, QueryValue)>),
}

impl QueryValue {
    /// Decode a JSON value.
    ///
    /// `null`, empty lists and lists holding anything but scalars are
    /// rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Err(GeneSearchError::query_parse("Null values are not supported in queries")),
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(GeneSearchError::query_parse("Empty lists are not supported in queries"));
                }
                items
                    .iter()
                    .map(|item| {
                        scalar_string(item).ok_or_else(|| {
                            GeneSearchError::query_parse(format!(
                                "Lists in queries may only contain scalars, found {item}"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(QueryValue::List)
            }
            Value::Object(map) => Self::entries_from_json(map).map(QueryValue::Object),
            scalar => scalar_string(scalar)
                .map(QueryValue::Scalar)
                .ok_or_else(|| GeneSearchError::query_parse(format!("Unsupported query value {scalar}"))),
        }
    }

    /// Decode every entry of a JSON object.
    pub fn entries_from_json(map: &Map<String, Value>) -> Result<Vec<(String, QueryValue)>> {
        map.iter()
            .map(|(key, value)| {
                QueryValue::from_json(value)
                    .map_err(|e| match e {
                        GeneSearchError::QueryParse(msg) => {
                            GeneSearchError::query_parse(format!("{msg} (field {key})"))
                        }
                        other => other,
                    })
                    .map(|v| (key.clone(), v))
            })
            .collect()
    }

    /// The scalar string, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            QueryValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The entries, if this is an object.
    pub fn as_object(&self) -> Option<&[(String, QueryValue)]> {
        match self {
            QueryValue::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, QueryValue::Object(_))
    }

    /// Leaf values: one for a scalar, all for a list, none for an object.
    pub fn values(&self) -> Vec<String> {
        match self {
            QueryValue::Scalar(s) => vec![s.clone()],
            QueryValue::List(values) => values.clone(),
            QueryValue::Object(_) => Vec::new(),
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Merge sibling keys that share a dotted stem into one nested object.
///
/// `{"a.b": 1, "a.c": 2}` becomes `{"a": {"b": 1, "c": 2}}`, a lone
/// `{"a.b": 1}` becomes `{"a": {"b": 1}}`, and dotted keys are folded into an
/// existing `{"a": {...}}` sibling. A `!` prefix stays on the stem, so
/// `"!a.b"` negates the whole `a` scope. Applied recursively.
pub fn merge_dotted_keys(entries: Vec<(String, QueryValue)>) -> Vec<(String, QueryValue)> {
    let mut merged: Vec<(String, QueryValue)> = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let (stem, value) = match key.split_once('.') {
            Some((stem, rest)) => (
                stem.to_string(),
                QueryValue::Object(vec![(rest.to_string(), value)]),
            ),
            None => (key, value),
        };
        let existing = merged
            .iter()
            .position(|(k, v)| *k == stem && v.is_object());
        match (existing, value) {
            (Some(i), QueryValue::Object(children)) => {
                if let QueryValue::Object(existing) = &mut merged[i].1 {
                    existing.extend(children);
                }
            }
            (_, value) => merged.push((stem, value)),
        }
    }

    merged
        .into_iter()
        .map(|(key, value)| match value {
            QueryValue::Object(children) => (key, QueryValue::Object(merge_dotted_keys(children))),
            other => (key, other),
        })
        .collect()
}
