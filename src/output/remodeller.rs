//! Reshaping result documents.
//!
//! [`flatten`] denormalizes array-valued fields into one row per element, so
//! that, for example, a gene with three transcripts becomes three rows
//! carrying the gene fields plus `transcripts.*` fields.
//!
//! # Examples
//!
//! ```
//! use genesearch::document::Document;
//! use genesearch::output::flatten;
//! use serde_json::json;
//!
//! let doc = Document::from_json(json!({"a": "1", "b": [{"c": "1"}, {"c": "2"}]})).unwrap();
//! let rows = flatten(vec![doc], "b");
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1].to_json(), json!({"a": "1", "b.c": "2"}));
//! ```

use std::sync::Arc;

use crate::document::{Document, FieldValue};

/// Copy `document`, dropping every key named in `exclude` at any depth.
///
/// Sub-documents and arrays holding no excluded key are shared with the
/// source rather than copied.
pub fn clone_object<S: AsRef<str>>(document: &Document, exclude: &[S]) -> Document {
    document
        .iter()
        .filter(|(key, _)| !is_excluded(key, exclude))
        .map(|(key, value)| (key.clone(), clone_value(value, exclude)))
        .collect()
}

fn is_excluded<S: AsRef<str>>(key: &str, exclude: &[S]) -> bool {
    exclude.iter().any(|e| e.as_ref() == key)
}

fn clone_value<S: AsRef<str>>(value: &FieldValue, exclude: &[S]) -> FieldValue {
    if !holds_excluded(value, exclude) {
        return value.clone();
    }
    match value {
        FieldValue::Object(sub) => FieldValue::Object(Arc::new(clone_object(sub, exclude))),
        FieldValue::Array(items) => FieldValue::Array(Arc::new(
            items.iter().map(|item| clone_value(item, exclude)).collect(),
        )),
        other => other.clone(),
    }
}

fn holds_excluded<S: AsRef<str>>(value: &FieldValue, exclude: &[S]) -> bool {
    match value {
        FieldValue::Object(sub) => sub
            .iter()
            .any(|(key, value)| is_excluded(key, exclude) || holds_excluded(value, exclude)),
        FieldValue::Array(items) => items.iter().any(|item| holds_excluded(item, exclude)),
        _ => false,
    }
}

/// Flatten `documents` along the dotted `target_path`.
///
/// Each segment extends the current key (`b`, then `b.d`, ...). A document
/// whose value at the current key is an array yields one row per element:
/// the document minus that key, plus the element's fields under
/// `key.field`. Other documents pass through unchanged. An empty path is
/// the identity.
pub fn flatten(documents: Vec<Document>, target_path: &str) -> Vec<Document> {
    let mut current = documents;
    let mut prefix = String::new();
    for segment in target_path.split('.').filter(|s| !s.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('.');
        }
        prefix.push_str(segment);

        let mut next = Vec::with_capacity(current.len());
        for document in current {
            match document.get_field(&prefix) {
                Some(FieldValue::Array(items)) => {
                    for item in items.iter() {
                        let mut row = clone_object(&document, &[prefix.as_str()]);
                        match item {
                            FieldValue::Object(child) => {
                                for (key, value) in child.iter() {
                                    row.add_field(format!("{prefix}.{key}"), value.clone());
                                }
                            }
                            scalar => row.add_field(prefix.clone(), scalar.clone()),
                        }
                        next.push(row);
                    }
                }
                _ => next.push(document),
            }
        }
        current = next;
    }
    current
}

/// Flatten one document so that the target entity becomes the row.
///
/// Keys under `target_path` lose that prefix (`transcripts.id` → `id`) and
/// every other key is moved under `top_level` (`id` → `genes.id`).
pub fn flatten_with_top_level(document: &Document, target_path: &str, top_level: &str) -> Vec<Document> {
    let prefix = format!("{target_path}.");
    flatten(vec![document.clone()], target_path)
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(key, value)| match key.strip_prefix(&prefix) {
                    Some(stripped) => (stripped.to_string(), value),
                    None => (format!("{top_level}.{key}"), value),
                })
                .collect()
        })
        .collect()
}
