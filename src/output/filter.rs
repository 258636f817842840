//! Pruning documents down to an output selection.

use std::sync::Arc;

use crate::document::{Document, FieldValue};
use crate::error::{GeneSearchError, Result};
use crate::output::query_output::{QueryOutput, WILDCARD};

/// Prune `document` to the fields selected by `output`.
///
/// Sub-documents and arrays of sub-documents are pruned recursively when a
/// descendant is specifically selected; sub-documents left empty are
/// dropped, while selected empty arrays are kept. An empty or top-level
/// wildcard selection keeps everything.
pub fn filter_fields(document: &Document, output: &QueryOutput) -> Document {
    if output.is_empty() || output.is_wild() {
        return document.clone();
    }
    filter_level(document, output, None)
}

fn filter_level(document: &Document, output: &QueryOutput, parent: Option<&str>) -> Document {
    let mut filtered = Document::new();
    for (key, value) in document.iter() {
        let path = match parent {
            Some(parent) => format!("{parent}.{key}"),
            None => key.clone(),
        };
        let kept = match value {
            FieldValue::Object(sub) if output.contains_path_children(&path) => {
                let sub = filter_level(sub, output, Some(&path));
                (!sub.is_empty()).then(|| FieldValue::Object(Arc::new(sub)))
            }
            FieldValue::Array(items)
                if items.first().is_some_and(|item| item.as_object().is_some())
                    && output.contains_path_children(&path) =>
            {
                let items: Vec<FieldValue> = items
                    .iter()
                    .filter_map(|item| match item {
                        FieldValue::Object(sub) => {
                            let sub = filter_level(sub, output, Some(&path));
                            (!sub.is_empty()).then(|| FieldValue::Object(Arc::new(sub)))
                        }
                        other => Some(other.clone()),
                    })
                    .collect();
                (!items.is_empty()).then(|| FieldValue::Array(Arc::new(items)))
            }
            value if output.contains_path(&path) => Some(value.clone()),
            _ => None,
        };
        if let Some(value) = kept {
            filtered.add_field(key.clone(), value);
        }
    }
    filtered
}

/// Prune `document` to `output`, failing if a requested field is missing.
///
/// Every selected path must be present in the raw document. A path leading
/// into an empty array counts as present, and a trailing `*` only requires
/// its parent.
pub fn project(document: &Document, output: &QueryOutput) -> Result<Document> {
    if !output.is_empty() && !output.is_wild() {
        for path in output.paths() {
            let path = path
                .strip_suffix(WILDCARD)
                .map(|p| p.trim_end_matches('.'))
                .unwrap_or(&path);
            if !path.is_empty() && !path_present(document, path) {
                return Err(GeneSearchError::field_not_found(path));
            }
        }
    }
    Ok(filter_fields(document, output))
}

fn path_present(document: &Document, path: &str) -> bool {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    match (document.get_field(head), rest) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(FieldValue::Object(sub)), Some(rest)) => path_present(sub, rest),
        (Some(FieldValue::Array(items)), Some(rest)) => {
            items.is_empty()
                || items
                    .iter()
                    .any(|item| item.as_object().is_some_and(|sub| path_present(sub, rest)))
        }
        (Some(_), Some(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gene() -> Document {
        Document::from_json(json!({
            "id": "G1",
            "name": "BRCA2",
            "biotype": "protein_coding",
            "xrefs": {"uniprot": "P51587", "hgnc": "HGNC:1101"},
            "transcripts": [
                {"id": "T1", "biotype": "protein_coding", "translations": [{"id": "P1", "length": 10}]},
                {"id": "T2", "biotype": "lncRNA", "translations": []}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_top_level_fields() {
        let filtered = filter_fields(&gene(), &QueryOutput::of(["id", "name"]));
        assert_eq!(filtered.to_json(), json!({"id": "G1", "name": "BRCA2"}));
    }

    #[test]
    fn test_nested_selection() {
        let output = QueryOutput::build(r#"["id", {"transcripts": ["id", {"translations": ["id"]}]}]"#)
            .unwrap();
        let filtered = filter_fields(&gene(), &output);
        assert_eq!(
            filtered.to_json(),
            json!({
                "id": "G1",
                "transcripts": [
                    {"id": "T1", "translations": [{"id": "P1"}]},
                    {"id": "T2", "translations": []}
                ]
            })
        );
    }

    #[test]
    fn test_whole_sub_document() {
        let filtered = filter_fields(&gene(), &QueryOutput::of(["xrefs"]));
        assert_eq!(
            filtered.to_json(),
            json!({"xrefs": {"uniprot": "P51587", "hgnc": "HGNC:1101"}})
        );
        let filtered = filter_fields(&gene(), &QueryOutput::of(["xrefs.hgnc"]));
        assert_eq!(filtered.to_json(), json!({"xrefs": {"hgnc": "HGNC:1101"}}));
    }

    #[test]
    fn test_wild_and_empty_keep_everything() {
        assert_eq!(filter_fields(&gene(), &QueryOutput::of(["*"])), gene());
        assert_eq!(filter_fields(&gene(), &QueryOutput::new()), gene());
    }

    #[test]
    fn test_nested_wildcard() {
        let filtered = filter_fields(&gene(), &QueryOutput::of(["id", "xrefs.*"]));
        assert_eq!(
            filtered.to_json(),
            json!({"id": "G1", "xrefs": {"uniprot": "P51587", "hgnc": "HGNC:1101"}})
        );
    }

    #[test]
    fn test_project_is_strict() {
        let err = project(&gene(), &QueryOutput::of(["id", "description"])).unwrap_err();
        assert!(matches!(err, GeneSearchError::FieldNotFound(ref f) if f == "description"));
        assert!(project(&gene(), &QueryOutput::of(["transcripts.version"])).is_err());
        assert!(project(&gene(), &QueryOutput::of(["transcripts.translations.length"])).is_ok());
        assert!(project(&gene(), &QueryOutput::of(["xrefs.*"])).is_ok());
        assert!(project(&gene(), &QueryOutput::of(["*"])).is_ok());
    }
}
