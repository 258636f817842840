//! JSON array document converter.
//!
//! Converts a file holding a JSON array of objects into Documents:
//! ```json
//! [
//!   {"id": "ENSG00000139618", "name": "BRCA2", "transcripts": [{"id": "ENST00000380152"}]},
//!   {"id": "ENSG00000012048", "name": "BRCA1"}
//! ]
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use crate::document::converter::DocumentConverter;
use crate::document::document::Document;
use crate::error::{GeneSearchError, Result};

/// A document converter for JSON array files.
#[derive(Clone, Debug, Default)]
pub struct JsonDocumentConverter;

impl JsonDocumentConverter {
    /// Create a new JSON converter.
    pub fn new() -> Self {
        JsonDocumentConverter
    }

    /// Convert an in-memory JSON string (an array or a single object).
    pub fn convert_str(&self, input: &str) -> Result<Vec<Document>> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| GeneSearchError::invalid_argument(format!("Failed to parse JSON: {e}")))?;
        Self::documents_from_value(value)
    }

    fn documents_from_value(value: Value) -> Result<Vec<Document>> {
        match value {
            Value::Array(items) => items.into_iter().map(Document::from_json).collect(),
            Value::Object(map) => Ok(vec![Document::from_json_map(map)]),
            other => Err(GeneSearchError::invalid_argument(format!(
                "Expected a JSON array of documents, found {other}"
            ))),
        }
    }
}

impl DocumentConverter for JsonDocumentConverter {
    type Iter = std::vec::IntoIter<Result<Document>>;

    fn convert<P: AsRef<Path>>(&self, path: P) -> Result<Self::Iter> {
        let file = File::open(path.as_ref()).map_err(|e| {
            GeneSearchError::invalid_argument(format!("Failed to open JSON file: {e}"))
        })?;
        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        let docs = Self::documents_from_value(value)?;
        Ok(docs.into_iter().map(Ok).collect::<Vec<_>>().into_iter())
    }
}
