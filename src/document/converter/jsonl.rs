//! JSONL format document converter.
//!
//! Converts JSONL (JSON Lines) files into Documents.
//! Each line in the file should be a single JSON object:
//! ```jsonl
//! {"id": "ENSG00000139618", "name": "BRCA2", "start": 32315474}
//! {"id": "ENSG00000012048", "name": "BRCA1", "start": 43044295}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::document::converter::DocumentConverter;
use crate::document::document::Document;
use crate::error::{GeneSearchError, Result};

/// A document converter for JSONL format.
#[derive(Clone, Debug, Default)]
pub struct JsonlDocumentConverter;

impl JsonlDocumentConverter {
    /// Create a new JSONL converter.
    pub fn new() -> Self {
        JsonlDocumentConverter
    }

    /// Parse a single JSON line into a Document.
    fn parse_json_line(line: &str, line_number: usize) -> Result<Document> {
        let value = serde_json::from_str(line).map_err(|e| {
            GeneSearchError::invalid_argument(format!(
                "Failed to parse JSON on line {line_number}: {e}"
            ))
        })?;
        Document::from_json(value)
    }
}

/// Iterator over JSONL documents.
pub struct JsonlDocumentIterator {
    reader: BufReader<File>,
    line_number: usize,
}

impl Iterator for JsonlDocumentIterator {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_number += 1;
            match self.reader.read_line(&mut line) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue; // Skip empty lines
                    }
                    return Some(JsonlDocumentConverter::parse_json_line(
                        line,
                        self.line_number,
                    ));
                }
                Err(e) => return Some(Err(GeneSearchError::from(e))),
            }
        }
    }
}

impl DocumentConverter for JsonlDocumentConverter {
    type Iter = JsonlDocumentIterator;

    fn convert<P: AsRef<Path>>(&self, path: P) -> Result<Self::Iter> {
        let file = File::open(path.as_ref()).map_err(|e| {
            GeneSearchError::invalid_argument(format!("Failed to open JSONL file: {e}"))
        })?;

        Ok(JsonlDocumentIterator {
            reader: BufReader::new(file),
            line_number: 0,
        })
    }
}
