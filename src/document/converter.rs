//! Document converters for loading documents from files.
//!
//! This module provides a [`DocumentConverter`] trait and implementations for
//! JSON arrays and JSON Lines files. They feed the in-memory backend and the
//! command line tool.
//!
//! # Example
//!
//! ```no_run
//! use genesearch::document::converter::DocumentConverter;
//! use genesearch::document::converter::jsonl::JsonlDocumentConverter;
//!
//! let converter = JsonlDocumentConverter::new();
//! for doc in converter.convert("genes.jsonl").unwrap() {
//!     let doc = doc.unwrap();
//!     println!("Document: {:?}", doc);
//! }
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::document::document::Document;
use crate::error::Result;

pub mod json;
pub mod jsonl;

/// A trait for converting files into document iterators.
pub trait DocumentConverter {
    /// The iterator type that yields documents.
    type Iter: Iterator<Item = Result<Document>>;

    /// Convert a file into an iterator of Documents.
    fn convert<P: AsRef<Path>>(&self, path: P) -> Result<Self::Iter>;
}

/// Load every document from a file, detecting the format from its content.
///
/// A file whose first non-blank character is `[` is read as a JSON array;
/// anything else is read as JSON Lines.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let is_array = loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            break false;
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(pos) => break buf[pos] == b'[',
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    };

    if is_array {
        json::JsonDocumentConverter::new().convert(path)?.collect()
    } else {
        jsonl::JsonlDocumentConverter::new().convert(path)?.collect()
    }
}
