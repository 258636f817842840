//! Documents returned by search backends.
//!
//! This module provides the document structure handed back by backends and
//! produced by the output filters and the remodeller, the [`FieldValue`] type
//! for its values, and converters for loading documents from JSON and JSONL
//! files.

pub mod converter;
#[allow(clippy::module_inception)]
pub mod document;
pub mod field_value;

// Re-export commonly used types
pub use converter::load_documents;
pub use document::{Document, DocumentBuilder};
pub use field_value::FieldValue;
