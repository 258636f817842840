//! Field descriptions for data type catalogs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GeneSearchError, Result};

/// Semantic type of a field, as recorded in a data type catalog.
///
/// The type decides how a query value supplied for the field is interpreted
/// by the type-aware query handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    /// Document identifier.
    Id,
    /// Exact-match keyword.
    Term,
    /// Free text.
    Text,
    /// Numeric value supporting comparison expressions.
    Number,
    /// Genomic location (`seq_region`, `start`, `end`, `strand`).
    Location,
    /// Nested sub-document or array of sub-documents.
    Nested,
    /// Keyword drawn from a fixed set of values.
    Enum,
    /// Boolean flag.
    Boolean,
}

impl FieldType {
    /// Canonical upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Id => "ID",
            FieldType::Term => "TERM",
            FieldType::Text => "TEXT",
            FieldType::Number => "NUMBER",
            FieldType::Location => "LOCATION",
            FieldType::Nested => "NESTED",
            FieldType::Enum => "ENUM",
            FieldType::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = GeneSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ID" => Ok(FieldType::Id),
            "TERM" | "STRING" => Ok(FieldType::Term),
            "TEXT" => Ok(FieldType::Text),
            "NUMBER" => Ok(FieldType::Number),
            "LOCATION" => Ok(FieldType::Location),
            "NESTED" => Ok(FieldType::Nested),
            "ENUM" => Ok(FieldType::Enum),
            "BOOLEAN" => Ok(FieldType::Boolean),
            other => Err(GeneSearchError::config(format!("Unknown field type {other}"))),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = GeneSearchError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.name().to_string()
    }
}

/// Description of a single field of a data type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    /// Full dotted name of the field, e.g. `transcripts.biotype`.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,
    /// Human readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Shown in default result listings.
    #[serde(default)]
    pub display: bool,
    /// Can be used as a facet.
    #[serde(default)]
    pub facet: bool,
    /// Can be searched on.
    #[serde(default)]
    pub search: bool,
    /// Can be sorted on.
    #[serde(default)]
    pub sort: bool,
    /// Allowed values for `ENUM` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

fn default_field_type() -> FieldType {
    FieldType::Text
}

impl FieldInfo {
    /// Create a field description with all flags cleared.
    pub fn new<S: Into<String>>(name: S, field_type: FieldType) -> Self {
        FieldInfo {
            name: name.into(),
            field_type,
            display_name: None,
            display: false,
            facet: false,
            search: false,
            sort: false,
            values: None,
        }
    }

    /// Set the display name.
    pub fn with_display_name<S: Into<String>>(mut self, display_name: S) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Mark the field as facetable.
    pub fn facetable(mut self) -> Self {
        self.facet = true;
        self
    }

    /// Mark the field as searchable.
    pub fn searchable(mut self) -> Self {
        self.search = true;
        self
    }

    /// Mark the field as sortable.
    pub fn sortable(mut self) -> Self {
        self.sort = true;
        self
    }

    /// Mark the field as displayed by default.
    pub fn displayed(mut self) -> Self {
        self.display = true;
        self
    }

    /// Copy this description under a parent path, e.g. `id` under
    /// `transcripts` becomes `transcripts.id`.
    pub fn under(&self, path: &str) -> FieldInfo {
        let mut info = self.clone();
        info.name = format!("{path}.{}", self.name);
        if info.field_type != FieldType::Enum {
            info.values = None;
        }
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parsing() {
        assert_eq!("term".parse::<FieldType>().unwrap(), FieldType::Term);
        assert_eq!("NUMBER".parse::<FieldType>().unwrap(), FieldType::Number);
        assert!("GEO".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_field_info_deserialize() {
        let info: FieldInfo = serde_json::from_str(
            r#"{"name": "biotype", "type": "TERM", "displayName": "Biotype", "facet": true}"#,
        )
        .unwrap();
        assert_eq!(info.field_type, FieldType::Term);
        assert_eq!(info.display_name.as_deref(), Some("Biotype"));
        assert!(info.facet);
        assert!(!info.sort);
    }

    #[test]
    fn test_field_info_defaults_to_text() {
        let info: FieldInfo = serde_json::from_str(r#"{"name": "description"}"#).unwrap();
        assert_eq!(info.field_type, FieldType::Text);
    }

    #[test]
    fn test_under() {
        let info = FieldInfo::new("id", FieldType::Id).facetable();
        let nested = info.under("transcripts");
        assert_eq!(nested.name, "transcripts.id");
        assert!(nested.facet);
    }
}
