//! Data type catalogs.
//!
//! A [`DataTypeInfo`] lists the fields of one searchable entity type (genes,
//! transcripts, variants, ...) together with their semantic types. It is
//! loaded once, shared behind an `Arc`, and only ever read afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GeneSearchError, Result};
use crate::schema::field::{FieldInfo, FieldType};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDataTypeInfo {
    name: String,
    #[serde(default)]
    field_info: Vec<FieldInfo>,
    #[serde(default)]
    targets: Vec<String>,
}

/// The field catalog of one data type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RawDataTypeInfo", rename_all = "camelCase")]
pub struct DataTypeInfo {
    name: String,
    field_info: Vec<FieldInfo>,
    targets: Vec<String>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl From<RawDataTypeInfo> for DataTypeInfo {
    fn from(raw: RawDataTypeInfo) -> Self {
        let mut info = DataTypeInfo {
            name: raw.name,
            field_info: raw.field_info,
            targets: raw.targets,
            by_name: HashMap::new(),
        };
        info.reindex();
        info
    }
}

impl DataTypeInfo {
    /// Create an empty catalog.
    pub fn new<S: Into<String>>(name: S) -> Self {
        DataTypeInfo {
            name: name.into(),
            field_info: Vec::new(),
            targets: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Parse a catalog from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            GeneSearchError::config(format!("Could not parse data type from JSON string: {e}"))
        })
    }

    /// Load a catalog from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            GeneSearchError::config(format!(
                "Could not read data type from {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    fn reindex(&mut self) {
        self.by_name = self
            .field_info
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
    }

    /// Name of the data type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields.
    pub fn field_info(&self) -> &[FieldInfo] {
        &self.field_info
    }

    /// Names of data types this one can be joined to.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Add a field, replacing any field with the same name.
    pub fn add_field(mut self, info: FieldInfo) -> Self {
        match self.by_name.get(&info.name) {
            Some(&i) => self.field_info[i] = info,
            None => {
                self.by_name.insert(info.name.clone(), self.field_info.len());
                self.field_info.push(info);
            }
        }
        self
    }

    /// Add a field by name and type.
    pub fn with_field<S: Into<String>>(self, name: S, field_type: FieldType) -> Self {
        self.add_field(FieldInfo::new(name, field_type))
    }

    /// Look up a field by its full dotted name.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldInfo> {
        self.by_name.get(name).map(|&i| &self.field_info[i])
    }

    /// Fields of the given type.
    pub fn fields_by_type(&self, field_type: FieldType) -> Vec<&FieldInfo> {
        self.field_info
            .iter()
            .filter(|f| f.field_type == field_type)
            .collect()
    }

    /// Fields that can be used as facets.
    pub fn facetable_fields(&self) -> Vec<&FieldInfo> {
        self.field_info.iter().filter(|f| f.facet).collect()
    }

    /// Fields shown by default.
    pub fn display_fields(&self) -> Vec<&FieldInfo> {
        self.field_info.iter().filter(|f| f.display).collect()
    }

    /// Fields that can be searched.
    pub fn search_fields(&self) -> Vec<&FieldInfo> {
        self.field_info.iter().filter(|f| f.search).collect()
    }

    /// Fields that can be sorted on.
    pub fn sort_fields(&self) -> Vec<&FieldInfo> {
        self.field_info.iter().filter(|f| f.sort).collect()
    }

    /// The first field typed as an identifier.
    pub fn id_field(&self) -> Option<&FieldInfo> {
        self.field_info.iter().find(|f| f.field_type == FieldType::Id)
    }

    /// Resolve a requested output name to field descriptions.
    ///
    /// An exact match wins; otherwise a `*` in the name matches every field
    /// sharing the text before it (`*` alone matches everything).
    pub fn info_for_field_name(&self, field_name: &str) -> Vec<&FieldInfo> {
        if let Some(info) = self.field_by_name(field_name) {
            return vec![info];
        }
        match field_name.find('*') {
            Some(0) if field_name.len() == 1 => self.field_info.iter().collect(),
            Some(star) => {
                let prefix = &field_name[..star];
                self.field_info
                    .iter()
                    .filter(|f| f.name.starts_with(prefix))
                    .collect()
            }
            None => Vec::new(),
        }
    }
}
