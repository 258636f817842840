//! Search configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GeneSearchError, Result};

/// Tunables shared by the search engine and the backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base number of documents fetched per scroll batch, before adjusting
    /// for the size of the requested output.
    pub scroll_size: usize,
    /// Maximum number of buckets returned per facet.
    pub aggregation_size: usize,
    /// Page size used when a query does not give a limit.
    pub default_limit: usize,
    /// Field holding the document identifier.
    pub id_field: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            scroll_size: 1000,
            aggregation_size: 100,
            default_limit: 10,
            id_field: "id".to_string(),
        }
    }
}

impl SearchConfig {
    /// Load a configuration from a JSON file. Missing keys take their
    /// defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            GeneSearchError::config(format!("Could not read config {}: {e}", path.display()))
        })?;
        let config: SearchConfig = serde_json::from_str(&json)
            .map_err(|e| GeneSearchError::config(format!("Could not parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scroll_size == 0 {
            return Err(GeneSearchError::config("scroll_size must be positive"));
        }
        if self.aggregation_size == 0 {
            return Err(GeneSearchError::config("aggregation_size must be positive"));
        }
        if self.id_field.is_empty() {
            return Err(GeneSearchError::config("id_field must not be empty"));
        }
        Ok(())
    }

    pub fn with_scroll_size(mut self, scroll_size: usize) -> Self {
        self.scroll_size = scroll_size;
        self
    }

    pub fn with_aggregation_size(mut self, aggregation_size: usize) -> Self {
        self.aggregation_size = aggregation_size;
        self
    }

    pub fn with_default_limit(mut self, default_limit: usize) -> Self {
        self.default_limit = default_limit;
        self
    }

    pub fn with_id_field<S: Into<String>>(mut self, id_field: S) -> Self {
        self.id_field = id_field.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.scroll_size, 1000);
        assert_eq!(config.aggregation_size, 100);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.id_field, "id");
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"scroll_size": 50, "id_field": "stable_id"}}"#).unwrap();
        file.flush().unwrap();

        let config = SearchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.scroll_size, 50);
        assert_eq!(config.id_field, "stable_id");
        assert_eq!(config.aggregation_size, 100);
    }

    #[test]
    fn test_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"scroll_size": 0}}"#).unwrap();
        file.flush().unwrap();
        assert!(matches!(
            SearchConfig::from_file(file.path()).unwrap_err(),
            GeneSearchError::Config(_)
        ));
        assert!(SearchConfig::from_file("/nonexistent/config.json").is_err());
    }
}
