//! Result envelopes.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::schema::FieldInfo;
use crate::search::facet::FacetResults;

/// Documents retrieved by a fetch, with descriptions of the returned fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub fields: Vec<FieldInfo>,
    pub results: Vec<Document>,
}

impl SearchResult {
    pub fn new(fields: Vec<FieldInfo>, results: Vec<Document>) -> Self {
        SearchResult { fields, results }
    }
}

/// One page of a query: `{resultCount, offset, limit, fields, results, facets}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Total number of hits, not just those on this page.
    pub result_count: u64,
    pub offset: usize,
    pub limit: usize,
    pub fields: Vec<FieldInfo>,
    pub results: Vec<Document>,
    pub facets: FacetResults,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_keys() {
        let result = QueryResult {
            result_count: 12,
            offset: 10,
            limit: 2,
            results: vec![Document::from_json(json!({"id": "G1"})).unwrap()],
            ..Default::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "resultCount": 12,
                "offset": 10,
                "limit": 2,
                "fields": [],
                "results": [{"id": "G1"}],
                "facets": {}
            })
        );
    }
}
