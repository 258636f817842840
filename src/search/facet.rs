//! Facet counting: how many matching documents carry each value of a field.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::document::Document;

/// One facet bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetCount {
    /// The field value.
    pub value: String,
    /// Number of documents carrying it.
    pub count: u64,
}

impl FacetCount {
    pub fn new<S: Into<String>>(value: S, count: u64) -> Self {
        FacetCount {
            value: value.into(),
            count,
        }
    }
}

/// Facet counts keyed by field, then by value, as reported in results.
pub type FacetResults = BTreeMap<String, BTreeMap<String, u64>>;

/// Accumulates value counts for one (possibly dotted) field.
#[derive(Debug, Clone)]
pub struct FacetCollector {
    field: String,
    counts: AHashMap<String, u64>,
}

impl FacetCollector {
    pub fn new<S: Into<String>>(field: S) -> Self {
        FacetCollector {
            field: field.into(),
            counts: AHashMap::new(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Count a document once for every distinct value it holds at the field.
    pub fn collect_doc(&mut self, document: &Document) {
        let values: AHashSet<String> = document
            .values_at(&self.field)
            .into_iter()
            .filter_map(|value| value.to_term_string())
            .collect();
        for value in values {
            *self.counts.entry(value).or_insert(0) += 1;
        }
    }

    /// The `size` largest buckets, by count descending then value.
    pub fn finalize(self, size: usize) -> Vec<FacetCount> {
        let mut buckets: Vec<FacetCount> = self
            .counts
            .into_iter()
            .map(|(value, count)| FacetCount { value, count })
            .collect();
        buckets.sort_by(compare_buckets);
        buckets.truncate(size);
        buckets
    }
}

fn compare_buckets(a: &FacetCount, b: &FacetCount) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value))
}

/// Buckets as a value → count map.
pub fn facet_map(buckets: Vec<FacetCount>) -> BTreeMap<String, u64> {
    buckets.into_iter().map(|b| (b.value, b.count)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_documents_not_values() {
        let docs = [
            json!({"transcripts": [{"biotype": "a"}, {"biotype": "a"}, {"biotype": "b"}]}),
            json!({"transcripts": [{"biotype": "a"}]}),
            json!({"name": "no transcripts"}),
        ];
        let mut collector = FacetCollector::new("transcripts.biotype");
        for doc in docs {
            collector.collect_doc(&Document::from_json(doc).unwrap());
        }
        assert_eq!(
            collector.finalize(10),
            vec![FacetCount::new("a", 2), FacetCount::new("b", 1)]
        );
    }

    #[test]
    fn test_order_and_truncation() {
        let mut collector = FacetCollector::new("biotype");
        for biotype in ["c", "b", "a", "c"] {
            collector.collect_doc(&Document::from_json(json!({"biotype": biotype})).unwrap());
        }
        let buckets = collector.finalize(2);
        assert_eq!(buckets, vec![FacetCount::new("c", 2), FacetCount::new("a", 1)]);
        assert_eq!(facet_map(buckets).get("c"), Some(&2));
    }
}
