//! In-process backend evaluating Elasticsearch-style queries.
//!
//! [`MemoryBackend`] holds documents in memory and executes the
//! [`ElasticQuery`] trees produced by [`ElasticQueryCompiler`], giving the
//! engine a complete backend for tests, benchmarks and the command line.
//!
//! # Examples
//!
//! ```
//! use genesearch::document::Document;
//! use genesearch::query::QueryNode;
//! use genesearch::search::{MemoryBackend, SearchBackend};
//! use serde_json::json;
//!
//! let backend = MemoryBackend::new();
//! backend.add_document(Document::from_json(json!({"id": "G1", "biotype": "lncRNA"})).unwrap());
//! backend.add_document(Document::from_json(json!({"id": "G2", "biotype": "miRNA"})).unwrap());
//!
//! let query = backend.compile(&[QueryNode::term("biotype", ["miRNA"])]).unwrap();
//! let page = backend.search(&query, &[], 0, 10, &[]).unwrap();
//! assert_eq!(page.total, 1);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, trace};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use crate::document::{Document, FieldValue};
use crate::error::{GeneSearchError, Result};
use crate::output::{QueryOutput, filter_fields};
use crate::query::{ElasticQuery, ElasticQueryCompiler, QueryCompiler, QueryNode};
use crate::search::backend::{Page, ScrollBatch, SearchBackend};
use crate::search::facet::{FacetCollector, FacetCount};
use crate::search::sort::{SortField, compare_documents};

/// Documents left to hand out for an open scroll.
#[derive(Debug)]
struct Scroll {
    remaining: VecDeque<Document>,
    batch_size: usize,
}

/// A [`SearchBackend`] over documents held in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    documents: RwLock<Vec<Arc<Document>>>,
    scrolls: Mutex<AHashMap<String, Scroll>>,
    compiler: ElasticQueryCompiler,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            documents: RwLock::new(Vec::new()),
            scrolls: Mutex::new(AHashMap::new()),
            compiler: ElasticQueryCompiler::new(),
        }
    }

    /// Create a backend holding `documents`.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let backend = MemoryBackend::new();
        backend.add_documents(documents);
        backend
    }

    /// Use `id_field` for identifier lookups.
    pub fn with_id_field<S: Into<String>>(mut self, id_field: S) -> Self {
        self.compiler = self.compiler.with_id_field(id_field);
        self
    }

    pub fn id_field(&self) -> &str {
        self.compiler.id_field()
    }

    pub fn add_document(&self, document: Document) {
        self.documents.write().push(Arc::new(document));
    }

    pub fn add_documents(&self, documents: Vec<Document>) {
        let mut store = self.documents.write();
        store.extend(documents.into_iter().map(Arc::new));
        debug!("Memory backend holds {} documents", store.len());
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Number of scrolls not yet exhausted.
    pub fn open_scrolls(&self) -> usize {
        self.scrolls.lock().len()
    }

    /// Whether `document` satisfies `query`.
    pub fn matches(&self, query: &ElasticQuery, document: &Document) -> bool {
        Evaluator {
            id_field: self.compiler.id_field(),
        }
        .matches(query, document, document, "")
    }

    /// All matching documents, in insertion order.
    fn find(&self, query: &ElasticQuery) -> Vec<Arc<Document>> {
        let documents = self.documents.read();
        let hits: Vec<Arc<Document>> = documents
            .par_iter()
            .filter(|document| self.matches(query, document))
            .cloned()
            .collect();
        trace!("{} of {} documents match", hits.len(), documents.len());
        hits
    }

    fn next_batch(&self, mut scroll: Scroll, scroll_id: String) -> ScrollBatch {
        let take = scroll.batch_size.min(scroll.remaining.len());
        let documents: Vec<Document> = scroll.remaining.drain(..take).collect();
        if scroll.remaining.is_empty() {
            trace!("Scroll {scroll_id} exhausted");
            return ScrollBatch {
                documents,
                scroll_id: None,
            };
        }
        self.scrolls.lock().insert(scroll_id.clone(), scroll);
        ScrollBatch {
            documents,
            scroll_id: Some(scroll_id),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchBackend for MemoryBackend {
    type Query = ElasticQuery;

    fn compile(&self, queries: &[QueryNode]) -> Result<ElasticQuery> {
        self.compiler.compile(queries)
    }

    fn open_scroll(&self, query: &ElasticQuery, source: &[String], batch_size: usize) -> Result<ScrollBatch> {
        if batch_size == 0 {
            return Err(GeneSearchError::invalid_argument("Scroll batch size must be positive"));
        }
        let source = QueryOutput::of(source);
        let remaining: VecDeque<Document> = self
            .find(query)
            .iter()
            .map(|document| filter_fields(document, &source))
            .collect();
        let scroll_id = uuid::Uuid::new_v4().to_string();
        debug!("Opened scroll {scroll_id} over {} documents", remaining.len());
        Ok(self.next_batch(
            Scroll {
                remaining,
                batch_size,
            },
            scroll_id,
        ))
    }

    fn continue_scroll(&self, scroll_id: &str) -> Result<ScrollBatch> {
        let scroll = self
            .scrolls
            .lock()
            .remove(scroll_id)
            .ok_or_else(|| GeneSearchError::backend(format!("Unknown scroll {scroll_id}")))?;
        Ok(self.next_batch(scroll, scroll_id.to_string()))
    }

    fn clear_scroll(&self, scroll_id: &str) -> Result<()> {
        if self.scrolls.lock().remove(scroll_id).is_some() {
            trace!("Scroll {scroll_id} cleared");
        }
        Ok(())
    }

    fn search(
        &self,
        query: &ElasticQuery,
        source: &[String],
        offset: usize,
        limit: usize,
        sorts: &[SortField],
    ) -> Result<Page> {
        let mut hits = self.find(query);
        if !sorts.is_empty() {
            hits.par_sort_by(|a, b| compare_documents(sorts, a, b));
        }
        let source = QueryOutput::of(source);
        let documents = hits
            .iter()
            .skip(offset)
            .take(limit)
            .map(|document| filter_fields(document, &source))
            .collect();
        Ok(Page {
            total: hits.len() as u64,
            documents,
        })
    }

    fn facet_counts(&self, query: &ElasticQuery, field: &str, size: usize) -> Result<Vec<FacetCount>> {
        let mut collector = FacetCollector::new(field);
        for document in self.find(query) {
            collector.collect_doc(&document);
        }
        Ok(collector.finalize(size))
    }
}

/// Evaluates a query against one document.
///
/// `scope` is the object currently being matched: the document itself, or
/// an element of a nested array whose full path is `prefix`.
struct Evaluator<'a> {
    id_field: &'a str,
}

impl Evaluator<'_> {
    fn matches(&self, query: &ElasticQuery, root: &Document, scope: &Document, prefix: &str) -> bool {
        match query {
            ElasticQuery::MatchAll => true,
            ElasticQuery::ConstantScore(inner) => self.matches(inner, root, scope, prefix),
            ElasticQuery::Ids(ids) => root
                .values_at(self.id_field)
                .iter()
                .filter_map(|value| value.to_term_string())
                .any(|id| ids.contains(&id)),
            ElasticQuery::Term { field, value } => values(scope, prefix, field)
                .iter()
                .any(|stored| term_matches(stored, value)),
            ElasticQuery::Terms { field, values: wanted } => values(scope, prefix, field)
                .iter()
                .any(|stored| wanted.iter().any(|value| term_matches(stored, value))),
            ElasticQuery::Range { field, bounds } => values(scope, prefix, field)
                .iter()
                .filter_map(|stored| stored.as_number())
                .any(|n| bounds.contains(n)),
            ElasticQuery::Nested { path, query } => values(scope, prefix, path)
                .iter()
                .filter_map(|item| item.as_object())
                .any(|element| self.matches(query, root, element, path)),
            ElasticQuery::Bool {
                must,
                must_not,
                should,
            } => {
                must.iter().all(|q| self.matches(q, root, scope, prefix))
                    && !must_not.iter().any(|q| self.matches(q, root, scope, prefix))
                    && (should.is_empty()
                        || !must.is_empty()
                        || should.iter().any(|q| self.matches(q, root, scope, prefix)))
            }
        }
    }
}

/// Values at a full dotted `path`, looked up relative to the scope at
/// `prefix`.
fn values<'d>(scope: &'d Document, prefix: &str, path: &str) -> Vec<&'d FieldValue> {
    let relative = if prefix.is_empty() {
        path
    } else {
        path.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(path)
    };
    scope.values_at(relative)
}

fn term_matches(stored: &FieldValue, value: &str) -> bool {
    if stored.to_term_string().is_some_and(|s| s == value) {
        return true;
    }
    match stored {
        FieldValue::Integer(_) | FieldValue::Float(_) => value
            .parse::<f64>()
            .ok()
            .zip(stored.as_number())
            .is_some_and(|(a, b)| a == b),
        _ => false,
    }
}
