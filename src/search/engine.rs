//! Search engine façade over a [`SearchBackend`].
//!
//! [`GeneSearch`] turns query trees and an output selection into backend
//! calls and shapes what comes back: whole result sets are drained through
//! scrolls, pages carry facet counts, and every returned document is
//! projected onto the requested output.
//!
//! # Examples
//!
//! ```
//! use genesearch::document::Document;
//! use genesearch::output::QueryOutput;
//! use genesearch::query::QueryNode;
//! use genesearch::search::{GeneSearch, MemoryBackend, QueryRequest};
//! use serde_json::json;
//!
//! let backend = MemoryBackend::with_documents(vec![
//!     Document::from_json(json!({"id": "G1", "biotype": "lncRNA"})).unwrap(),
//!     Document::from_json(json!({"id": "G2", "biotype": "miRNA"})).unwrap(),
//! ]);
//! let search = GeneSearch::new(backend);
//!
//! let request = QueryRequest::new(vec![QueryNode::term("biotype", ["miRNA"])])
//!     .with_output(QueryOutput::of(["id"]))
//!     .with_facets(vec!["biotype".to_string()]);
//! let result = search.query(&request).unwrap();
//! assert_eq!(result.result_count, 1);
//! assert_eq!(result.results[0].to_json(), json!({"id": "G2"}));
//! ```

use std::sync::Arc;

use ahash::AHashSet;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::SearchConfig;
use crate::document::Document;
use crate::error::{GeneSearchError, Result};
use crate::output::{QueryOutput, WILDCARD, project};
use crate::query::QueryNode;
use crate::schema::{DataTypeInfo, FieldInfo};
use crate::search::backend::{ScrollBatch, SearchBackend};
use crate::search::facet::{FacetResults, facet_map};
use crate::search::result::{QueryResult, SearchResult};
use crate::search::sort::SortField;

/// Scroll factor weight of a `*` output field.
const WILDCARD_WEIGHT: f64 = 50.0;
/// Scroll factor weight of a named output field.
const FIELD_WEIGHT: f64 = 0.1;
const MIN_SCROLL_FACTOR: f64 = 0.1;
const MAX_SCROLL_FACTOR: f64 = 50.0;

/// A paginated query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub queries: Vec<QueryNode>,
    pub output: QueryOutput,
    pub facets: Vec<String>,
    pub offset: usize,
    /// Page size; the configured default when unset.
    pub limit: Option<usize>,
    /// Sort directives, `name`, `+name` or `-name`.
    pub sorts: Vec<String>,
}

impl QueryRequest {
    pub fn new(queries: Vec<QueryNode>) -> Self {
        QueryRequest {
            queries,
            ..Default::default()
        }
    }

    pub fn with_output(mut self, output: QueryOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_facets(mut self, facets: Vec<String>) -> Self {
        self.facets = facets;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sorts(mut self, sorts: Vec<String>) -> Self {
        self.sorts = sorts;
        self
    }
}

/// Search engine generic over the backend that stores the documents.
#[derive(Debug)]
pub struct GeneSearch<B: SearchBackend> {
    backend: B,
    config: SearchConfig,
    info: Option<Arc<DataTypeInfo>>,
}

impl<B: SearchBackend> GeneSearch<B> {
    pub fn new(backend: B) -> Self {
        GeneSearch {
            backend,
            config: SearchConfig::default(),
            info: None,
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Describe result fields using `info`.
    pub fn with_data_type_info(mut self, info: Arc<DataTypeInfo>) -> Self {
        self.info = Some(info);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn data_type_info(&self) -> Option<&Arc<DataTypeInfo>> {
        self.info.as_ref()
    }

    /// Scroll batch size for an output selection.
    ///
    /// The more that is retrieved per document, the fewer documents are
    /// fetched per batch: each `*` adds 50 to a factor and each named field
    /// 0.1, and the configured scroll size is divided by the clamped factor.
    pub fn scroll_size_for(&self, output: &QueryOutput) -> usize {
        let (wild, named) = output.count_fields();
        let factor = (wild as f64 * WILDCARD_WEIGHT + named as f64 * FIELD_WEIGHT)
            .clamp(MIN_SCROLL_FACTOR, MAX_SCROLL_FACTOR);
        ((self.config.scroll_size as f64 / factor) as usize).max(1)
    }

    /// Retrieve every document matching `queries`.
    pub fn fetch(&self, queries: &[QueryNode], output: &QueryOutput) -> Result<SearchResult> {
        let mut results = Vec::new();
        self.fetch_with(queries, output, |document| results.push(document))?;
        Ok(SearchResult::new(self.field_info(output), results))
    }

    /// Stream every document matching `queries` to `consumer`.
    ///
    /// A lone term query listing more values than fit in one scroll batch is
    /// run piecemeal, one batch-sized chunk of values at a time.
    pub fn fetch_with<F>(&self, queries: &[QueryNode], output: &QueryOutput, mut consumer: F) -> Result<()>
    where
        F: FnMut(Document),
    {
        if queries.is_empty() {
            return Err(GeneSearchError::invalid_argument(
                "At least one query must be supplied to fetch",
            ));
        }
        let batch_size = self.scroll_size_for(output);
        debug!("Using scroll size {batch_size}");

        if let [QueryNode::Term { field, values }] = queries
            && values.len() > batch_size
        {
            for chunk in values.chunks(batch_size) {
                info!("Querying {}/{} values of {field}", chunk.len(), values.len());
                let query = QueryNode::term(field.clone(), chunk.iter().cloned());
                self.scroll(&[query], output, batch_size, &mut consumer)?;
            }
            return Ok(());
        }
        self.scroll(queries, output, batch_size, &mut consumer)
    }

    fn scroll<F>(&self, queries: &[QueryNode], output: &QueryOutput, batch_size: usize, consumer: &mut F) -> Result<()>
    where
        F: FnMut(Document),
    {
        let query = self.backend.compile(queries)?;
        debug!("Fetch query {query:?}");
        let source = output.paths();
        let mut batch = self.backend.open_scroll(&query, &source, batch_size)?;
        let mut retrieved = 0;
        loop {
            let ScrollBatch {
                documents,
                scroll_id,
            } = batch;
            retrieved += documents.len();
            let projected = match self.project_all(documents, output) {
                Ok(projected) => projected,
                Err(err) => {
                    if let Some(scroll_id) = &scroll_id {
                        self.release_scroll(scroll_id);
                    }
                    return Err(err);
                }
            };
            for document in projected {
                consumer(document);
            }
            match scroll_id {
                Some(scroll_id) => batch = self.backend.continue_scroll(&scroll_id)?,
                None => break,
            }
        }
        info!("Retrieved {retrieved} documents");
        Ok(())
    }

    fn release_scroll(&self, scroll_id: &str) {
        debug!("Clearing scroll {scroll_id}");
        if let Err(err) = self.backend.clear_scroll(scroll_id) {
            warn!("Failed to clear scroll {scroll_id}: {err}");
        }
    }

    /// Project a batch onto `output`, preserving hit order.
    fn project_all(&self, documents: Vec<Document>, output: &QueryOutput) -> Result<Vec<Document>> {
        documents
            .par_iter()
            .map(|document| project(document, output))
            .collect()
    }

    /// Retrieve the documents with the given identifiers.
    pub fn fetch_by_ids<S: AsRef<str>>(&self, ids: &[S], output: &QueryOutput) -> Result<SearchResult> {
        if ids.is_empty() {
            return Ok(SearchResult::new(self.field_info(output), Vec::new()));
        }
        let query = QueryNode::term(
            self.config.id_field.clone(),
            ids.iter().map(|id| id.as_ref().to_string()),
        );
        self.fetch(&[query], output)
    }

    /// Retrieve one document by identifier.
    pub fn fetch_by_id(&self, id: &str, output: &QueryOutput) -> Result<Option<Document>> {
        Ok(self.fetch_by_ids(&[id], output)?.results.into_iter().next())
    }

    /// Describe the fields selected by `output`.
    ///
    /// Paths are resolved against the data type's catalog, a trailing `*`
    /// matching by prefix; the catalog's identifier field comes first. With
    /// no catalog nothing is described.
    pub fn field_info(&self, output: &QueryOutput) -> Vec<FieldInfo> {
        let Some(info) = &self.info else {
            return Vec::new();
        };
        let paths = if output.is_empty() {
            vec![WILDCARD.to_string()]
        } else {
            output.paths()
        };
        let mut seen = AHashSet::new();
        let mut fields = Vec::new();
        let candidates = info
            .id_field()
            .into_iter()
            .chain(paths.iter().flat_map(|path| info.info_for_field_name(path)));
        for field in candidates {
            if seen.insert(field.name.clone()) {
                fields.push(field.clone());
            }
        }
        fields
    }

    /// Run one page of a query with facet counts.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResult> {
        let limit = request.limit.unwrap_or(self.config.default_limit);
        let sorts = request
            .sorts
            .iter()
            .map(|sort| SortField::parse(sort))
            .collect::<Result<Vec<_>>>()?;

        let query = self.backend.compile(&request.queries)?;
        info!("Starting query (offset {}, limit {limit})", request.offset);
        debug!("Query {query:?}");

        let page = self
            .backend
            .search(&query, &request.output.paths(), request.offset, limit, &sorts)?;
        info!("Retrieved {}/{}", page.documents.len(), page.total);
        let results = self.project_all(page.documents, &request.output)?;

        let mut facets = FacetResults::new();
        for facet in &request.facets {
            debug!("Counting facet {facet}");
            let buckets = self
                .backend
                .facet_counts(&query, facet, self.config.aggregation_size)?;
            facets.insert(facet.clone(), facet_map(buckets));
        }

        Ok(QueryResult {
            result_count: page.total,
            offset: request.offset,
            limit,
            fields: self.field_info(&request.output),
            results,
            facets,
        })
    }
}
