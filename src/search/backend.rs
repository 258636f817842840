//! The contract between the search engine and a storage backend.

use std::fmt::Debug;

use crate::document::Document;
use crate::error::Result;
use crate::query::QueryNode;
use crate::search::facet::FacetCount;
use crate::search::sort::SortField;

/// One batch of a scroll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollBatch {
    pub documents: Vec<Document>,
    /// Token for the next batch, `None` once the results are exhausted.
    pub scroll_id: Option<String>,
}

impl ScrollBatch {
    pub fn is_last(&self) -> bool {
        self.scroll_id.is_none()
    }
}

/// One page of hits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Total number of matching documents.
    pub total: u64,
    pub documents: Vec<Document>,
}

/// A store that can execute compiled queries.
///
/// `source` lists the dotted field paths to return; an empty list returns
/// whole documents.
pub trait SearchBackend: Send + Sync {
    /// The backend's native query.
    type Query: Debug + Send + Sync;

    /// Compile query trees into the native query.
    fn compile(&self, queries: &[QueryNode]) -> Result<Self::Query>;

    /// Start a scroll over all matching documents.
    fn open_scroll(&self, query: &Self::Query, source: &[String], batch_size: usize) -> Result<ScrollBatch>;

    /// Fetch the batch following a scroll token.
    fn continue_scroll(&self, scroll_id: &str) -> Result<ScrollBatch>;

    /// Release a scroll that will not be read to the end. Unknown or
    /// exhausted tokens are ignored.
    fn clear_scroll(&self, scroll_id: &str) -> Result<()>;

    /// Fetch one sorted page of matching documents.
    fn search(
        &self,
        query: &Self::Query,
        source: &[String],
        offset: usize,
        limit: usize,
        sorts: &[SortField],
    ) -> Result<Page>;

    /// Count matching documents per value of `field`.
    fn facet_counts(&self, query: &Self::Query, field: &str, size: usize) -> Result<Vec<FacetCount>>;
}
