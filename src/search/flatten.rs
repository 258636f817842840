//! Serving a nested child entity as top-level rows.
//!
//! A [`FlatteningSearch`] wraps an engine over parent documents (genes) and
//! answers as if it searched the child entities inside them (transcripts).
//! Callers name child fields plainly (`biotype`) and parent fields under the
//! top-level name (`genes.name`); queries, outputs, facets and sorts are
//! rewritten for the parent documents, and every parent hit is flattened
//! into one row per child.

use log::debug;

use crate::document::Document;
use crate::error::{GeneSearchError, Result};
use crate::output::{QueryOutput, WILDCARD, flatten_with_top_level};
use crate::query::QueryNode;
use crate::schema::FieldInfo;
use crate::search::backend::SearchBackend;
use crate::search::engine::{GeneSearch, QueryRequest};
use crate::search::facet::FacetResults;
use crate::search::result::{QueryResult, SearchResult};

/// Search over child entities nested in the documents of another engine.
#[derive(Debug)]
pub struct FlatteningSearch<B: SearchBackend> {
    search: GeneSearch<B>,
    /// Path of the child array, e.g. `transcripts`.
    target: String,
    /// Name under which parent fields appear, e.g. `genes`.
    top_level: String,
}

impl<B: SearchBackend> FlatteningSearch<B> {
    pub fn new<T: Into<String>, L: Into<String>>(search: GeneSearch<B>, target: T, top_level: L) -> Self {
        FlatteningSearch {
            search,
            target: target.into(),
            top_level: top_level.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn top_level(&self) -> &str {
        &self.top_level
    }

    pub fn inner(&self) -> &GeneSearch<B> {
        &self.search
    }

    /// Rewrite queries for the parent documents.
    ///
    /// Queries on the top-level name are promoted to the root; all others
    /// move under the target. Only parents with at least one child match.
    pub fn transform_queries(&self, queries: &[QueryNode]) -> Vec<QueryNode> {
        let mut root = Vec::new();
        let mut target = Vec::new();
        for query in queries.iter().cloned().map(QueryNode::normalized) {
            match query {
                QueryNode::Nested { field, queries } if field == self.top_level => root.extend(queries),
                other => target.push(other),
            }
        }
        root.push(QueryNode::nested(self.target.clone(), target));
        root
    }

    /// Rewrite an output selection for the parent documents.
    pub fn transform_output(&self, output: &QueryOutput) -> QueryOutput {
        let mut transformed = QueryOutput::new();
        for path in output.paths() {
            if path == self.top_level {
                transformed.add_path(WILDCARD);
            } else {
                transformed.add_path(&self.transform_name(&path));
            }
        }
        transformed
    }

    /// Rewrite a facet or sort field, keeping a `+`/`-` prefix.
    pub fn transform_field(&self, field: &str) -> String {
        match field.chars().next() {
            Some(sign @ ('+' | '-')) => format!("{sign}{}", self.transform_name(&field[1..])),
            _ => self.transform_name(field),
        }
    }

    fn transform_name(&self, field: &str) -> String {
        match field
            .strip_prefix(self.top_level.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
        {
            Some(parent_field) => parent_field.to_string(),
            None => format!("{}.{field}", self.target),
        }
    }

    /// Map a parent-document field back to its row name.
    pub fn reverse_transform_field(&self, field: &str) -> String {
        match field
            .strip_prefix(self.target.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
        {
            Some(child_field) => child_field.to_string(),
            None => format!("{}.{field}", self.top_level),
        }
    }

    fn flatten_hit(&self, document: &Document) -> Vec<Document> {
        flatten_with_top_level(document, &self.target, &self.top_level)
    }

    /// Retrieve every matching child as a row.
    pub fn fetch(&self, queries: &[QueryNode], output: &QueryOutput) -> Result<SearchResult> {
        let mut results = Vec::new();
        self.fetch_with(queries, output, |row| results.push(row))?;
        Ok(SearchResult::new(self.field_info(output), results))
    }

    /// Stream every matching child row to `consumer`.
    ///
    /// Like [`GeneSearch::fetch_with`], at least one query is required.
    pub fn fetch_with<F>(&self, queries: &[QueryNode], output: &QueryOutput, mut consumer: F) -> Result<()>
    where
        F: FnMut(Document),
    {
        if queries.is_empty() {
            return Err(GeneSearchError::invalid_argument(
                "At least one query must be supplied to fetch",
            ));
        }
        let queries = self.transform_queries(queries);
        let output = self.transform_output(output);
        debug!("Flattening {} into rows of {}", self.target, output);
        self.search.fetch_with(&queries, &output, |document| {
            for row in self.flatten_hit(&document) {
                consumer(row);
            }
        })
    }

    /// Run one page of a query. Offset, limit and the result count refer
    /// to parent documents; each parent contributes all its rows.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResult> {
        let transformed = QueryRequest {
            queries: self.transform_queries(&request.queries),
            output: self.transform_output(&request.output),
            facets: request.facets.iter().map(|f| self.transform_field(f)).collect(),
            offset: request.offset,
            limit: request.limit,
            sorts: request.sorts.iter().map(|s| self.transform_field(s)).collect(),
        };
        let result = self.search.query(&transformed)?;
        let facets: FacetResults = result
            .facets
            .into_iter()
            .map(|(field, counts)| (self.reverse_transform_field(&field), counts))
            .collect();
        Ok(QueryResult {
            result_count: result.result_count,
            offset: result.offset,
            limit: result.limit,
            fields: self.field_info(&request.output),
            results: result.results.iter().flat_map(|d| self.flatten_hit(d)).collect(),
            facets,
        })
    }

    /// Describe the row fields selected by `output`, named as in the rows.
    pub fn field_info(&self, output: &QueryOutput) -> Vec<FieldInfo> {
        self.search.field_info(output)
    }
}
