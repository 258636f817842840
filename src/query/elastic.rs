//! Elasticsearch query DSL generation.
//!
//! [`ElasticQueryCompiler`] turns query trees into an [`ElasticQuery`], a
//! typed subset of the Elasticsearch query DSL that renders to JSON with
//! [`ElasticQuery::to_json`]. The in-memory backend evaluates the same tree.
//!
//! # Examples
//!
//! ```
//! use genesearch::query::{ElasticQueryCompiler, QueryCompiler, QueryNode};
//! use serde_json::json;
//!
//! let compiler = ElasticQueryCompiler::new();
//! let query = compiler
//!     .compile(&[QueryNode::term("transcripts.biotype", ["lncRNA"])])
//!     .unwrap();
//! assert_eq!(
//!     query.to_json(),
//!     json!({"nested": {
//!         "path": "transcripts",
//!         "query": {"constant_score": {"filter": {"term": {"transcripts.biotype": "lncRNA"}}}}
//!     }})
//! );
//! ```

use log::trace;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::error::{GeneSearchError, Result};
use crate::query::ast::QueryNode;
use crate::query::compiler::{QueryCompiler, extend_path, number_value, qualified_path};
use crate::query::number::NumberExpression;

/// Default identifier field.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Bounds of a range query. Unset bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeBounds {
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
}

impl RangeBounds {
    /// Inclusive bounds.
    pub fn inclusive(lower: Option<f64>, upper: Option<f64>) -> Self {
        RangeBounds {
            gte: lower,
            lte: upper,
            ..Default::default()
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.gt.is_none_or(|b| value > b)
            && self.gte.is_none_or(|b| value >= b)
            && self.lt.is_none_or(|b| value < b)
            && self.lte.is_none_or(|b| value <= b)
    }

    fn to_json(self) -> Value {
        let mut bounds = Map::new();
        for (name, bound) in [("gt", self.gt), ("gte", self.gte), ("lt", self.lt), ("lte", self.lte)] {
            if let Some(bound) = bound {
                bounds.insert(name.to_string(), number_value(bound));
            }
        }
        Value::Object(bounds)
    }
}

/// A compiled Elasticsearch query.
#[derive(Debug, Clone, PartialEq)]
pub enum ElasticQuery {
    MatchAll,
    /// Document identifier lookup.
    Ids(Vec<String>),
    Term { field: String, value: String },
    Terms { field: String, values: Vec<String> },
    Range { field: String, bounds: RangeBounds },
    /// Query scoped to the objects of a nested path.
    Nested { path: String, query: Box<ElasticQuery> },
    Bool {
        must: Vec<ElasticQuery>,
        must_not: Vec<ElasticQuery>,
        should: Vec<ElasticQuery>,
    },
    /// Filter context, no scoring.
    ConstantScore(Box<ElasticQuery>),
}

impl ElasticQuery {
    pub fn must(queries: Vec<ElasticQuery>) -> Self {
        ElasticQuery::Bool {
            must: queries,
            must_not: Vec::new(),
            should: Vec::new(),
        }
    }

    pub fn must_not(queries: Vec<ElasticQuery>) -> Self {
        ElasticQuery::Bool {
            must: Vec::new(),
            must_not: queries,
            should: Vec::new(),
        }
    }

    pub fn should(queries: Vec<ElasticQuery>) -> Self {
        ElasticQuery::Bool {
            must: Vec::new(),
            must_not: Vec::new(),
            should: queries,
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, ElasticQuery::Bool { .. })
    }

    /// Render to the Elasticsearch JSON DSL.
    pub fn to_json(&self) -> Value {
        match self {
            ElasticQuery::MatchAll => json!({"match_all": {}}),
            ElasticQuery::Ids(values) => json!({"ids": {"values": values}}),
            ElasticQuery::Term { field, value } => json!({"term": {field.as_str(): value}}),
            ElasticQuery::Terms { field, values } => json!({"terms": {field.as_str(): values}}),
            ElasticQuery::Range { field, bounds } => {
                json!({"range": {field.as_str(): bounds.to_json()}})
            }
            ElasticQuery::Nested { path, query } => {
                json!({"nested": {"path": path, "query": query.to_json()}})
            }
            ElasticQuery::Bool {
                must,
                must_not,
                should,
            } => {
                let mut clauses = Map::new();
                for (name, queries) in [("must", must), ("must_not", must_not), ("should", should)] {
                    if !queries.is_empty() {
                        clauses.insert(
                            name.to_string(),
                            Value::Array(queries.iter().map(ElasticQuery::to_json).collect()),
                        );
                    }
                }
                json!({"bool": clauses})
            }
            ElasticQuery::ConstantScore(filter) => {
                json!({"constant_score": {"filter": filter.to_json()}})
            }
        }
    }
}

impl Serialize for ElasticQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Compiles query trees into [`ElasticQuery`] values.
#[derive(Debug, Clone)]
pub struct ElasticQueryCompiler {
    /// Field that holds the document identifier; root-level matches on it
    /// become identifier lookups.
    id_field: String,
}

impl ElasticQueryCompiler {
    pub fn new() -> Self {
        ElasticQueryCompiler {
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    pub fn with_id_field<S: Into<String>>(mut self, id_field: S) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    fn compile_node(&self, node: &QueryNode, ancestors: &[String]) -> Result<ElasticQuery> {
        match node {
            QueryNode::Nested { field, queries } => {
                trace!("Nested {field}");
                let path = extend_path(ancestors, field);
                let query = self.compile_scoped(queries, &path)?;
                Ok(ElasticQuery::Nested {
                    path: path.join("."),
                    query: Box::new(query),
                })
            }
            QueryNode::Not { query } => {
                Ok(ElasticQuery::must_not(vec![self.compile_node(query, ancestors)?]))
            }
            QueryNode::Term { field, values } | QueryNode::Text { field, values } => {
                if values.is_empty() {
                    return Err(GeneSearchError::query_parse(format!(
                        "No values supplied for {field}"
                    )));
                }
                if ancestors.is_empty() && *field == self.id_field {
                    return Ok(ElasticQuery::ConstantScore(Box::new(ElasticQuery::Ids(
                        values.clone(),
                    ))));
                }
                let path = qualified_path(ancestors, field);
                let query = match values.as_slice() {
                    [value] => ElasticQuery::Term {
                        field: path,
                        value: value.clone(),
                    },
                    _ => ElasticQuery::Terms {
                        field: path,
                        values: values.clone(),
                    },
                };
                Ok(ElasticQuery::ConstantScore(Box::new(query)))
            }
            QueryNode::Number { field, expressions } => {
                if ancestors.is_empty() && *field == self.id_field && !expressions.is_empty() {
                    let ids = expressions.iter().map(NumberExpression::to_string).collect();
                    return Ok(ElasticQuery::ConstantScore(Box::new(ElasticQuery::Ids(ids))));
                }
                let path = qualified_path(ancestors, field);
                match expressions.as_slice() {
                    [] => Err(GeneSearchError::query_parse(format!(
                        "No values supplied for {field}"
                    ))),
                    [expression] => Ok(number_query(path, expression)),
                    _ => Ok(ElasticQuery::should(
                        expressions
                            .iter()
                            .map(|e| number_query(path.clone(), e))
                            .collect(),
                    )),
                }
            }
            QueryNode::Range {
                field,
                lower,
                upper,
            } => Ok(ElasticQuery::Range {
                field: qualified_path(ancestors, field),
                bounds: RangeBounds::inclusive(lower.map(|l| l as f64), upper.map(|u| u as f64)),
            }),
        }
    }
}

impl Default for ElasticQueryCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn number_query(path: String, expression: &NumberExpression) -> ElasticQuery {
    let bounds = match *expression {
        NumberExpression::Equal(ref literal) => {
            return ElasticQuery::ConstantScore(Box::new(ElasticQuery::Term {
                field: path,
                value: literal.text().to_string(),
            }));
        }
        NumberExpression::GreaterThan(x) => RangeBounds {
            gt: Some(x),
            ..Default::default()
        },
        NumberExpression::GreaterThanOrEqual(x) => RangeBounds {
            gte: Some(x),
            ..Default::default()
        },
        NumberExpression::LessThan(x) => RangeBounds {
            lt: Some(x),
            ..Default::default()
        },
        NumberExpression::LessThanOrEqual(x) => RangeBounds {
            lte: Some(x),
            ..Default::default()
        },
        NumberExpression::Between(lower, upper) => RangeBounds::inclusive(Some(lower), Some(upper)),
    };
    ElasticQuery::Range { field: path, bounds }
}

impl QueryCompiler for ElasticQueryCompiler {
    type Output = ElasticQuery;

    fn compile_scoped(&self, nodes: &[QueryNode], ancestors: &[String]) -> Result<ElasticQuery> {
        match nodes {
            [] => {
                trace!("All IDs");
                Ok(ElasticQuery::MatchAll)
            }
            [node] => self.compile_node(node, ancestors),
            _ => {
                let mut must = Vec::with_capacity(nodes.len());
                let mut must_not = Vec::new();
                for node in nodes {
                    match node {
                        QueryNode::Not { query } => must_not.push(self.compile_node(query, ancestors)?),
                        _ => must.push(self.compile_node(node, ancestors)?),
                    }
                }
                Ok(ElasticQuery::Bool {
                    must,
                    must_not,
                    should: Vec::new(),
                })
            }
        }
    }
}

/// Build a terms aggregation for a facet.
///
/// A dotted facet `a.b.c` becomes `nested(a) > nested(a.b) > terms(a.b.c)`,
/// buckets ordered by count descending then by key.
pub fn build_aggregation(facet: &str, size: usize) -> Value {
    let segments: Vec<&str> = facet.split('.').collect();
    let mut aggregation = json!({
        "terms": {
            "field": facet,
            "size": size,
            "order": [{"_count": "desc"}, {"_key": "asc"}]
        }
    });
    for depth in (1..segments.len()).rev() {
        let path = segments[..depth].join(".");
        let name = segments[depth];
        aggregation = json!({
            "nested": {"path": path},
            "aggs": {name: aggregation}
        });
    }
    aggregation
}

/// Build the `aggs` section for several facets, keyed by facet name.
pub fn build_aggregations<S: AsRef<str>>(facets: &[S], size: usize) -> Value {
    let aggs: Map<String, Value> = facets
        .iter()
        .map(|facet| {
            let facet = facet.as_ref();
            (facet.to_string(), build_aggregation(facet, size))
        })
        .collect();
    Value::Object(aggs)
}

/// Assemble a search request body.
pub fn search_body<S: AsRef<str>>(
    query: &ElasticQuery,
    source: &[String],
    facets: &[S],
    aggregation_size: usize,
) -> Value {
    let mut body = Map::new();
    body.insert("query".to_string(), query.to_json());
    if !source.is_empty() {
        body.insert("_source".to_string(), json!(source));
    }
    if !facets.is_empty() {
        body.insert("aggs".to_string(), build_aggregations(facets, aggregation_size));
    }
    Value::Object(body)
}
