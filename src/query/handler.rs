//! Turns JSON query objects into query trees.
//!
//! # Examples
//!
//! ```
//! use genesearch::query::{QueryHandler, QueryNode};
//!
//! let handler = QueryHandler::new();
//! let nodes = handler
//!     .parse_str(r#"{"genome": "homo_sapiens", "transcripts.biotype": ["lncRNA", "miRNA"]}"#)
//!     .unwrap();
//! assert_eq!(nodes[0], QueryNode::term("genome", ["homo_sapiens"]));
//! assert_eq!(
//!     nodes[1],
//!     QueryNode::nested("transcripts", vec![QueryNode::term("biotype", ["lncRNA", "miRNA"])])
//! );
//! ```

use std::sync::Arc;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::error::{GeneSearchError, Result};
use crate::query::ast::QueryNode;
use crate::query::location::Location;
use crate::query::number::NumberExpression;
use crate::query::resolver::{
    CatalogResolver, FallbackResolver, FieldTypeResolver, HeuristicResolver,
};
use crate::query::value::{QueryValue, merge_dotted_keys};
use crate::schema::{DataTypeInfo, FieldType};

/// Handler that consults a catalog first and guesses for unknown fields.
pub type CatalogQueryHandler = QueryHandler<FallbackResolver<CatalogResolver, HeuristicResolver>>;

/// Parses query objects into lists of [`QueryNode`]s.
///
/// The resolver decides the semantic type of each field. When the resolved
/// type does not fit the shape of the supplied value the handler logs a
/// warning and guesses instead.
#[derive(Debug, Clone)]
pub struct QueryHandler<R = HeuristicResolver> {
    resolver: R,
    heuristic: HeuristicResolver,
}

impl QueryHandler<HeuristicResolver> {
    /// A handler inferring types from values alone.
    pub fn new() -> Self {
        QueryHandler::with_resolver(HeuristicResolver::new())
    }
}

impl Default for QueryHandler<HeuristicResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogQueryHandler {
    /// A handler typing fields from a data type catalog.
    pub fn with_catalog(info: Arc<DataTypeInfo>) -> Self {
        QueryHandler::with_resolver(CatalogResolver::new(info).or(HeuristicResolver::new()))
    }
}

impl<R: FieldTypeResolver> QueryHandler<R> {
    pub fn with_resolver(resolver: R) -> Self {
        QueryHandler {
            resolver,
            heuristic: HeuristicResolver::new(),
        }
    }

    /// Parse a JSON query string. A blank string matches everything and
    /// yields no nodes.
    pub fn parse_str(&self, json: &str) -> Result<Vec<QueryNode>> {
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        let value: Value = serde_json::from_str(json).map_err(|e| {
            GeneSearchError::query_parse(format!("Could not parse query string {json}: {e}"))
        })?;
        self.parse(&value)
    }

    /// Parse an optional query string; `None` yields no nodes.
    pub fn parse_opt(&self, json: Option<&str>) -> Result<Vec<QueryNode>> {
        json.map_or_else(|| Ok(Vec::new()), |json| self.parse_str(json))
    }

    /// Parse a JSON value, which must be an object.
    pub fn parse(&self, query: &Value) -> Result<Vec<QueryNode>> {
        match query {
            Value::Object(map) => self.parse_map(map),
            other => Err(GeneSearchError::query_parse(format!(
                "Query must be a JSON object, found {other}"
            ))),
        }
    }

    pub fn parse_map(&self, map: &Map<String, Value>) -> Result<Vec<QueryNode>> {
        self.parse_entries(QueryValue::entries_from_json(map)?)
    }

    /// Parse already decoded entries.
    pub fn parse_entries(&self, entries: Vec<(String, QueryValue)>) -> Result<Vec<QueryNode>> {
        self.parse_scope(None, entries)
    }

    fn parse_scope(
        &self,
        parent: Option<&str>,
        entries: Vec<(String, QueryValue)>,
    ) -> Result<Vec<QueryNode>> {
        let mut nodes = Vec::with_capacity(entries.len());
        for (key, value) in merge_dotted_keys(entries) {
            let (name, negated) = match key.strip_prefix('!') {
                Some(name) => (name.to_string(), true),
                None => (key, false),
            };
            if name.is_empty() {
                return Err(GeneSearchError::query_parse("Empty field name in query"));
            }
            let path = match parent {
                Some(parent) => format!("{parent}.{name}"),
                None => name.clone(),
            };
            let field_type = self.field_type(&path, &value);
            debug!("Parsing {path} as {field_type}");

            let node = match (field_type, value) {
                (FieldType::Location, value) => {
                    if negated {
                        return Err(GeneSearchError::query_parse(format!(
                            "Location {path} cannot be negated"
                        )));
                    }
                    nodes.extend(Location::from_value(&value)?.to_nodes());
                    continue;
                }
                (_, QueryValue::Object(children)) => {
                    QueryNode::nested(name, self.parse_scope(Some(&path), children)?)
                }
                (FieldType::Text, value) => QueryNode::text(name, value.values()),
                (FieldType::Number, value) => {
                    let expressions = value
                        .values()
                        .iter()
                        .map(|v| NumberExpression::parse(v))
                        .collect::<Result<Vec<_>>>()?;
                    QueryNode::numbers(name, expressions)
                }
                (_, value) => QueryNode::term(name, value.values()),
            };
            nodes.push(if negated { QueryNode::negate(node) } else { node });
        }
        Ok(nodes)
    }

    fn field_type(&self, path: &str, value: &QueryValue) -> FieldType {
        match self.resolver.resolve(path, value) {
            Some(field_type) if fits(field_type, value) => field_type,
            Some(field_type) => {
                warn!("Field {path} is declared as {field_type} but the query value does not fit - guessing type");
                self.heuristic.infer(path, value)
            }
            None => self.heuristic.infer(path, value),
        }
    }
}

fn fits(field_type: FieldType, value: &QueryValue) -> bool {
    match field_type {
        FieldType::Nested => value.is_object(),
        FieldType::Location => !matches!(value, QueryValue::List(_)),
        _ => !value.is_object(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_query() {
        let handler = QueryHandler::new();
        assert!(handler.parse_str("").unwrap().is_empty());
        assert!(handler.parse_str("   ").unwrap().is_empty());
        assert!(handler.parse_opt(None).unwrap().is_empty());
        assert!(handler.parse_str("{}").unwrap().is_empty());
    }

    #[test]
    fn test_scalars_and_lists() {
        let handler = QueryHandler::new();
        let nodes = handler
            .parse(&json!({"genome": "homo_sapiens", "name": ["BRCA1", "BRCA2"]}))
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                QueryNode::term("genome", ["homo_sapiens"]),
                QueryNode::term("name", ["BRCA1", "BRCA2"]),
            ]
        );
    }

    #[test]
    fn test_numbers_are_guessed() {
        let handler = QueryHandler::new();
        let nodes = handler.parse(&json!({"start": ">=100", "end": 2000})).unwrap();
        assert_eq!(
            nodes,
            vec![
                QueryNode::number("end", NumberExpression::equal(2000.0)),
                QueryNode::number("start", NumberExpression::GreaterThanOrEqual(100.0)),
            ]
        );
    }

    #[test]
    fn test_nested_and_dotted_agree() {
        let handler = QueryHandler::new();
        let nested = handler
            .parse(&json!({"transcripts": {"biotype": "lncRNA", "translations": {"id": "P1"}}}))
            .unwrap();
        let dotted = handler
            .parse(&json!({"transcripts.biotype": "lncRNA", "transcripts.translations.id": "P1"}))
            .unwrap();
        assert_eq!(nested, dotted);
        assert_eq!(
            nested,
            vec![QueryNode::nested(
                "transcripts",
                vec![
                    QueryNode::term("biotype", ["lncRNA"]),
                    QueryNode::nested("translations", vec![QueryNode::term("id", ["P1"])]),
                ]
            )]
        );
    }

    #[test]
    fn test_location_expands_in_scope() {
        let handler = QueryHandler::new();
        let nodes = handler
            .parse(&json!({
                "genome": "homo_sapiens",
                "location": {"seq_region": "1", "start": "100", "end": "2000"}
            }))
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                QueryNode::term("genome", ["homo_sapiens"]),
                QueryNode::term("seq_region", ["1"]),
                QueryNode::range("start", Some(100), None),
                QueryNode::range("end", None, Some(2000)),
            ]
        );
        let err = handler.parse(&json!({"location": {"start": "x"}})).unwrap_err();
        assert!(matches!(err, GeneSearchError::QueryParse(_)));
    }

    #[test]
    fn test_negation() {
        let handler = QueryHandler::new();
        let nodes = handler.parse(&json!({"!biotype": "lncRNA"})).unwrap();
        assert_eq!(
            nodes,
            vec![QueryNode::negate(QueryNode::term("biotype", ["lncRNA"]))]
        );
        assert!(handler.parse(&json!({"!location": "1:1-2"})).is_err());
    }

    #[test]
    fn test_parse_errors() {
        let handler = QueryHandler::new();
        assert!(matches!(
            handler.parse_str("{not json").unwrap_err(),
            GeneSearchError::QueryParse(_)
        ));
        assert!(handler.parse_str("[1, 2]").is_err());
        assert!(handler.parse(&json!({"a": null})).is_err());
        assert!(handler.parse(&json!({"a": [{"b": 1}]})).is_err());
    }

    #[test]
    fn test_catalog_typing() {
        let info = Arc::new(
            DataTypeInfo::new("genes")
                .with_field("description", FieldType::Text)
                .with_field("version", FieldType::Term)
                .with_field("transcripts", FieldType::Nested)
                .with_field("transcripts.start", FieldType::Number),
        );
        let handler = QueryHandler::with_catalog(info);
        let nodes = handler
            .parse(&json!({
                "description": "kinase",
                "version": "2",
                "transcripts": {"start": ["<10", "20-30"]},
                "unknown": "5"
            }))
            .unwrap();
        assert_eq!(
            nodes,
            vec![
                QueryNode::text("description", ["kinase"]),
                QueryNode::nested(
                    "transcripts",
                    vec![QueryNode::numbers(
                        "start",
                        vec![
                            NumberExpression::LessThan(10.0),
                            NumberExpression::Between(20.0, 30.0)
                        ]
                    )]
                ),
                QueryNode::number("unknown", NumberExpression::equal(5.0)),
                QueryNode::term("version", ["2"]),
            ]
        );
    }

    #[test]
    fn test_catalog_shape_mismatch_falls_back() {
        let info = Arc::new(DataTypeInfo::new("genes").with_field("xrefs", FieldType::Term));
        let handler = QueryHandler::with_catalog(info);
        let nodes = handler.parse(&json!({"xrefs": {"db": "UniProt"}})).unwrap();
        assert_eq!(
            nodes,
            vec![QueryNode::nested("xrefs", vec![QueryNode::term("db", ["UniProt"])])]
        );
    }

    #[test]
    fn test_catalog_number_rejects_bad_expression() {
        let info = Arc::new(DataTypeInfo::new("genes").with_field("start", FieldType::Number));
        let handler = QueryHandler::with_catalog(info);
        assert!(handler.parse(&json!({"start": "abc"})).is_err());
    }
}
