//! The query tree.
//!
//! A query is a list of [`QueryNode`]s that are implicitly AND-combined. Leaf
//! nodes match a single field; [`QueryNode::Nested`] scopes its children under
//! a sub-object so that child field names are relative to it.
//!
//! # Examples
//!
//! ```
//! use genesearch::query::{QueryNode, QueryValue, normalize};
//!
//! let nodes = normalize("transcripts.biotype", &QueryValue::Scalar("lncRNA".into())).unwrap();
//! assert_eq!(
//!     nodes,
//!     vec![QueryNode::nested("transcripts", vec![QueryNode::term("biotype", ["lncRNA"])])]
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::location::{LOCATION_FIELD, Location};
use crate::query::number::NumberExpression;
use crate::query::value::{QueryValue, merge_dotted_keys};

/// A node of the query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum QueryNode {
    /// Field equals any of the values.
    Term { field: String, values: Vec<String> },
    /// Full-text match on any of the values.
    Text { field: String, values: Vec<String> },
    /// Field satisfies any of the numeric expressions.
    Number {
        field: String,
        expressions: Vec<NumberExpression>,
    },
    /// Inclusive integer bounds, either of which may be open.
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lower: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upper: Option<i64>,
    },
    /// Conjunction of children scoped under `field`.
    Nested {
        field: String,
        queries: Vec<QueryNode>,
    },
    /// Negation of one node.
    Not { query: Box<QueryNode> },
}

impl QueryNode {
    pub fn term<S, I, V>(field: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        QueryNode::Term {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn text<S, I, V>(field: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        QueryNode::Text {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn number<S: Into<String>>(field: S, expression: NumberExpression) -> Self {
        QueryNode::Number {
            field: field.into(),
            expressions: vec![expression],
        }
    }

    pub fn numbers<S: Into<String>>(field: S, expressions: Vec<NumberExpression>) -> Self {
        QueryNode::Number {
            field: field.into(),
            expressions,
        }
    }

    pub fn range<S: Into<String>>(field: S, lower: Option<i64>, upper: Option<i64>) -> Self {
        QueryNode::Range {
            field: field.into(),
            lower,
            upper,
        }
    }

    pub fn nested<S: Into<String>>(field: S, queries: Vec<QueryNode>) -> Self {
        QueryNode::Nested {
            field: field.into(),
            queries,
        }
    }

    pub fn negate(query: QueryNode) -> Self {
        QueryNode::Not {
            query: Box::new(query),
        }
    }

    /// The field this node applies to. For `Not` this is the negated node's
    /// field.
    pub fn field(&self) -> &str {
        match self {
            QueryNode::Term { field, .. }
            | QueryNode::Text { field, .. }
            | QueryNode::Number { field, .. }
            | QueryNode::Range { field, .. }
            | QueryNode::Nested { field, .. } => field,
            QueryNode::Not { query } => query.field(),
        }
    }

    /// A copy of this node carrying a different field name.
    pub fn with_field<S: Into<String>>(&self, field: S) -> QueryNode {
        let mut node = self.clone();
        node.set_field(field.into());
        node
    }

    fn set_field(&mut self, name: String) {
        match self {
            QueryNode::Term { field, .. }
            | QueryNode::Text { field, .. }
            | QueryNode::Number { field, .. }
            | QueryNode::Range { field, .. }
            | QueryNode::Nested { field, .. } => *field = name,
            QueryNode::Not { query } => query.set_field(name),
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, QueryNode::Nested { .. })
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, QueryNode::Not { .. })
    }

    /// Rewrite dotted field names into nested scopes, recursively.
    ///
    /// `Term("a.b.c")` becomes `Nested(a, [Nested(b, [Term(c)])])`. Already
    /// normalized trees are returned unchanged.
    pub fn normalized(self) -> QueryNode {
        match self {
            QueryNode::Not { query } => QueryNode::negate(query.normalized()),
            QueryNode::Nested { field, queries } => {
                let queries = queries.into_iter().map(QueryNode::normalized).collect();
                wrap_path(&field, |leaf| QueryNode::nested(leaf, queries))
            }
            leaf => {
                let field = leaf.field().to_string();
                wrap_path(&field, |name| leaf.with_field(name))
            }
        }
    }
}

fn wrap_path<F>(path: &str, leaf: F) -> QueryNode
where
    F: FnOnce(&str) -> QueryNode,
{
    match path.split_once('.') {
        Some((first, rest)) => QueryNode::nested(first, vec![wrap_path(rest, leaf)]),
        None => leaf(path),
    }
}

/// Build the nodes for one query key.
///
/// A dotted path becomes nested scopes; at the last segment a scalar or list
/// becomes a `Term`, an object becomes a `Nested` scope over its entries and
/// the reserved `location` key expands into its sibling nodes.
pub fn normalize(field_path: &str, value: &QueryValue) -> Result<Vec<QueryNode>> {
    if let Some((first, rest)) = field_path.split_once('.') {
        return Ok(vec![QueryNode::nested(first, normalize(rest, value)?)]);
    }
    if field_path == LOCATION_FIELD {
        return Ok(Location::from_value(value)?.to_nodes());
    }
    match value {
        QueryValue::Object(entries) => {
            let mut children = Vec::with_capacity(entries.len());
            for (key, child) in merge_dotted_keys(entries.clone()) {
                children.extend(normalize(&key, &child)?);
            }
            Ok(vec![QueryNode::nested(field_path, children)])
        }
        leaf => Ok(vec![QueryNode::term(field_path, leaf.values())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dotted_term() {
        let nodes = normalize("a.b.c", &QueryValue::List(vec!["1".into(), "2".into()])).unwrap();
        assert_eq!(
            nodes,
            vec![QueryNode::nested(
                "a",
                vec![QueryNode::nested("b", vec![QueryNode::term("c", ["1", "2"])])]
            )]
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let dotted = QueryNode::term("a.b.c", ["x"]);
        let once = dotted.normalized();
        let twice = once.clone().normalized();
        assert_eq!(once, twice);

        let nested = QueryNode::nested(
            "a",
            vec![QueryNode::nested("b", vec![QueryNode::term("c", ["x"])])],
        );
        assert_eq!(nested.clone().normalized(), nested);
        assert_eq!(once, nested);
    }

    #[test]
    fn test_normalize_nested_with_dotted_children() {
        let node = QueryNode::nested("a.b", vec![QueryNode::range("c.d", Some(1), None)]).normalized();
        assert_eq!(
            node,
            QueryNode::nested(
                "a",
                vec![QueryNode::nested(
                    "b",
                    vec![QueryNode::nested("c", vec![QueryNode::range("d", Some(1), None)])]
                )]
            )
        );
    }

    #[test]
    fn test_normalize_negation() {
        let node = QueryNode::negate(QueryNode::term("a.b", ["x"])).normalized();
        assert_eq!(
            node,
            QueryNode::negate(QueryNode::nested("a", vec![QueryNode::term("b", ["x"])]))
        );
        assert_eq!(node.field(), "a");
    }

    #[test]
    fn test_normalize_location() {
        let value = QueryValue::Scalar("1:10-20".to_string());
        let nodes = normalize("location", &value).unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(normalize("location", &QueryValue::Scalar("nowhere".into())).is_err());
    }

    #[test]
    fn test_serde_shape() {
        let node = QueryNode::nested("transcripts", vec![QueryNode::term("biotype", ["lncRNA"])]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "NESTED",
                "field": "transcripts",
                "queries": [{"type": "TERM", "field": "biotype", "values": ["lncRNA"]}]
            })
        );
        let back: QueryNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
