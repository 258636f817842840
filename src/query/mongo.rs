//! MongoDB filter document generation.

use serde_json::{Map, Value, json};

use crate::error::{GeneSearchError, Result};
use crate::query::ast::QueryNode;
use crate::query::compiler::{QueryCompiler, extend_path, number_value, qualified_path};
use crate::query::elastic::DEFAULT_ID_FIELD;
use crate::query::number::NumberExpression;

/// Suffix marking a nested field that must be matched element-wise.
const LIST_SUFFIX: &str = "-list";
const MONGO_ID: &str = "_id";

/// Compiles query trees into MongoDB filter documents.
///
/// Nested scopes prefix their children's keys with `parent.`, except for
/// fields named `<name>-list`, which become `{"<name>": {"$elemMatch": ...}}`.
/// Negation has no counterpart here and is rejected.
#[derive(Debug, Clone)]
pub struct MongoQueryCompiler {
    id_field: String,
}

impl MongoQueryCompiler {
    pub fn new() -> Self {
        MongoQueryCompiler {
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }

    pub fn with_id_field<S: Into<String>>(mut self, id_field: S) -> Self {
        self.id_field = id_field.into();
        self
    }

    fn compile_node(&self, node: &QueryNode, ancestors: &[String]) -> Result<Map<String, Value>> {
        let mut doc = Map::new();
        match node {
            QueryNode::Not { .. } => {
                return Err(GeneSearchError::unsupported("No support for NOT queries"));
            }
            QueryNode::Term { field, values } | QueryNode::Text { field, values } => {
                let key = if ancestors.is_empty() && *field == self.id_field {
                    MONGO_ID.to_string()
                } else {
                    qualified_path(ancestors, field)
                };
                let value = match values.as_slice() {
                    [] => {
                        return Err(GeneSearchError::query_parse(format!(
                            "No values supplied for {field}"
                        )));
                    }
                    [value] => json!(value),
                    _ => json!({"$in": values}),
                };
                doc.insert(key, value);
            }
            QueryNode::Number { field, expressions } => {
                if ancestors.is_empty() && *field == self.id_field && !expressions.is_empty() {
                    let ids: Vec<String> = expressions.iter().map(NumberExpression::to_string).collect();
                    let value = match ids.as_slice() {
                        [id] => json!(id),
                        _ => json!({"$in": ids}),
                    };
                    doc.insert(MONGO_ID.to_string(), value);
                    return Ok(doc);
                }
                let key = qualified_path(ancestors, field);
                match expressions.as_slice() {
                    [] => {
                        return Err(GeneSearchError::query_parse(format!(
                            "No values supplied for {field}"
                        )));
                    }
                    [expression] => {
                        doc.insert(key, number_condition(expression));
                    }
                    _ => {
                        let alternatives: Vec<Value> = expressions
                            .iter()
                            .map(|e| json!({key.as_str(): number_condition(e)}))
                            .collect();
                        doc.insert("$or".to_string(), Value::Array(alternatives));
                    }
                }
            }
            QueryNode::Range {
                field,
                lower,
                upper,
            } => {
                let mut bounds = Map::new();
                if let Some(lower) = lower {
                    bounds.insert("$gte".to_string(), json!(lower));
                }
                if let Some(upper) = upper {
                    bounds.insert("$lte".to_string(), json!(upper));
                }
                doc.insert(qualified_path(ancestors, field), Value::Object(bounds));
            }
            QueryNode::Nested { field, queries } => match field.strip_suffix(LIST_SUFFIX) {
                Some(stem) => {
                    let element = self.compile_scoped(queries, &[])?;
                    doc.insert(
                        qualified_path(ancestors, stem),
                        json!({"$elemMatch": element}),
                    );
                }
                None => {
                    let scoped = self.compile_scoped(queries, &extend_path(ancestors, field))?;
                    if let Value::Object(scoped) = scoped {
                        doc = scoped;
                    }
                }
            },
        }
        Ok(doc)
    }
}

impl Default for MongoQueryCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Equality matches the parsed number, and also the literal text when the
/// number does not print back as written (`007`, `1.10`).
fn number_condition(expression: &NumberExpression) -> Value {
    match *expression {
        NumberExpression::Equal(ref literal) if literal.is_canonical() => number_value(literal.value()),
        NumberExpression::Equal(ref literal) => {
            json!({"$in": [number_value(literal.value()), literal.text()]})
        }
        NumberExpression::GreaterThan(x) => json!({"$gt": number_value(x)}),
        NumberExpression::GreaterThanOrEqual(x) => json!({"$gte": number_value(x)}),
        NumberExpression::LessThan(x) => json!({"$lt": number_value(x)}),
        NumberExpression::LessThanOrEqual(x) => json!({"$lte": number_value(x)}),
        NumberExpression::Between(lower, upper) => {
            json!({"$gte": number_value(lower), "$lte": number_value(upper)})
        }
    }
}

impl QueryCompiler for MongoQueryCompiler {
    type Output = Value;

    fn compile_scoped(&self, nodes: &[QueryNode], ancestors: &[String]) -> Result<Value> {
        match nodes {
            [] => Ok(json!({})),
            [node] => self.compile_node(node, ancestors).map(Value::Object),
            _ => {
                let docs = nodes
                    .iter()
                    .map(|node| self.compile_node(node, ancestors))
                    .collect::<Result<Vec<_>>>()?;
                let mut merged = Map::new();
                let mut clash = false;
                for doc in &docs {
                    for (key, value) in doc {
                        clash |= merged.insert(key.clone(), value.clone()).is_some();
                    }
                }
                if clash {
                    Ok(json!({"$and": docs}))
                } else {
                    Ok(Value::Object(merged))
                }
            }
        }
    }
}
