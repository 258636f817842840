//! Backend query compilation.

use serde_json::Value;

use crate::error::Result;
use crate::query::ast::QueryNode;

/// Compiles query trees into a backend's native query representation.
///
/// Implementations follow the same rules: no nodes match everything, a
/// single node is compiled directly without a boolean wrapper, and several
/// nodes are compiled under the same ancestor path and AND-combined.
pub trait QueryCompiler: Send + Sync {
    /// The backend query type.
    type Output;

    /// Compile `nodes` whose field names are relative to `ancestors`.
    fn compile_scoped(&self, nodes: &[QueryNode], ancestors: &[String]) -> Result<Self::Output>;

    /// Compile top-level nodes, normalizing dotted field names first.
    fn compile(&self, nodes: &[QueryNode]) -> Result<Self::Output> {
        let normalized: Vec<QueryNode> = nodes.iter().cloned().map(QueryNode::normalized).collect();
        self.compile_scoped(&normalized, &[])
    }
}

/// Join the ancestor path and a field name with `.`.
pub fn qualified_path(ancestors: &[String], field: &str) -> String {
    if ancestors.is_empty() {
        return field.to_string();
    }
    let mut path = ancestors.join(".");
    path.push('.');
    path.push_str(field);
    path
}

/// `ancestors` extended by `field`.
pub fn extend_path(ancestors: &[String], field: &str) -> Vec<String> {
    let mut path = Vec::with_capacity(ancestors.len() + 1);
    path.extend_from_slice(ancestors);
    path.push(field.to_string());
    path
}

/// Render a number as JSON, as an integer when it has no fractional part.
pub(crate) fn number_value(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < i64::MAX as f64 {
        Value::from(x as i64)
    } else {
        Value::from(x)
    }
}
