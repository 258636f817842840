//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{Dialect, GeneSearchArgs, OutputFormat};
use crate::document::Document;
use crate::error::Result;
use crate::query::QueryNode;

/// Result structure for query parsing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResult {
    pub queries: Vec<QueryNode>,
}

/// Result structure for query compilation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompileResult {
    pub dialect: Dialect,
    pub query: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Value>,
}

/// Result structure for flattening.
#[derive(Debug, Serialize, Deserialize)]
pub struct FlattenResult {
    pub results: Vec<Document>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &GeneSearchArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &GeneSearchArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    match value.get("results").and_then(Value::as_array) {
        Some(results) => output_results_human(&value, results),
        None => println!("{}", serde_json::to_string_pretty(&value)?),
    }
    Ok(())
}

/// Output documents, one per line, with paging and facet summaries.
fn output_results_human(value: &Value, results: &[Value]) {
    println!("Results:");
    println!("════════");
    for result in results {
        println!("{result}");
    }
    println!();

    if let Some(count) = value.get("resultCount").and_then(Value::as_u64) {
        let offset = value.get("offset").and_then(Value::as_u64).unwrap_or(0);
        println!(
            "Showing {} from offset {offset} of {count} results",
            results.len()
        );
    } else {
        println!("Total results: {}", results.len());
    }

    if let Some(facets) = value.get("facets").and_then(Value::as_object)
        && !facets.is_empty()
    {
        println!();
        println!("Facets:");
        println!("───────");
        for (field_name, counts) in facets {
            println!("{field_name}:");
            let mut buckets: Vec<(&String, u64)> = counts
                .as_object()
                .map(|c| c.iter().map(|(k, v)| (k, v.as_u64().unwrap_or(0))).collect())
                .unwrap_or_default();
            buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            for (label, count) in buckets {
                println!("  {label} ({count})");
            }
        }
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &GeneSearchArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}
