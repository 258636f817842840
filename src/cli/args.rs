//! Command line argument parsing for the genesearch CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// genesearch - query, reshape and flatten genomic documents
#[derive(Parser, Debug, Clone)]
#[command(name = "genesearch")]
#[command(about = "Backend-agnostic query layer for genomic entity search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct GeneSearchArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl GeneSearchArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Parse a JSON query and print its query tree
    Parse(ParseArgs),

    /// Compile a JSON query into a backend query
    Compile(CompileArgs),

    /// Run a paginated, faceted query over a data file
    Query(QueryArgs),

    /// Fetch every document matching a query
    Fetch(FetchArgs),

    /// Flatten documents along a nested path
    Flatten(FlattenArgs),
}

/// Arguments for parsing a query
#[derive(Parser, Debug, Clone)]
pub struct ParseArgs {
    /// Query JSON, e.g. '{"biotype":"lncRNA"}'
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Field catalog (JSON) used to type fields
    #[arg(long, value_name = "CATALOG_FILE")]
    pub catalog: Option<PathBuf>,
}

/// Arguments for compiling a query
#[derive(Parser, Debug, Clone)]
pub struct CompileArgs {
    /// Query JSON
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Target query dialect
    #[arg(short, long, default_value = "elastic")]
    pub dialect: Dialect,

    /// Field catalog (JSON) used to type fields
    #[arg(long, value_name = "CATALOG_FILE")]
    pub catalog: Option<PathBuf>,

    /// Facet fields to build aggregations for (elastic only)
    #[arg(long = "facet", value_name = "FIELD")]
    pub facets: Vec<String>,

    /// Buckets per facet
    #[arg(long, default_value = "100")]
    pub aggregation_size: usize,
}

/// Arguments for a paginated query
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    /// Data file (JSON array or JSONL)
    #[arg(value_name = "DATA_FILE")]
    pub data: PathBuf,

    /// Query JSON (default: match everything)
    #[arg(long)]
    pub query: Option<String>,

    /// Output fields, e.g. '["id",{"transcripts":["id"]}]' or 'id,name'
    #[arg(long)]
    pub fields: Option<String>,

    /// Fields to count values of
    #[arg(long = "facet", value_name = "FIELD")]
    pub facets: Vec<String>,

    /// Sort fields, prefixed with + or - for direction
    #[arg(long = "sort", value_name = "FIELD", allow_hyphen_values = true)]
    pub sorts: Vec<String>,

    /// Offset for pagination
    #[arg(short, long, default_value = "0")]
    pub offset: usize,

    /// Maximum number of results to return (default from config)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Search configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Field catalog (JSON) used to type fields and describe results
    #[arg(long, value_name = "CATALOG_FILE")]
    pub catalog: Option<PathBuf>,
}

/// Arguments for fetching all matches
#[derive(Parser, Debug, Clone)]
pub struct FetchArgs {
    /// Data file (JSON array or JSONL)
    #[arg(value_name = "DATA_FILE")]
    pub data: PathBuf,

    /// Query JSON
    #[arg(long)]
    pub query: String,

    /// Output fields
    #[arg(long)]
    pub fields: Option<String>,

    /// Serve the nested entities at this path as rows, e.g. transcripts
    #[arg(long, value_name = "PATH")]
    pub flatten: Option<String>,

    /// Name for parent fields when flattening
    #[arg(long, default_value = "genes")]
    pub top_level: String,

    /// Search configuration file (JSON)
    #[arg(long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Field catalog (JSON) used to type fields and describe results
    #[arg(long, value_name = "CATALOG_FILE")]
    pub catalog: Option<PathBuf>,
}

/// Arguments for flattening documents
#[derive(Parser, Debug, Clone)]
pub struct FlattenArgs {
    /// Data file (JSON array or JSONL)
    #[arg(value_name = "DATA_FILE")]
    pub data: PathBuf,

    /// Dotted path to flatten along
    #[arg(short, long)]
    pub path: String,

    /// Rename keys so the flattened entity becomes the row, parent fields
    /// moving under this name
    #[arg(long)]
    pub top_level: Option<String>,
}

/// Backend query dialects
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Elasticsearch query DSL
    Elastic,
    /// MongoDB filter document
    Mongo,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
