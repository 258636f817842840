//! # genesearch
//!
//! A backend-agnostic query layer for genomic entity search.
//!
//! ## Features
//!
//! - Declarative JSON queries with dotted paths, negation and locations
//! - Type inference from values or from a field catalog
//! - Compilation to Elasticsearch and MongoDB style queries
//! - Output selection over nested documents
//! - Flattening of nested entities into rows
//! - An in-memory backend with scrolling, paging, sorting and facets

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod query;
pub mod schema;
pub mod search;

pub mod prelude {
    pub use crate::config::SearchConfig;
    pub use crate::document::{Document, FieldValue};
    pub use crate::error::{GeneSearchError, Result};
    pub use crate::output::QueryOutput;
    pub use crate::query::{QueryCompiler, QueryHandler, QueryNode};
    pub use crate::schema::{DataTypeInfo, FieldInfo, FieldType};
    pub use crate::search::{GeneSearch, MemoryBackend, QueryRequest, SearchBackend};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
