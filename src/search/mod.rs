//! Executing queries against a backend and shaping the results.

pub mod backend;
pub mod engine;
pub mod facet;
pub mod flatten;
pub mod memory;
pub mod result;
pub mod sort;

pub use self::backend::{Page, ScrollBatch, SearchBackend};
pub use self::engine::{GeneSearch, QueryRequest};
pub use self::facet::{FacetCollector, FacetCount, FacetResults, facet_map};
pub use self::flatten::FlatteningSearch;
pub use self::memory::MemoryBackend;
pub use self::result::{QueryResult, SearchResult};
pub use self::sort::{SortDirection, SortField, compare_documents};
