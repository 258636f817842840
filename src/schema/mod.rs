//! Field-type catalogs describing searchable data types.
//!
//! Catalogs drive the type-aware query handler and report field metadata
//! alongside search results.

pub mod field;
#[allow(clippy::module_inception)]
pub mod schema;

// Re-export commonly used types
pub use field::{FieldInfo, FieldType};
pub use schema::DataTypeInfo;
