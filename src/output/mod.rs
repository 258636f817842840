//! Output selection and result reshaping.

pub mod filter;
pub mod query_output;
pub mod remodeller;

pub use self::filter::{filter_fields, project};
pub use self::query_output::{QueryOutput, WILDCARD};
pub use self::remodeller::{clone_object, flatten, flatten_with_top_level};
