//! Query model: decoding, typing and compiling search queries.
//!
//! JSON query objects are decoded into [`QueryValue`]s, typed by a
//! [`FieldTypeResolver`] and turned into [`QueryNode`] trees by the
//! [`QueryHandler`]. A [`QueryCompiler`] then produces a backend query.

pub mod ast;
pub mod compiler;
pub mod elastic;
pub mod handler;
pub mod location;
pub mod mongo;
pub mod number;
pub mod resolver;
pub mod value;

pub use self::ast::{QueryNode, normalize};
pub use self::compiler::QueryCompiler;
pub use self::elastic::{
    ElasticQuery, ElasticQueryCompiler, RangeBounds, build_aggregation, build_aggregations,
    search_body,
};
pub use self::handler::{CatalogQueryHandler, QueryHandler};
pub use self::location::Location;
pub use self::mongo::MongoQueryCompiler;
pub use self::number::{NumberExpression, NumberLiteral};
pub use self::resolver::{CatalogResolver, FallbackResolver, FieldTypeResolver, HeuristicResolver};
pub use self::value::{QueryValue, merge_dotted_keys};
