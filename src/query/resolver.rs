//! Field type resolution for the query handler.
//!
//! Resolvers map a field path (and the value supplied for it) to a semantic
//! [`FieldType`]. They compose with [`FieldTypeResolver::or`]: the catalog
//! resolver answers for fields it knows, and the heuristic resolver covers
//! the rest.

use std::sync::{Arc, OnceLock};

use log::{trace, warn};
use regex::Regex;

use crate::query::location::LOCATION_FIELD;
use crate::query::number::NumberExpression;
use crate::query::value::QueryValue;
use crate::schema::{DataTypeInfo, FieldType};

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([<>]=?)?-?[0-9.]+(--?[0-9.]+)?$").unwrap())
}

/// Resolves the semantic type of a query field.
pub trait FieldTypeResolver: Send + Sync {
    /// The type of the field at the full dotted `path`, or `None` if this
    /// resolver cannot tell.
    fn resolve(&self, path: &str, value: &QueryValue) -> Option<FieldType>;

    /// Consult `fallback` whenever this resolver has no answer.
    fn or<R>(self, fallback: R) -> FallbackResolver<Self, R>
    where
        Self: Sized,
        R: FieldTypeResolver,
    {
        FallbackResolver {
            primary: self,
            fallback,
        }
    }
}

impl<R: FieldTypeResolver + ?Sized> FieldTypeResolver for Box<R> {
    fn resolve(&self, path: &str, value: &QueryValue) -> Option<FieldType> {
        (**self).resolve(path, value)
    }
}

impl<R: FieldTypeResolver + ?Sized> FieldTypeResolver for Arc<R> {
    fn resolve(&self, path: &str, value: &QueryValue) -> Option<FieldType> {
        (**self).resolve(path, value)
    }
}

/// Guesses the type from the key and the shape of the value.
///
/// `location` is a location, objects are nested, lists are terms, numeric
/// expressions are numbers and everything else is a term.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicResolver;

impl HeuristicResolver {
    pub fn new() -> Self {
        HeuristicResolver
    }

    /// Infer a type. Never fails.
    pub fn infer(&self, path: &str, value: &QueryValue) -> FieldType {
        let key = path.rsplit('.').next().unwrap_or(path);
        let field_type = match value {
            _ if key == LOCATION_FIELD => FieldType::Location,
            QueryValue::Object(_) => FieldType::Nested,
            QueryValue::List(_) => FieldType::Term,
            QueryValue::Scalar(s) if is_number(s) => FieldType::Number,
            QueryValue::Scalar(_) => FieldType::Term,
        };
        trace!("Guessed type {field_type} for {path}");
        field_type
    }
}

fn is_number(value: &str) -> bool {
    number_pattern().is_match(value) && NumberExpression::parse(value).is_ok()
}

impl FieldTypeResolver for HeuristicResolver {
    fn resolve(&self, path: &str, value: &QueryValue) -> Option<FieldType> {
        Some(self.infer(path, value))
    }
}

/// Looks fields up in a data type catalog by their full dotted name.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    info: Arc<DataTypeInfo>,
}

impl CatalogResolver {
    pub fn new(info: Arc<DataTypeInfo>) -> Self {
        CatalogResolver { info }
    }

    pub fn info(&self) -> &DataTypeInfo {
        &self.info
    }
}

impl FieldTypeResolver for CatalogResolver {
    fn resolve(&self, path: &str, value: &QueryValue) -> Option<FieldType> {
        let key = path.rsplit('.').next().unwrap_or(path);
        match self.info.field_by_name(path) {
            Some(field) => Some(field.field_type),
            None if key == LOCATION_FIELD || value.is_object() => None,
            None => {
                warn!(
                    "Could not find field {path} from type {} - guessing type",
                    self.info.name()
                );
                None
            }
        }
    }
}

/// Tries `primary` first, then `fallback`.
#[derive(Debug, Clone)]
pub struct FallbackResolver<P, F> {
    primary: P,
    fallback: F,
}

impl<P: FieldTypeResolver, F: FieldTypeResolver> FieldTypeResolver for FallbackResolver<P, F> {
    fn resolve(&self, path: &str, value: &QueryValue) -> Option<FieldType> {
        self.primary
            .resolve(path, value)
            .or_else(|| self.fallback.resolve(path, value))
    }
}
