//! Sort directives.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue};
use crate::error::{GeneSearchError, Result};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// A field to sort on, written `name`, `+name` or `-name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn ascending<S: Into<String>>(field: S) -> Self {
        SortField {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending<S: Into<String>>(field: S) -> Self {
        SortField {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse a sort directive. A leading `-` sorts descending, a leading
    /// `+` (or none) ascending.
    pub fn parse(sort: &str) -> Result<Self> {
        let sort = sort.trim();
        let (field, direction) = match sort.as_bytes().first() {
            Some(b'-') => (&sort[1..], SortDirection::Descending),
            Some(b'+') => (&sort[1..], SortDirection::Ascending),
            _ => (sort, SortDirection::Ascending),
        };
        if field.is_empty() {
            return Err(GeneSearchError::invalid_argument(format!(
                "Sort field missing in '{sort}'"
            )));
        }
        Ok(SortField {
            field: field.to_string(),
            direction,
        })
    }

    /// Same direction, different field.
    pub fn with_field<S: Into<String>>(&self, field: S) -> Self {
        SortField {
            field: field.into(),
            direction: self.direction,
        }
    }

    /// Order two documents on this field.
    ///
    /// The first value found at the path is used. Documents without a
    /// value sort last whatever the direction; numbers compare numerically.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let a = sort_key(a, &self.field);
        let b = sort_key(b, &self.field);
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => {
                let ordering = compare_values(a, b);
                match self.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
        }
    }
}

/// Order documents on several fields, earlier fields taking precedence.
pub fn compare_documents(sorts: &[SortField], a: &Document, b: &Document) -> Ordering {
    sorts
        .iter()
        .map(|sort| sort.compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn sort_key<'a>(document: &'a Document, field: &str) -> Option<&'a FieldValue> {
    document
        .values_at(field)
        .into_iter()
        .find(|value| value.is_scalar())
}

fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        return x.total_cmp(&y);
    }
    a.to_term_string().cmp(&b.to_term_string())
}

impl FromStr for SortField {
    type Err = GeneSearchError;

    fn from_str(s: &str) -> Result<Self> {
        SortField::parse(s)
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "+{}", self.field),
            SortDirection::Descending => write!(f, "-{}", self.field),
        }
    }
}
