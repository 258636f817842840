//! Error types for the genesearch library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`GeneSearchError`] enum. Errors split into two families: caller-input
//! failures (malformed queries, unknown output fields, unsupported query
//! shapes) which should be reported back to the client as-is, and failures
//! raised by the backend or the environment, which are propagated unchanged.
//!
//! # Examples
//!
//! ```
//! use genesearch::error::{GeneSearchError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(GeneSearchError::query_parse("Could not parse query string {"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => assert!(e.is_client_error()),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for genesearch operations.
#[derive(Error, Debug)]
pub enum GeneSearchError {
    /// Malformed query JSON, bad numeric bounds or unbalanced output syntax.
    #[error("Query parse error: {0}")]
    QueryParse(String),

    /// A requested output field that the backend could not supply.
    #[error("Field not found in result: {0}")]
    FieldNotFound(String),

    /// Failure reported by the search/storage backend.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A query shape the selected backend cannot express.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid argument supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration or catalog loading errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (reading data files, catalogs, configuration)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with GeneSearchError.
pub type Result<T> = std::result::Result<T, GeneSearchError>;

impl GeneSearchError {
    /// Create a new query parse error.
    pub fn query_parse<S: Into<String>>(msg: S) -> Self {
        GeneSearchError::QueryParse(msg.into())
    }

    /// Create a new field-not-found error.
    pub fn field_not_found<S: Into<String>>(path: S) -> Self {
        GeneSearchError::FieldNotFound(path.into())
    }

    /// Create a new backend error.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        GeneSearchError::Backend(msg.into())
    }

    /// Create a new unsupported operation error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        GeneSearchError::Unsupported(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        GeneSearchError::InvalidArgument(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GeneSearchError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        GeneSearchError::Other(msg.into())
    }

    /// Whether the error was caused by caller input rather than by the
    /// backend or the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GeneSearchError::QueryParse(_)
                | GeneSearchError::FieldNotFound(_)
                | GeneSearchError::Unsupported(_)
                | GeneSearchError::InvalidArgument(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeneSearchError::query_parse("bad bound");
        assert_eq!(err.to_string(), "Query parse error: bad bound");

        let err = GeneSearchError::field_not_found("transcripts.id");
        assert_eq!(err.to_string(), "Field not found in result: transcripts.id");
    }

    #[test]
    fn test_client_errors() {
        assert!(GeneSearchError::query_parse("x").is_client_error());
        assert!(GeneSearchError::invalid_argument("x").is_client_error());
        assert!(!GeneSearchError::backend("timeout").is_client_error());

        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert!(!GeneSearchError::from(io_err).is_client_error());
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: GeneSearchError = json_err.into();
        assert!(matches!(err, GeneSearchError::Json(_)));
    }
}
