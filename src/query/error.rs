//! Query error types
//!
//! Every failure a single query can hit on its way from raw configuration to
//! a finished frame. Errors are contained per query: the data source turns
//! each one into an error response for that query's key only.

use thiserror::Error;

/// Errors that can occur while running one query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Query configuration JSON is malformed or incomplete
    #[error("Invalid query configuration: {0}")]
    Decode(String),

    /// No usable document-store client (missing credentials, bad endpoint,
    /// unknown container)
    #[error("Client error: {0}")]
    ClientConstruction(String),

    /// The store failed while we were paging through results
    #[error("Paging error: {0}")]
    Paging(String),

    /// The batch was cancelled before this query finished
    #[error("Query cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Decode(err.to_string())
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
