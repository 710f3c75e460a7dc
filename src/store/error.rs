//! Document store error types

use thiserror::Error;

/// Errors that can occur when talking to a document store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Primary key missing or not valid base64
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Endpoint URI missing or malformed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Database or container cannot be addressed
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Store could not be reached
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Store answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body was not what the store promised
    #[error("Malformed response: {0}")]
    Decode(String),

    /// `next_page` called after the last page
    #[error("Pager exhausted")]
    Exhausted,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

impl StoreError {
    /// Map a transport failure the way callers care about it
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Request(err)
        }
    }
}

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;
