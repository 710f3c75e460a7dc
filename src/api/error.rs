//! API errors
//!
//! Only failures of the HTTP call itself live here. A query that fails
//! inside a batch is not an API error: it is reported in the 200 batch
//! response under its `refId`.
//!
//! Every error renders as
//! `{"error": {"code": ..., "message": ...}, "request_id": ...}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of an API call or of the server around it
#[derive(Error, Debug)]
pub enum ApiError {
    /// Body could not be read as a query batch
    #[error("Malformed request body: {message}")]
    MalformedBody { status: StatusCode, message: String },

    /// Listener could not be opened
    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server loop stopped with an error
    #[error("Server stopped: {0}")]
    Server(#[source] std::io::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    /// HTTP status. Body rejections keep the status axum picked (400, 413,
    /// 415 or 422).
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody { status, .. } => *status,
            ApiError::Bind { .. } | ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MalformedBody { .. } => "MALFORMED_REQUEST",
            ApiError::Bind { .. } => "BIND_FAILED",
            ApiError::Server(_) => "SERVER_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
    request_id: String,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_client_error() {
            tracing::warn!(%request_id, code = self.code(), error = %self, "Rejected request");
        } else {
            tracing::error!(%request_id, code = self.code(), error = %self, "Request failed");
        }

        let envelope = ErrorEnvelope {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
            request_id,
        };
        (status, Json(envelope)).into_response()
    }
}

/// Result of an API handler
pub type ApiResult<T> = Result<T, ApiError>;
