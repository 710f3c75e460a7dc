//! Query batch request and response types

use serde::Serialize;
use std::collections::BTreeMap;

use crate::frame::Frame;
use crate::query::{QueryError, TimeRange};

/// One query of a batch
#[derive(Debug, Clone)]
pub struct DataQuery {
    /// Key the response is filed under
    pub ref_id: String,
    /// Dashboard time range for this query
    pub time_range: TimeRange,
    /// Raw JSON query configuration
    pub json: Vec<u8>,
}

impl DataQuery {
    pub fn new(ref_id: impl Into<String>, time_range: TimeRange, json: impl Into<Vec<u8>>) -> Self {
        Self {
            ref_id: ref_id.into(),
            time_range,
            json: json.into(),
        }
    }
}

/// A batch of queries sharing one data source
#[derive(Debug, Clone, Default)]
pub struct QueryDataRequest {
    pub queries: Vec<DataQuery>,
}

impl QueryDataRequest {
    pub fn new(queries: Vec<DataQuery>) -> Self {
        Self { queries }
    }
}

/// Outcome class of a single query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    BadRequest,
    Cancelled,
}

impl ResponseStatus {
    /// HTTP-style status code
    pub fn code(&self) -> u16 {
        match self {
            ResponseStatus::Ok => 200,
            ResponseStatus::BadRequest => 400,
            ResponseStatus::Cancelled => 499,
        }
    }
}

impl From<&QueryError> for ResponseStatus {
    fn from(err: &QueryError) -> Self {
        match err {
            QueryError::Decode(_) | QueryError::ClientConstruction(_) | QueryError::Paging(_) => {
                ResponseStatus::BadRequest
            }
            QueryError::Cancelled => ResponseStatus::Cancelled,
        }
    }
}

/// Response to a single query: frames on success, a message on failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataResponse {
    pub status: ResponseStatus,
    pub frames: Vec<Frame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DataResponse {
    /// Successful response carrying one frame
    pub fn ok(frame: Frame) -> Self {
        Self {
            status: ResponseStatus::Ok,
            frames: vec![frame],
            error: None,
        }
    }

    /// Error response for a failed query
    pub fn from_error(err: &QueryError) -> Self {
        Self {
            status: err.into(),
            frames: Vec::new(),
            error: Some(err.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}

/// Responses of a batch keyed by `ref_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryDataResponse {
    #[serde(rename = "results")]
    pub responses: BTreeMap<String, DataResponse>,
}

impl QueryDataResponse {
    pub fn get(&self, ref_id: &str) -> Option<&DataResponse> {
        self.responses.get(ref_id)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RESPONSE_FRAME_NAME;

    #[test]
    fn test_error_response() {
        let response = DataResponse::from_error(&QueryError::Decode("expected value".to_string()));
        assert_eq!(response.status, ResponseStatus::BadRequest);
        assert_eq!(response.status.code(), 400);
        assert!(response.frames.is_empty());
        assert_eq!(
            response.error.as_deref(),
            Some("Invalid query configuration: expected value")
        );

        let response = DataResponse::from_error(&QueryError::Cancelled);
        assert_eq!(response.status, ResponseStatus::Cancelled);
    }

    #[test]
    fn test_response_serialization() {
        let mut batch = QueryDataResponse::default();
        batch
            .responses
            .insert("A".to_string(), DataResponse::ok(Frame::new(RESPONSE_FRAME_NAME)));
        batch.responses.insert(
            "B".to_string(),
            DataResponse::from_error(&QueryError::Paging("boom".to_string())),
        );

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["results"]["A"]["status"], "ok");
        assert!(json["results"]["A"].get("error").is_none());
        assert_eq!(json["results"]["B"]["status"], "bad_request");
        assert_eq!(json["results"]["B"]["error"], "Paging error: boom");
    }
}
