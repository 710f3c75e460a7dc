//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::datasource::{DataQuery, QueryDataRequest};
use crate::query::TimeRange;

// ============================================
// QUERY DTOs
// ============================================

/// Query batch request
#[derive(Debug, Deserialize)]
pub struct QueryDataRequestDto {
    pub queries: Vec<DataQueryDto>,
}

/// One query of a batch
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQueryDto {
    /// Key the response is filed under
    pub ref_id: String,
    pub time_range: TimeRangeDto,
    /// Query editor configuration, passed through undecoded
    #[serde(default)]
    pub json: Option<Box<RawValue>>,
}

/// Time range as RFC 3339 instants
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TimeRangeDto {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Ranges pass through as given; a range that starts after it ends simply
/// matches no documents
impl From<TimeRangeDto> for TimeRange {
    fn from(dto: TimeRangeDto) -> Self {
        TimeRange::new(dto.from, dto.to)
    }
}

/// Duplicate `refId`s are left for the data source to report under their key
impl From<QueryDataRequestDto> for QueryDataRequest {
    fn from(dto: QueryDataRequestDto) -> Self {
        let queries = dto
            .queries
            .into_iter()
            .map(|query| {
                let json = query
                    .json
                    .map(|raw| raw.get().as_bytes().to_vec())
                    .unwrap_or_else(|| b"{}".to_vec());
                DataQuery::new(query.ref_id, query.time_range.into(), json)
            })
            .collect();

        QueryDataRequest::new(queries)
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// Data source check result: "ok" or "error"
    pub datasource: String,
    pub message: String,
    pub uptime_seconds: u64,
    pub version: String,
}
