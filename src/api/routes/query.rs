//! Query Routes
//!
//! Endpoint for running query batches against the data source.
//!
//! - POST /api/v1/query - Run a batch of queries

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::QueryDataRequestDto;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::datasource::{cancellation, QueryDataRequest, QueryDataResponse};

/// POST /api/v1/query
///
/// Run every query of the batch. Per-query failures are reported inside the
/// response under their `refId`, duplicate keys included; only a malformed
/// request body fails the whole call. Queries still running when the request timeout elapses
/// resolve to `cancelled`.
pub async fn query_data(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryDataRequestDto>, JsonRejection>,
) -> ApiResult<Json<QueryDataResponse>> {
    let Json(dto) = payload?;
    let request = QueryDataRequest::from(dto);

    tracing::info!(queries = request.queries.len(), "Running query batch");

    let (handle, cancel) = cancellation();
    let timer = handle.cancel_after(state.config.request_timeout());

    let response = state.datasource.query_data_with_cancel(request, &cancel).await;
    timer.abort();

    let failed = response.responses.values().filter(|r| !r.is_ok()).count();
    tracing::info!(responses = response.len(), failed, "Query batch finished");

    Ok(Json(response))
}
