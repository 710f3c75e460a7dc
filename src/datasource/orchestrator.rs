//! Query orchestration
//!
//! Runs each query of a batch through the pipeline and files the outcome
//! under the query's `ref_id`:
//!
//! ```text
//! raw JSON → QueryModel → query text → pager → FrameAssembler → DataResponse
//! ```
//!
//! Failures are contained per query. Queries run in request order; with a
//! `query_concurrency` above 1 several run at once over the shared client.

use futures_util::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::datasource::cancel::Cancellation;
use crate::datasource::health::CheckHealthResult;
use crate::datasource::request::{DataQuery, DataResponse, QueryDataRequest, QueryDataResponse};
use crate::datasource::settings::DataSourceSettings;
use crate::frame::{Frame, FrameAssembler, RESPONSE_FRAME_NAME};
use crate::query::{build_query_text, parse_query_model, QueryDefaults, QueryError, QueryResult};
use crate::store::{ContainerRef, CosmosClient, DocumentStore};

/// Client availability, decided once when the data source is built
#[derive(Clone)]
enum ClientState {
    Ready(Arc<dyn DocumentStore>),
    Unavailable(String),
}

/// A configured data source: one shared client, many query batches
#[derive(Clone)]
pub struct DataSource {
    client: ClientState,
    defaults: QueryDefaults,
    query_concurrency: usize,
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let client = match &self.client {
            ClientState::Ready(store) => store.endpoint().to_string(),
            ClientState::Unavailable(reason) => format!("unavailable: {}", reason),
        };
        f.debug_struct("DataSource")
            .field("client", &client)
            .field("defaults", &self.defaults)
            .field("query_concurrency", &self.query_concurrency)
            .finish()
    }
}

impl DataSource {
    /// Build a data source and its Cosmos DB client from settings.
    ///
    /// Missing or invalid credentials do not fail construction: the data
    /// source is built without a client and every query reports why.
    pub fn new(settings: &DataSourceSettings) -> Self {
        let client = match settings.credentials() {
            Some((endpoint, key)) => match CosmosClient::new(endpoint, key, settings.client.clone()) {
                Ok(client) => {
                    tracing::info!(endpoint = %client.endpoint(), "Document store client created");
                    ClientState::Ready(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create document store client");
                    ClientState::Unavailable(e.to_string())
                }
            },
            None => {
                tracing::warn!("Endpoint URI or primary key not configured");
                ClientState::Unavailable(
                    "endpoint URI and primary key must both be configured".to_string(),
                )
            }
        };

        Self {
            client,
            defaults: settings.defaults.clone(),
            query_concurrency: settings.query_concurrency.max(1),
        }
    }

    /// Build a data source around an existing store
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            client: ClientState::Ready(store),
            defaults: QueryDefaults::default(),
            query_concurrency: 1,
        }
    }

    /// Build a data source that has no client
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            client: ClientState::Unavailable(reason.into()),
            defaults: QueryDefaults::default(),
            query_concurrency: 1,
        }
    }

    /// Builder method: query defaults
    pub fn defaults(mut self, defaults: QueryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Builder method: queries of one batch allowed to run at once
    pub fn query_concurrency(mut self, concurrency: usize) -> Self {
        self.query_concurrency = concurrency.max(1);
        self
    }

    /// The shared client, if one could be built
    pub fn store(&self) -> Option<&Arc<dyn DocumentStore>> {
        match &self.client {
            ClientState::Ready(store) => Some(store),
            ClientState::Unavailable(_) => None,
        }
    }

    /// Run a batch of queries
    pub async fn query_data(&self, request: QueryDataRequest) -> QueryDataResponse {
        self.query_data_with_cancel(request, &Cancellation::never()).await
    }

    /// Run a batch of queries, giving up on unfinished ones once `cancel` fires
    pub async fn query_data_with_cancel(
        &self,
        request: QueryDataRequest,
        cancel: &Cancellation,
    ) -> QueryDataResponse {
        tracing::debug!(queries = request.queries.len(), "QueryData called");

        let mut occurrences: BTreeMap<String, usize> = BTreeMap::new();
        for query in &request.queries {
            *occurrences.entry(query.ref_id.clone()).or_default() += 1;
        }

        // A shared key has room for one response only, so none of the
        // clashing queries run and the key reports the clash instead
        let mut responses = BTreeMap::new();
        let mut runnable = Vec::with_capacity(request.queries.len());
        for query in request.queries {
            match occurrences.get(&query.ref_id) {
                Some(&count) if count > 1 => {
                    if !responses.contains_key(&query.ref_id) {
                        let err = QueryError::Decode(format!(
                            "refId '{}' is used by {} queries in this batch",
                            query.ref_id, count
                        ));
                        tracing::warn!(ref_id = %query.ref_id, count, "Duplicate refId in batch");
                        responses.insert(query.ref_id.clone(), DataResponse::from_error(&err));
                    }
                }
                _ => runnable.push(query),
            }
        }

        let finished: Vec<(String, DataResponse)> = stream::iter(runnable)
            .map(|query| async move {
                let response = self.respond(&query, cancel).await;
                (query.ref_id, response)
            })
            .buffered(self.query_concurrency)
            .collect()
            .await;
        responses.extend(finished);

        QueryDataResponse { responses }
    }

    async fn respond(&self, query: &DataQuery, cancel: &Cancellation) -> DataResponse {
        match self.run_query(query, cancel).await {
            Ok(frame) => DataResponse::ok(frame),
            Err(err) => {
                tracing::warn!(ref_id = %query.ref_id, error = %err, "Query failed");
                DataResponse::from_error(&err)
            }
        }
    }

    /// Run one query to a frame
    pub async fn run_query(&self, query: &DataQuery, cancel: &Cancellation) -> QueryResult<Frame> {
        let store = match &self.client {
            ClientState::Ready(store) => store,
            ClientState::Unavailable(reason) => {
                return Err(QueryError::ClientConstruction(reason.clone()))
            }
        };

        if cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        let mut cancel = cancel.clone();
        tokio::select! {
            result = self.execute(store.as_ref(), query) => result,
            _ = cancel.cancelled() => Err(QueryError::Cancelled),
        }
    }

    async fn execute(&self, store: &dyn DocumentStore, query: &DataQuery) -> QueryResult<Frame> {
        let ref_id = query.ref_id.as_str();

        let model = parse_query_model(&query.json, &self.defaults)?;
        tracing::debug!(ref_id, ?model, "Parsed query model");

        let text = build_query_text(&model.columns, &query.time_range);
        tracing::debug!(ref_id, query = %text, "Built query text");

        let container = ContainerRef::new(&model.database, &model.container);
        let mut pager = store
            .query_items(&container, &text, &model.partition_key)
            .map_err(|e| QueryError::ClientConstruction(e.to_string()))?;

        let mut assembler = FrameAssembler::new(RESPONSE_FRAME_NAME);
        while pager.more() {
            let page = pager
                .next_page()
                .await
                .map_err(|e| QueryError::Paging(e.to_string()))?;
            tracing::debug!(ref_id, items = page.len(), "Fetched page");
            assembler.push_documents(page.items);
        }

        tracing::debug!(
            ref_id,
            rows = assembler.rows(),
            columns = ?assembler.columns(),
            malformed = assembler.malformed(),
            "Assembled frame"
        );
        Ok(assembler.finish())
    }

    /// Check that the client exists and the store answers
    pub async fn check_health(&self) -> CheckHealthResult {
        tracing::debug!("CheckHealth called");

        let store = match &self.client {
            ClientState::Ready(store) => store,
            ClientState::Unavailable(reason) => {
                return CheckHealthResult::error(format!(
                    "Failed to create document store client: {}",
                    reason
                ))
            }
        };

        match store.ping().await {
            Ok(()) => CheckHealthResult::ok(format!("Connected to {}", store.endpoint())),
            Err(e) => {
                tracing::error!(endpoint = %store.endpoint(), error = %e, "Health check failed");
                CheckHealthResult::error(format!("Cannot reach {}: {}", store.endpoint(), e))
            }
        }
    }
}
