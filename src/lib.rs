//! # cosmoframe
//!
//! Query Azure Cosmos DB containers from a visual query editor and get back
//! typed, column-oriented data frames.
//!
//! ## Pipeline
//!
//! ```text
//! query JSON ─▶ QueryModel ─▶ query text ─▶ ResultPager ─▶ FrameAssembler ─▶ Frame
//! ```
//!
//! ## Modules
//!
//! - [`query`]: decode query configuration, build Cosmos DB SQL
//! - [`store`]: document store capability (Cosmos DB REST, in-memory)
//! - [`frame`]: infer column types and assemble frames from raw documents
//! - [`datasource`]: run query batches with per-query error isolation
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cosmoframe::config::Config;
//! use cosmoframe::datasource::{DataQuery, DataSource, QueryDataRequest};
//! use cosmoframe::query::TimeRange;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env();
//!     let datasource = DataSource::new(&config.to_settings());
//!
//!     let query = DataQuery::new(
//!         "A",
//!         TimeRange::last_hours(24),
//!         r#"{"database":"iot","container":"readings","partitionKey":"dev-1","columns":"temp,humidity"}"#,
//!     );
//!     let response = datasource.query_data(QueryDataRequest::new(vec![query])).await;
//!
//!     for (ref_id, result) in &response.responses {
//!         println!("{}: {:?}", ref_id, result.status);
//!     }
//! }
//! ```

pub mod api;
pub mod config;
pub mod datasource;
pub mod frame;
pub mod query;
pub mod store;

// Re-export top-level types for convenience
pub use query::{
    build_query_text, parse_query_model, ColumnSpec, QueryDefaults, QueryError, QueryModel,
    QueryResult, TimeRange,
};

pub use store::{
    ContainerRef, CosmosClient, CosmosClientOptions, DocumentStore, MemoryStore, Page,
    ResultPager, StoreError, StoreResult,
};

pub use frame::{assemble_frame, Field, FieldValues, Frame, FrameAssembler};

pub use datasource::{
    CheckHealthResult, DataQuery, DataResponse, DataSource, DataSourceSettings,
    QueryDataRequest, QueryDataResponse, ResponseStatus,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{
    ApiConfig as ConfigApiConfig, Config, ConfigError, DatasourceConfig, LoggingConfig,
};
