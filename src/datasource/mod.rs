//! Data Source
//!
//! A data source instance owns one document store client, built once from
//! [`DataSourceSettings`] and shared by every batch it serves. A batch is a
//! [`QueryDataRequest`]; each query inside it is decoded, turned into query
//! text, paged and assembled into a frame independently, so one bad query
//! never costs the others their results.
//!
//! ```rust
//! use cosmoframe::datasource::{DataQuery, DataSource, QueryDataRequest};
//! use cosmoframe::query::TimeRange;
//! use cosmoframe::store::{ContainerRef, MemoryStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = MemoryStore::new().with_values(
//!     ContainerRef::new("iot", "readings"),
//!     vec![json!({"_ts": 100, "temp": 21.5})],
//! );
//! let datasource = DataSource::with_store(Arc::new(store));
//!
//! let query = DataQuery::new(
//!     "A",
//!     TimeRange::from_unix_seconds(0, 200).unwrap(),
//!     r#"{"database":"iot","container":"readings","partitionKey":"dev-1"}"#,
//! );
//! let response = datasource.query_data(QueryDataRequest::new(vec![query])).await;
//! assert!(response.get("A").unwrap().is_ok());
//! # }
//! ```

mod cancel;
mod health;
mod orchestrator;
mod request;
mod settings;

pub use cancel::{cancellation, CancelHandle, Cancellation};
pub use health::{CheckHealthResult, HealthStatus};
pub use orchestrator::DataSource;
pub use request::{DataQuery, DataResponse, QueryDataRequest, QueryDataResponse, ResponseStatus};
pub use settings::DataSourceSettings;
