//! Query front end
//!
//! Everything needed to get from the query editor's configuration to query
//! text the document store understands:
//!
//! - **Model**: decode the raw per-query JSON into a [`QueryModel`]
//! - **Builder**: render the column spec and time range as Cosmos DB SQL
//! - **Error**: the per-query error taxonomy
//!
//! # Example
//!
//! ```rust
//! use cosmoframe::query::{build_query_text, parse_query_model, QueryDefaults, TimeRange};
//!
//! let raw = br#"{"database":"iot","container":"readings","partitionKey":"dev-1","columns":"temp"}"#;
//! let model = parse_query_model(raw, &QueryDefaults::default()).unwrap();
//! let range = TimeRange::from_unix_seconds(1_000, 2_000).unwrap();
//!
//! assert_eq!(
//!     build_query_text(&model.columns, &range),
//!     "select c.temp,c._ts from docs c where c._ts > 999 and c._ts < 2001"
//! );
//! ```

mod builder;
mod error;
mod model;

pub use builder::{build_query_text, DOCUMENT_ALIAS, TIMESTAMP_FIELD};
pub use error::{QueryError, QueryResult};
pub use model::{parse_query_model, ColumnSpec, QueryDefaults, QueryModel, TimeRange, WILDCARD};
