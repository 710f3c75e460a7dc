//! Query model
//!
//! Decodes the per-query configuration sent by the query editor into a
//! [`QueryModel`]. The editor sends camelCase keys (`partitionKey`), older
//! saved dashboards carry PascalCase keys (`PartitionKey`); both are accepted.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::query::error::{QueryError, QueryResult};

/// Column token that selects whole documents
pub const WILDCARD: &str = "*";

/// Time range attached to a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range
    pub from: DateTime<Utc>,
    /// End of the range
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Create a new time range. `from <= to` is assumed, not checked.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Create a time range from epoch seconds
    pub fn from_unix_seconds(from: i64, to: i64) -> Option<Self> {
        Some(Self {
            from: Utc.timestamp_opt(from, 0).single()?,
            to: Utc.timestamp_opt(to, 0).single()?,
        })
    }

    /// Create a range covering the last N hours up to now, starting at the
    /// earliest representable instant when N reaches past it
    pub fn last_hours(hours: i64) -> Self {
        let to = Utc::now();
        let from = chrono::Duration::try_hours(hours)
            .and_then(|span| to.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { from, to }
    }

    /// Exclusive lower `_ts` bound: `floor(from) - 1`
    pub fn lower_bound_secs(&self) -> i64 {
        self.from.timestamp() - 1
    }

    /// Exclusive upper `_ts` bound: `ceil(to) + 1`
    pub fn upper_bound_secs(&self) -> i64 {
        let ceil = if self.to.timestamp_subsec_nanos() > 0 {
            self.to.timestamp() + 1
        } else {
            self.to.timestamp()
        };
        ceil + 1
    }
}

/// Which document fields to project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    /// `select *`
    Wildcard,
    /// Explicit, ordered, non-empty list of field names
    Columns(Vec<String>),
}

impl ColumnSpec {
    /// Parse a comma-separated column list.
    ///
    /// Tokens are trimmed and empty tokens dropped. Any token containing `*`
    /// turns the whole spec into [`ColumnSpec::Wildcard`], and so does a list
    /// with no tokens left.
    pub fn parse(columns: &str) -> Self {
        let tokens: Vec<String> = columns
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();

        if tokens.is_empty() || tokens.iter().any(|token| token.contains(WILDCARD)) {
            ColumnSpec::Wildcard
        } else {
            ColumnSpec::Columns(tokens)
        }
    }

    /// Check if this selects whole documents
    pub fn is_wildcard(&self) -> bool {
        matches!(self, ColumnSpec::Wildcard)
    }
}

/// Decoded per-query configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryModel {
    pub database: String,
    pub container: String,
    pub partition_key: String,
    pub columns: ColumnSpec,
}

/// Data-source level fallbacks for fields a query leaves out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDefaults {
    pub database: Option<String>,
    pub container: Option<String>,
    pub partition_key: Option<String>,
}

/// Wire shape of the query configuration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQueryModel {
    #[serde(default, alias = "Database")]
    database: Option<String>,
    #[serde(default, alias = "Container")]
    container: Option<String>,
    #[serde(default, alias = "PartitionKey")]
    partition_key: Option<String>,
    #[serde(default, alias = "Columns")]
    columns: Option<String>,
}

/// Pick the query's own value unless it is absent or blank
fn or_default(value: Option<String>, fallback: &Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| fallback.clone())
        .unwrap_or_default()
}

/// Decode a query's raw JSON configuration
pub fn parse_query_model(raw: &[u8], defaults: &QueryDefaults) -> QueryResult<QueryModel> {
    let parsed: RawQueryModel = serde_json::from_slice(raw)?;

    let model = QueryModel {
        database: or_default(parsed.database, &defaults.database),
        container: or_default(parsed.container, &defaults.container),
        partition_key: or_default(parsed.partition_key, &defaults.partition_key),
        columns: ColumnSpec::parse(parsed.columns.as_deref().unwrap_or(WILDCARD)),
    };

    if model.database.is_empty() {
        return Err(QueryError::Decode("database is required".to_string()));
    }
    if model.container.is_empty() {
        return Err(QueryError::Decode("container is required".to_string()));
    }

    Ok(model)
}
