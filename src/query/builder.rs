//! Query text builder
//!
//! Turns a [`ColumnSpec`] and a [`TimeRange`] into Cosmos DB SQL:
//!
//! ```text
//! select c.temp,c.humidity,c._ts from docs c where c._ts > 999 and c._ts < 2001
//! select * from docs c where c._ts > 999 and c._ts < 2001
//! ```
//!
//! Column names are interpolated as-is.

use crate::query::model::{ColumnSpec, TimeRange};

/// Alias every projected field is namespaced under
pub const DOCUMENT_ALIAS: &str = "c";

/// System field holding the document's epoch-second timestamp
pub const TIMESTAMP_FIELD: &str = "_ts";

/// Build the projection clause
fn projection(columns: &ColumnSpec) -> String {
    match columns {
        ColumnSpec::Wildcard => "select *".to_string(),
        ColumnSpec::Columns(names) => {
            let fields: Vec<String> = names
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(TIMESTAMP_FIELD))
                .map(|name| format!("{}.{}", DOCUMENT_ALIAS, name))
                .collect();
            format!("select {}", fields.join(","))
        }
    }
}

/// Build the full query text with its `_ts` window predicate
pub fn build_query_text(columns: &ColumnSpec, range: &TimeRange) -> String {
    format!(
        "{} from docs {alias} where {alias}.{ts} > {} and {alias}.{ts} < {}",
        projection(columns),
        range.lower_bound_secs(),
        range.upper_bound_secs(),
        alias = DOCUMENT_ALIAS,
        ts = TIMESTAMP_FIELD,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn range() -> TimeRange {
        TimeRange::from_unix_seconds(1_000, 2_000).unwrap()
    }

    #[test]
    fn test_explicit_columns() {
        let text = build_query_text(&ColumnSpec::parse("temp, humidity"), &range());
        assert_eq!(
            text,
            "select c.temp,c.humidity,c._ts from docs c where c._ts > 999 and c._ts < 2001"
        );
    }

    #[test]
    fn test_single_column() {
        let text = build_query_text(&ColumnSpec::parse("a"), &range());
        assert!(text.starts_with("select c.a,c._ts from docs c"));
    }

    #[test]
    fn test_wildcard_anywhere() {
        let expected = "select * from docs c where c._ts > 999 and c._ts < 2001";
        assert_eq!(build_query_text(&ColumnSpec::parse("*"), &range()), expected);
        assert_eq!(build_query_text(&ColumnSpec::parse("a, b, *"), &range()), expected);
    }

    #[test]
    fn test_exactly_one_predicate() {
        let text = build_query_text(&ColumnSpec::parse("x,y,z"), &range());
        assert_eq!(text.matches(" where ").count(), 1);
        assert_eq!(text.matches("c._ts > 999 and c._ts < 2001").count(), 1);
    }

    #[test]
    fn test_fractional_bounds() {
        let range = TimeRange::new(
            Utc.timestamp_opt(1_700_000_000, 900_000_000).unwrap(),
            Utc.timestamp_opt(1_700_003_600, 100_000_000).unwrap(),
        );
        let text = build_query_text(&ColumnSpec::Wildcard, &range);
        assert!(text.ends_with("where c._ts > 1699999999 and c._ts < 1700003602"));
    }
}
