//! Per-column type inference
//!
//! A column starts [`ColumnAccumulator::Empty`] and locks to numeric or text
//! on its first non-null value. JSON `null` never decides the type; it is
//! recorded as a gap in whichever variant the column is in.
//!
//! A document that lacks the column's key contributes [`MISSING_VALUE`]. The
//! sentinel is not a number, so it locks an empty column to text and degrades
//! a numeric one.
//!
//! A numeric column that later sees a value that does not parse as a float
//! is degraded to text: every number recorded so far is re-cast to its
//! string form and the column stays text from then on.

use serde_json::Value;

use crate::frame::types::FieldValues;

/// Text recorded for a document that lacks the column's key
pub const MISSING_VALUE: &str = "<missing>";

/// Typed value buffer for one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnAccumulator {
    /// No non-null value seen yet; `gaps` nulls recorded
    Empty { gaps: usize },
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Default for ColumnAccumulator {
    fn default() -> Self {
        ColumnAccumulator::Empty { gaps: 0 }
    }
}

impl ColumnAccumulator {
    /// Create an accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator that already holds `gaps` nulls, for columns
    /// discovered after some rows were recorded
    pub fn with_gaps(gaps: usize) -> Self {
        ColumnAccumulator::Empty { gaps }
    }

    /// Number of values recorded, gaps included
    pub fn len(&self) -> usize {
        match self {
            ColumnAccumulator::Empty { gaps } => *gaps,
            ColumnAccumulator::Numeric(v) => v.len(),
            ColumnAccumulator::Text(v) => v.len(),
        }
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the column is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnAccumulator::Numeric(_))
    }

    /// Record a JSON value (`None` when the document lacks the field)
    pub fn push_value(&mut self, value: Option<&Value>) {
        match value {
            Some(value) => self.push(stringify(value).as_deref()),
            None => self.push(Some(MISSING_VALUE)),
        }
    }

    /// Record a stringified value; `None` is a gap
    pub fn push(&mut self, raw: Option<&str>) {
        let Some(raw) = raw else {
            match self {
                ColumnAccumulator::Empty { gaps } => *gaps += 1,
                ColumnAccumulator::Numeric(v) => v.push(None),
                ColumnAccumulator::Text(v) => v.push(None),
            }
            return;
        };

        let parsed = raw.parse::<f64>().ok();
        match self {
            ColumnAccumulator::Empty { gaps } => {
                let gaps = *gaps;
                *self = match parsed {
                    Some(number) => {
                        let mut values = vec![None; gaps];
                        values.push(Some(number));
                        ColumnAccumulator::Numeric(values)
                    }
                    None => {
                        let mut values = vec![None; gaps];
                        values.push(Some(raw.to_string()));
                        ColumnAccumulator::Text(values)
                    }
                };
            }
            ColumnAccumulator::Numeric(values) => match parsed {
                Some(number) => values.push(Some(number)),
                None => {
                    let mut text = recast_to_text(values);
                    text.push(Some(raw.to_string()));
                    *self = ColumnAccumulator::Text(text);
                }
            },
            ColumnAccumulator::Text(values) => values.push(Some(raw.to_string())),
        }
    }

    /// Final typed values. A column that never saw a value is all-null text.
    pub fn into_values(self) -> FieldValues {
        match self {
            ColumnAccumulator::Empty { gaps } => FieldValues::String(vec![None; gaps]),
            ColumnAccumulator::Numeric(v) => FieldValues::Number(v),
            ColumnAccumulator::Text(v) => FieldValues::String(v),
        }
    }
}

fn recast_to_text(numbers: &[Option<f64>]) -> Vec<Option<String>> {
    numbers
        .iter()
        .map(|n| n.map(|n| n.to_string()))
        .collect()
}

/// Render a JSON value as the text its type is inferred from.
///
/// `null` has no text form and is a gap.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_column() {
        let mut acc = ColumnAccumulator::new();
        acc.push(Some("5"));
        acc.push(Some("7.25"));
        assert!(acc.is_numeric());
        assert_eq!(acc.into_values(), FieldValues::Number(vec![Some(5.0), Some(7.25)]));
    }

    #[test]
    fn test_text_column_stays_text() {
        let mut acc = ColumnAccumulator::new();
        acc.push(Some("x"));
        acc.push(Some("42"));
        assert_eq!(
            acc.into_values(),
            FieldValues::String(vec![Some("x".to_string()), Some("42".to_string())])
        );
    }

    #[test]
    fn test_degrade_to_text() {
        let mut acc = ColumnAccumulator::new();
        acc.push(Some("1"));
        acc.push(None);
        acc.push(Some("2.5"));
        acc.push(Some("n/a"));
        acc.push(Some("3"));

        assert_eq!(
            acc.into_values(),
            FieldValues::String(vec![
                Some("1".to_string()),
                None,
                Some("2.5".to_string()),
                Some("n/a".to_string()),
                Some("3".to_string()),
            ])
        );
    }

    #[test]
    fn test_leading_gaps_do_not_decide_type() {
        let mut acc = ColumnAccumulator::with_gaps(1);
        acc.push(None);
        assert_eq!(acc.len(), 2);

        acc.push(Some("9"));
        assert_eq!(acc.into_values(), FieldValues::Number(vec![None, None, Some(9.0)]));
    }

    #[test]
    fn test_all_gaps_is_null_text() {
        let mut acc = ColumnAccumulator::new();
        acc.push(None);
        acc.push(None);
        assert_eq!(acc.into_values(), FieldValues::String(vec![None, None]));
    }

    #[test]
    fn test_push_json_values() {
        let mut acc = ColumnAccumulator::new();
        acc.push_value(Some(&json!(3)));
        acc.push_value(Some(&json!("4")));
        acc.push_value(Some(&Value::Null));
        assert_eq!(
            acc.clone().into_values(),
            FieldValues::Number(vec![Some(3.0), Some(4.0), None])
        );

        acc.push_value(None);
        assert_eq!(
            acc.into_values(),
            FieldValues::String(vec![
                Some("3".to_string()),
                Some("4".to_string()),
                None,
                Some(MISSING_VALUE.to_string()),
            ])
        );

        let mut acc = ColumnAccumulator::new();
        acc.push_value(Some(&json!(true)));
        acc.push_value(Some(&json!({"k": 1})));
        assert_eq!(
            acc.into_values(),
            FieldValues::String(vec![Some("true".to_string()), Some("{\"k\":1}".to_string())])
        );
    }

    #[test]
    fn test_absent_key_locks_empty_column_to_text() {
        let mut acc = ColumnAccumulator::with_gaps(1);
        acc.push_value(None);
        acc.push_value(Some(&json!(12)));
        assert_eq!(
            acc.into_values(),
            FieldValues::String(vec![
                None,
                Some(MISSING_VALUE.to_string()),
                Some("12".to_string()),
            ])
        );
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(stringify(&json!(1612345678)), Some("1612345678".to_string()));
        assert_eq!(stringify(&json!("abc")), Some("abc".to_string()));
        assert_eq!(stringify(&json!([1, 2])), Some("[1,2]".to_string()));
        assert_eq!(stringify(&Value::Null), None);
    }
}
