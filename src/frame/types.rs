//! Frame types
//!
//! A [`Frame`] is the columnar table handed back to the dashboard:
//! - `Frame`: named, ordered list of fields
//! - `Field`: one named column
//! - `FieldValues`: the column's typed values (time, number or string)
//!
//! Gaps are `None` and serialize as JSON `null`. Time values serialize as
//! epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Name of the time field every frame starts with
pub const TIME_FIELD: &str = "time";

/// Name given to frames built from query results
pub const RESPONSE_FRAME_NAME: &str = "response";

/// Typed values of a single field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    Time(Vec<DateTime<Utc>>),
    Number(Vec<Option<f64>>),
    String(Vec<Option<String>>),
}

impl FieldValues {
    /// Number of values (gaps included)
    pub fn len(&self) -> usize {
        match self {
            FieldValues::Time(v) => v.len(),
            FieldValues::Number(v) => v.len(),
            FieldValues::String(v) => v.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type tag used on the wire
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValues::Time(_) => "time",
            FieldValues::Number(_) => "number",
            FieldValues::String(_) => "string",
        }
    }

    pub fn as_times(&self) -> Option<&[DateTime<Utc>]> {
        match self {
            FieldValues::Time(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_numbers(&self) -> Option<&[Option<f64>]> {
        match self {
            FieldValues::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[Option<String>]> {
        match self {
            FieldValues::String(v) => Some(v),
            _ => None,
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub values: FieldValues,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, values: FieldValues) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of values in this field
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Field", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", self.values.type_name())?;
        match &self.values {
            FieldValues::Time(times) => {
                let millis: Vec<i64> = times.iter().map(|t| t.timestamp_millis()).collect();
                state.serialize_field("values", &millis)?;
            }
            FieldValues::Number(numbers) => state.serialize_field("values", numbers)?,
            FieldValues::String(strings) => state.serialize_field("values", strings)?,
        }
        state.end()
    }
}

/// A named, time-indexed columnar table
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Frame {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Frame {
    /// Create an empty frame
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder method: append a field
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in frame order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Number of rows (length of the first field)
    pub fn row_count(&self) -> usize {
        self.fields.first().map(Field::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_frame_serialization() {
        let frame = Frame::new(RESPONSE_FRAME_NAME)
            .with_field(Field::new(
                TIME_FIELD,
                FieldValues::Time(vec![Utc.timestamp_opt(100, 0).unwrap()]),
            ))
            .with_field(Field::new("temp", FieldValues::Number(vec![Some(21.5)])))
            .with_field(Field::new("room", FieldValues::String(vec![None])));

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "response",
                "fields": [
                    {"name": "time", "type": "time", "values": [100000]},
                    {"name": "temp", "type": "number", "values": [21.5]},
                    {"name": "room", "type": "string", "values": [null]},
                ]
            })
        );
    }

    #[test]
    fn test_frame_lookup() {
        let frame = Frame::new("f")
            .with_field(Field::new(TIME_FIELD, FieldValues::Time(vec![])))
            .with_field(Field::new("a", FieldValues::Number(vec![])));

        assert_eq!(frame.field_names(), vec!["time", "a"]);
        assert!(frame.field("a").is_some());
        assert!(frame.field("b").is_none());
        assert_eq!(frame.row_count(), 0);
    }
}
