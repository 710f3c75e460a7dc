//! Frame assembler
//!
//! Consumes raw JSON documents in paging order and builds a [`Frame`]:
//!
//! ```text
//! bytes → decode → discover columns (first document) → _ts → accumulate → Frame
//! ```
//!
//! Columns are discovered from the first document that has any field besides
//! `_ts` and are sorted lexically, so column order never depends on the key
//! order the store happened to return. Every field of the finished frame has
//! exactly one entry per document pushed.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::frame::accumulator::{stringify, ColumnAccumulator};
use crate::frame::types::{Field, FieldValues, Frame, RESPONSE_FRAME_NAME, TIME_FIELD};
use crate::query::TIMESTAMP_FIELD;

/// Incrementally builds a frame from raw documents
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    name: String,
    columns: Vec<String>,
    accumulators: Vec<ColumnAccumulator>,
    times: Vec<DateTime<Utc>>,
    malformed: usize,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(RESPONSE_FRAME_NAME)
    }
}

impl FrameAssembler {
    /// Create an assembler for a frame with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            accumulators: Vec::new(),
            times: Vec::new(),
            malformed: 0,
        }
    }

    /// Discovered columns, in frame order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of documents pushed so far
    pub fn rows(&self) -> usize {
        self.times.len()
    }

    /// Number of documents that failed to decode
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Push a batch of raw documents
    pub fn push_documents<I, D>(&mut self, documents: I)
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        for document in documents {
            self.push_document(document.as_ref());
        }
    }

    /// Push one raw document.
    ///
    /// A document that is not a JSON object still produces a row: epoch-zero
    /// time and every column treated as absent.
    pub fn push_document(&mut self, raw: &[u8]) {
        let fields = match decode_document(raw) {
            Some(fields) => fields,
            None => {
                self.malformed += 1;
                tracing::warn!(row = self.rows(), "Skipping fields of malformed document");
                Map::new()
            }
        };
        self.push_fields(&fields);
    }

    /// Push one decoded document
    pub fn push_fields(&mut self, fields: &Map<String, Value>) {
        if self.columns.is_empty() {
            self.discover_columns(fields);
        }

        self.times.push(parse_timestamp(fields.get(TIMESTAMP_FIELD)));

        for (column, accumulator) in self.columns.iter().zip(self.accumulators.iter_mut()) {
            accumulator.push_value(fields.get(column));
        }
    }

    fn discover_columns(&mut self, fields: &Map<String, Value>) {
        let mut columns: Vec<String> = fields
            .keys()
            .filter(|key| key.as_str() != TIMESTAMP_FIELD)
            .cloned()
            .collect();
        if columns.is_empty() {
            return;
        }
        columns.sort();

        let gaps = self.rows();
        tracing::debug!(?columns, backfill = gaps, "Discovered columns");
        self.accumulators = columns.iter().map(|_| ColumnAccumulator::with_gaps(gaps)).collect();
        self.columns = columns;
    }

    /// Finish the frame: `time` first, then one field per column
    pub fn finish(self) -> Frame {
        let mut frame = Frame::new(self.name)
            .with_field(Field::new(TIME_FIELD, FieldValues::Time(self.times)));

        for (column, accumulator) in self.columns.into_iter().zip(self.accumulators) {
            frame = frame.with_field(Field::new(column, accumulator.into_values()));
        }

        frame
    }
}

/// Decode a raw document into its field map; `None` if it is not a JSON object
pub fn decode_document(raw: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}

/// Convert a `_ts` value (number or numeric string, epoch seconds) to an
/// instant. Fractional seconds are truncated; anything unparseable is the
/// epoch.
pub fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(stringify)
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|secs| secs.is_finite())
        .and_then(|secs| Utc.timestamp_opt(secs.trunc() as i64, 0).single())
        .unwrap_or_default()
}

/// Build a frame from a sequence of raw documents in one go
pub fn assemble_frame<I, D>(documents: I) -> Frame
where
    I: IntoIterator<Item = D>,
    D: AsRef<[u8]>,
{
    let mut assembler = FrameAssembler::default();
    assembler.push_documents(documents);
    assembler.finish()
}
