//! Result shaping
//!
//! Turns heterogeneous JSON documents into a typed, time-indexed frame:
//!
//! - **types**: `Frame`, `Field`, `FieldValues`
//! - **accumulator**: per-column numeric/text inference
//! - **assembler**: column discovery, `_ts` extraction, frame building
//!
//! # Example
//!
//! ```rust
//! use cosmoframe::frame::{assemble_frame, FieldValues};
//!
//! let frame = assemble_frame([
//!     r#"{"_ts": 100, "a": "5"}"#,
//!     r#"{"_ts": 200, "a": "7"}"#,
//! ]);
//!
//! assert_eq!(frame.field_names(), vec!["time", "a"]);
//! assert_eq!(
//!     frame.field("a").unwrap().values,
//!     FieldValues::Number(vec![Some(5.0), Some(7.0)])
//! );
//! ```

mod accumulator;
mod assembler;
mod types;

pub use accumulator::{stringify, ColumnAccumulator, MISSING_VALUE};
pub use assembler::{assemble_frame, decode_document, parse_timestamp, FrameAssembler};
pub use types::{Field, FieldValues, Frame, RESPONSE_FRAME_NAME, TIME_FIELD};
