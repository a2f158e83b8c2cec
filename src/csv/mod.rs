//! Delimited Codec
//!
//! Converts between the raw-text view of a `.csv`/`.tsv` file and its
//! structured [`Grid`] view:
//!
//! ```text
//! raw text ──parse_csv──▶ Grid (header + rows) ──serialize_csv──▶ raw text
//! ```
//!
//! Both directions are pure. The row-length check runs whenever text is
//! committed back to structured form, never per keystroke.

mod model;
mod parser;

pub use model::{CellPosition, Delimiter, Grid};
pub use parser::{
    count_records, detect_delimiter, parse_block, parse_csv, read_record, serialize_csv,
    ParseError, ParseErrorKind,
};
