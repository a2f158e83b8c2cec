//! Delimited text codec using the csv crate
//!
//! RFC 4180 compliant parsing with support for quoted fields,
//! escaped quotes, and embedded newlines. Serialization quotes only
//! fields that need it, so `parse_csv(serialize_csv(g)) == g`.

use std::io::{self, Cursor};

use super::model::{check_shape, Delimiter, Grid};

/// What went wrong while turning raw text into a grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A data row's field count differs from the header's
    RowLengthMismatch { expected: usize, actual: usize },
    /// Two header fields share a name
    DuplicateHeader { name: String },
    /// The csv reader rejected the input
    Malformed(String),
}

/// Error type for CSV parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based line on which the offending record starts
    pub line: usize,
}

impl ParseError {
    /// Column count the header dictates, for row length mismatches
    pub fn expected_column_count(&self) -> Option<usize> {
        match self.kind {
            ParseErrorKind::RowLengthMismatch { expected, .. } => Some(expected),
            _ => None,
        }
    }

    /// Column count actually found on the offending line
    pub fn actual_column_count(&self) -> Option<usize> {
        match self.kind {
            ParseErrorKind::RowLengthMismatch { actual, .. } => Some(actual),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ParseErrorKind::RowLengthMismatch { expected, actual } => write!(
                f,
                "CSV parse error at line {}: found {} columns, expected {}",
                self.line, actual, expected
            ),
            ParseErrorKind::DuplicateHeader { name } => write!(
                f,
                "CSV parse error at line {}: duplicate header field {:?}",
                self.line, name
            ),
            ParseErrorKind::Malformed(message) => {
                write!(f, "CSV parse error at line {}: {}", self.line, message)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse delimited text into a [`Grid`]
///
/// The first record is the header. Every following record must have the same
/// number of fields, and header names must be unique.
pub fn parse_csv(content: &str, delimiter: Delimiter) -> Result<Grid, ParseError> {
    let cursor = Cursor::new(content.as_bytes());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(cursor);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut lines: Vec<usize> = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ParseError {
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1),
            kind: ParseErrorKind::Malformed(e.to_string()),
        })?;

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);
        lines.push(line);
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    check_shape(&rows, &lines)?;
    Ok(Grid::from_rows_unchecked(rows))
}

/// Read the fields of record `index` (0-based) without any shape checks.
///
/// Used to look up a header that sits below leading metadata rows, where the
/// rows above it may be ragged.
pub fn read_record(
    content: &str,
    delimiter: Delimiter,
    index: usize,
) -> Result<Option<Vec<String>>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(content.as_bytes()));

    match reader.records().nth(index) {
        None => Ok(None),
        Some(Ok(record)) => Ok(Some(record.iter().map(|s| s.to_string()).collect())),
        Some(Err(e)) => Err(ParseError {
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1),
            kind: ParseErrorKind::Malformed(e.to_string()),
        }),
    }
}

/// Number of records in `content`, ragged or not
pub fn count_records(content: &str, delimiter: Delimiter) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(content.as_bytes()))
        .records()
        .count()
}

/// Parse a tab-separated block, such as text copied from a spreadsheet.
///
/// Line endings are normalized to `\n` and rows may be ragged. Trailing rows
/// whose fields are all empty are dropped.
pub fn parse_block(text: &str) -> Result<Vec<Vec<String>>, ParseError> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(Delimiter::Tab.byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ParseError {
            line: e
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1),
            kind: ParseErrorKind::Malformed(e.to_string()),
        })?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    while rows
        .last()
        .is_some_and(|row| row.iter().all(String::is_empty))
    {
        rows.pop();
    }
    Ok(rows)
}

/// Serialize a grid back to delimited text
///
/// Fields are quoted only when they contain the delimiter, a quote or a line
/// break. Records end with `\n`. A grid without columns has no textual form
/// and serializes to the empty string.
pub fn serialize_csv(grid: &Grid, delimiter: Delimiter) -> io::Result<String> {
    if grid.column_count() == 0 {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.byte())
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in grid.rows() {
        writer.write_record(row)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Detect delimiter by analyzing first few lines
pub fn detect_delimiter(content: &str) -> Delimiter {
    let first_lines: String = content.lines().take(5).collect::<Vec<_>>().join("\n");

    let comma_count = first_lines.matches(',').count();
    let tab_count = first_lines.matches('\t').count();

    if tab_count > comma_count {
        Delimiter::Tab
    } else {
        Delimiter::Comma
    }
}
