//! Grid value types shared by the codec and the document model
//!
//! A [`Grid`] is a rectangular table of text cells where row 0 is the header.

use std::collections::HashSet;
use std::path::Path;

use super::parser::{ParseError, ParseErrorKind};

/// Supported field delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    /// Get the character for this delimiter
    pub fn char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }

    /// Get the delimiter as the single byte the csv reader/writer expects
    pub fn byte(self) -> u8 {
        self.char() as u8
    }

    /// Detect delimiter from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "tsv" | "tab" => Delimiter::Tab,
            _ => Delimiter::Comma,
        }
    }

    /// Detect delimiter from a path's extension, if it has a delimited-file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Delimiter::Comma),
            "tsv" | "tab" => Some(Delimiter::Tab),
            _ => None,
        }
    }
}

/// Position of a cell in the grid (row 0 is the header)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellPosition {
    pub row: usize,
    pub col: usize,
}

impl CellPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Structured representation of a delimited file.
///
/// Invariants: every row has the header's length, and header names are pairwise
/// distinct. An empty grid has no rows at all (not even a header).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from rows, checking rectangularity and header uniqueness.
    ///
    /// Errors report 1-based line numbers as if each row were one line of text.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, ParseError> {
        let lines: Vec<usize> = (1..=rows.len()).collect();
        check_shape(&rows, &lines)?;
        Ok(Self { rows })
    }

    /// Build a grid with only a header row
    pub fn with_header<I, S>(names: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_rows(vec![names.into_iter().map(Into::into).collect()])
    }

    pub(crate) fn from_rows_unchecked(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<String>> {
        &mut self.rows
    }

    /// Number of rows including the header
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of data rows (excluding the header)
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Number of columns (the header's length)
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Header row, if the grid has one
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// All rows, header first
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Get a row by index
    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Get cell value at position
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Index of the header field named `name` (case-sensitive)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header()?.iter().position(|field| field == name)
    }

    /// Values of one column across all data rows
    pub fn column_values(&self, col: usize) -> Option<Vec<String>> {
        if col >= self.column_count() {
            return None;
        }
        Some(self.rows.iter().skip(1).map(|row| row[col].clone()).collect())
    }

    /// Check if data is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when every row has the header's length
    pub fn is_rectangular(&self) -> bool {
        let width = self.column_count();
        self.rows.iter().all(|row| row.len() == width)
    }
}

/// Validate rectangularity and header uniqueness. `lines[i]` is the source line of `rows[i]`.
pub(crate) fn check_shape(rows: &[Vec<String>], lines: &[usize]) -> Result<(), ParseError> {
    let Some(header) = rows.first() else {
        return Ok(());
    };
    let line_of = |i: usize| lines.get(i).copied().unwrap_or(i + 1);

    let mut seen = HashSet::with_capacity(header.len());
    for name in header {
        if !seen.insert(name.as_str()) {
            return Err(ParseError {
                kind: ParseErrorKind::DuplicateHeader { name: name.clone() },
                line: line_of(0),
            });
        }
    }

    let expected = header.len();
    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.len() != expected {
            return Err(ParseError {
                kind: ParseErrorKind::RowLengthMismatch {
                    expected,
                    actual: row.len(),
                },
                line: line_of(i),
            });
        }
    }
    Ok(())
}
