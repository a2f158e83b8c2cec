//! Grid Document - structured state of one delimited file
//!
//! All mutation funnels through [`GridDocument::apply`], which validates the
//! whole command before touching any row. A failed command leaves the grid
//! exactly as it was.

use std::io;
use std::path::{Path, PathBuf};

use super::command::EditCommand;
use crate::csv::{parse_csv, serialize_csv, Delimiter, Grid, ParseError};

/// Which extent an out-of-bounds index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Error type for grid edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// `index` is outside `0..len` (or `0..=len` for insertions)
    OutOfBounds { axis: Axis, index: usize, len: usize },
    /// A header field with this name already exists
    DuplicateName(String),
    /// The edit is not allowed in the document's current state
    InvalidOperation(String),
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::OutOfBounds { axis, index, len } => {
                write!(f, "{} index {} out of bounds (extent {})", axis, index, len)
            }
            GridError::DuplicateName(name) => {
                write!(f, "a column named {:?} already exists", name)
            }
            GridError::InvalidOperation(message) => write!(f, "invalid operation: {}", message),
        }
    }
}

impl std::error::Error for GridError {}

fn invalid(message: impl Into<String>) -> GridError {
    GridError::InvalidOperation(message.into())
}

fn out_of_bounds(axis: Axis, index: usize, len: usize) -> GridError {
    GridError::OutOfBounds { axis, index, len }
}

/// Structured in-memory representation of one delimited file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDocument {
    /// Path to the file on disk (None for new/unsaved documents)
    path: Option<PathBuf>,
    /// Fixed at load time
    delimiter: Delimiter,
    grid: Grid,
    /// Whether the grid has unsaved changes
    dirty: bool,
    /// Incremented on each applied command
    revision: u64,
}

impl GridDocument {
    /// Create an empty document
    pub fn new(delimiter: Delimiter) -> Self {
        Self::from_grid(Grid::new(), delimiter)
    }

    /// Wrap an already validated grid
    pub fn from_grid(grid: Grid, delimiter: Delimiter) -> Self {
        Self {
            path: None,
            delimiter,
            grid,
            dirty: false,
            revision: 0,
        }
    }

    /// Parse raw text into a document
    pub fn parse(text: &str, delimiter: Delimiter) -> Result<Self, ParseError> {
        Ok(Self::from_grid(parse_csv(text, delimiter)?, delimiter))
    }

    /// Attach the file path this document was loaded from
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of rows including the header
    pub fn row_count(&self) -> usize {
        self.grid.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.grid.column_count()
    }

    pub fn header(&self) -> Option<&[String]> {
        self.grid.header()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.grid.get(row, col)
    }

    /// Serialize to the raw-text view
    pub fn to_text(&self) -> io::Result<String> {
        serialize_csv(&self.grid, self.delimiter)
    }

    /// Clear the dirty flag after an external save
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// First of `base`, `base_2`, `base_3`, ... not already used as a header name
    pub fn unique_column_name(&self, base: &str) -> String {
        if self.grid.column_index(base).is_none() {
            return base.to_string();
        }
        let mut counter = 2;
        loop {
            let candidate = format!("{}_{}", base, counter);
            if self.grid.column_index(&candidate).is_none() {
                return candidate;
            }
            counter += 1;
        }
    }

    // === Command-producing edits ===

    /// Set a cell value. Writing row 0 renames the column instead.
    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        value: impl Into<String>,
    ) -> Result<EditCommand, GridError> {
        if row >= self.row_count() {
            return Err(out_of_bounds(Axis::Row, row, self.row_count()));
        }
        if col >= self.column_count() {
            return Err(out_of_bounds(Axis::Column, col, self.column_count()));
        }
        if row == 0 {
            return self.rename_column(col, value);
        }
        let cmd = EditCommand::SetCell {
            row,
            col,
            old_value: self.grid.rows()[row][col].clone(),
            new_value: value.into(),
        };
        self.apply(&cmd)?;
        Ok(cmd)
    }

    /// Insert a data row at `index` (1..=row_count). Without `content` the
    /// row is filled with empty strings.
    pub fn insert_row(
        &mut self,
        index: usize,
        content: Option<Vec<String>>,
    ) -> Result<EditCommand, GridError> {
        let content = content.unwrap_or_else(|| vec![String::new(); self.column_count()]);
        let cmd = EditCommand::InsertRow { index, content };
        self.apply(&cmd)?;
        Ok(cmd)
    }

    /// Delete the data row at `index`. The header cannot be deleted.
    pub fn delete_row(&mut self, index: usize) -> Result<EditCommand, GridError> {
        if index == 0 {
            return Err(invalid("the header row cannot be deleted"));
        }
        let removed = self
            .grid
            .row(index)
            .ok_or_else(|| out_of_bounds(Axis::Row, index, self.row_count()))?
            .to_vec();
        let cmd = EditCommand::DeleteRow { index, removed };
        self.apply(&cmd)?;
        Ok(cmd)
    }

    /// Insert a column named `name` at `index`, filling data rows with `default`
    pub fn insert_column(
        &mut self,
        index: usize,
        name: impl Into<String>,
        default: &str,
    ) -> Result<EditCommand, GridError> {
        let cmd = EditCommand::InsertColumn {
            index,
            name: name.into(),
            values: vec![default.to_string(); self.grid.data_row_count()],
        };
        self.apply(&cmd)?;
        Ok(cmd)
    }

    /// Remove a column from every row, header included
    pub fn delete_column(&mut self, index: usize) -> Result<EditCommand, GridError> {
        let removed_values = self
            .grid
            .column_values(index)
            .ok_or_else(|| out_of_bounds(Axis::Column, index, self.column_count()))?;
        let cmd = EditCommand::DeleteColumn {
            index,
            removed_name: self.grid.rows()[0][index].clone(),
            removed_values,
        };
        self.apply(&cmd)?;
        Ok(cmd)
    }

    pub fn rename_column(
        &mut self,
        index: usize,
        new_name: impl Into<String>,
    ) -> Result<EditCommand, GridError> {
        let old_name = self
            .header()
            .and_then(|header| header.get(index))
            .ok_or_else(|| out_of_bounds(Axis::Column, index, self.column_count()))?
            .clone();
        let cmd = EditCommand::RenameColumn {
            index,
            old_name,
            new_name: new_name.into(),
        };
        self.apply(&cmd)?;
        Ok(cmd)
    }

    /// Replace the whole grid, e.g. with the parsed raw-text view
    pub fn replace_grid(&mut self, grid: Grid) -> Result<EditCommand, GridError> {
        let cmd = EditCommand::ReplaceGrid {
            before: self.grid.clone(),
            after: grid,
        };
        self.apply(&cmd)?;
        Ok(cmd)
    }

    // === Command application ===

    /// Apply a command atomically: either every row changes or none does.
    pub fn apply(&mut self, cmd: &EditCommand) -> Result<(), GridError> {
        self.apply_inner(cmd)?;
        self.dirty = true;
        self.revision += 1;
        tracing::debug!(
            command = cmd.label(),
            revision = self.revision,
            rows = self.row_count(),
            columns = self.column_count(),
            "applied command"
        );
        Ok(())
    }

    /// Apply the inverse of `cmd` (undo)
    pub fn invert_and_apply(&mut self, cmd: &EditCommand) -> Result<(), GridError> {
        self.apply(&cmd.inverse())
    }

    fn apply_inner(&mut self, cmd: &EditCommand) -> Result<(), GridError> {
        match cmd {
            EditCommand::SetCell {
                row,
                col,
                old_value,
                new_value,
            } => {
                self.check_cell(*row, *col)?;
                if *row == 0 {
                    return Err(invalid("header cells change through RenameColumn"));
                }
                let cell = &mut self.grid.rows_mut()[*row][*col];
                if *cell != *old_value {
                    return Err(stale(cmd));
                }
                *cell = new_value.clone();
            }
            EditCommand::InsertRow { index, content } => {
                if self.grid.is_empty() {
                    return Err(invalid("document has no header row"));
                }
                if *index == 0 {
                    return Err(invalid("rows cannot be inserted above the header"));
                }
                if *index > self.row_count() {
                    return Err(out_of_bounds(Axis::Row, *index, self.row_count()));
                }
                if content.len() != self.column_count() {
                    return Err(invalid(format!(
                        "row has {} fields, document has {} columns",
                        content.len(),
                        self.column_count()
                    )));
                }
                self.grid.rows_mut().insert(*index, content.clone());
            }
            EditCommand::DeleteRow { index, removed } => {
                if *index == 0 {
                    return Err(invalid("the header row cannot be deleted"));
                }
                match self.grid.row(*index) {
                    None => return Err(out_of_bounds(Axis::Row, *index, self.row_count())),
                    Some(row) if row != removed.as_slice() => return Err(stale(cmd)),
                    Some(_) => {}
                }
                self.grid.rows_mut().remove(*index);
            }
            EditCommand::InsertColumn {
                index,
                name,
                values,
            } => {
                if *index > self.column_count() {
                    return Err(out_of_bounds(Axis::Column, *index, self.column_count()));
                }
                if self.grid.column_index(name).is_some() {
                    return Err(GridError::DuplicateName(name.clone()));
                }
                if values.len() != self.grid.data_row_count() {
                    return Err(invalid(format!(
                        "column has {} values, document has {} data rows",
                        values.len(),
                        self.grid.data_row_count()
                    )));
                }
                let rows = self.grid.rows_mut();
                if rows.is_empty() {
                    rows.push(vec![name.clone()]);
                } else {
                    rows[0].insert(*index, name.clone());
                    for (row, value) in rows.iter_mut().skip(1).zip(values) {
                        row.insert(*index, value.clone());
                    }
                }
            }
            EditCommand::DeleteColumn {
                index,
                removed_name,
                removed_values,
            } => {
                let current = self
                    .grid
                    .column_values(*index)
                    .ok_or_else(|| out_of_bounds(Axis::Column, *index, self.column_count()))?;
                if self.grid.rows()[0][*index] != *removed_name || current != *removed_values {
                    return Err(stale(cmd));
                }
                let rows = self.grid.rows_mut();
                for row in rows.iter_mut() {
                    row.remove(*index);
                }
                // A header-only grid without columns collapses back to the empty grid
                if rows.len() == 1 && rows[0].is_empty() {
                    rows.clear();
                }
            }
            EditCommand::RenameColumn {
                index,
                old_name,
                new_name,
            } => {
                let current = self
                    .header()
                    .and_then(|header| header.get(*index))
                    .ok_or_else(|| out_of_bounds(Axis::Column, *index, self.column_count()))?;
                if current != old_name {
                    return Err(stale(cmd));
                }
                if let Some(existing) = self.grid.column_index(new_name) {
                    if existing != *index {
                        return Err(GridError::DuplicateName(new_name.clone()));
                    }
                }
                self.grid.rows_mut()[0][*index] = new_name.clone();
            }
            EditCommand::ReplaceGrid { before, after } => {
                if self.grid != *before {
                    return Err(stale(cmd));
                }
                if !after.is_rectangular() {
                    return Err(invalid("replacement grid is not rectangular"));
                }
                self.grid = after.clone();
            }
            EditCommand::Batch { commands } => {
                for (applied, sub) in commands.iter().enumerate() {
                    if let Err(err) = self.apply_inner(sub) {
                        self.rollback(&commands[..applied]);
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    /// Undo already-applied commands of a failed batch, newest first
    fn rollback(&mut self, applied: &[EditCommand]) {
        for cmd in applied.iter().rev() {
            if let Err(err) = self.apply_inner(&cmd.inverse()) {
                tracing::error!(command = cmd.label(), %err, "rollback failed");
            }
        }
    }

    fn check_cell(&self, row: usize, col: usize) -> Result<(), GridError> {
        if row >= self.row_count() {
            return Err(out_of_bounds(Axis::Row, row, self.row_count()));
        }
        if col >= self.column_count() {
            return Err(out_of_bounds(Axis::Column, col, self.column_count()));
        }
        Ok(())
    }
}

fn stale(cmd: &EditCommand) -> GridError {
    invalid(format!(
        "{} does not match the current document state",
        cmd.label()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> GridDocument {
        GridDocument::parse(text, Delimiter::Comma).unwrap()
    }

    fn assert_rectangular(doc: &GridDocument) {
        assert!(doc.grid().is_rectangular(), "grid lost its shape");
    }

    #[test]
    fn test_set_cell() {
        let mut d = doc("a,b\n1,2\n");
        let cmd = d.set_cell(1, 1, "x").unwrap();

        assert_eq!(d.cell(1, 1), Some("x"));
        assert!(d.is_dirty());
        assert_eq!(
            cmd,
            EditCommand::SetCell {
                row: 1,
                col: 1,
                old_value: "2".to_string(),
                new_value: "x".to_string(),
            }
        );
    }

    #[test]
    fn test_set_cell_out_of_bounds() {
        let mut d = doc("a,b\n1,2\n");

        assert_eq!(
            d.set_cell(2, 0, "x"),
            Err(GridError::OutOfBounds {
                axis: Axis::Row,
                index: 2,
                len: 2
            })
        );
        assert!(matches!(
            d.set_cell(1, 2, "x"),
            Err(GridError::OutOfBounds {
                axis: Axis::Column,
                ..
            })
        ));
        assert!(!d.is_dirty());
    }

    #[test]
    fn test_set_cell_on_header_renames() {
        let mut d = doc("a,b\n1,2\n");

        let cmd = d.set_cell(0, 0, "id").unwrap();
        assert!(matches!(cmd, EditCommand::RenameColumn { .. }));
        assert_eq!(d.header().unwrap()[0], "id");

        assert_eq!(
            d.set_cell(0, 0, "b"),
            Err(GridError::DuplicateName("b".to_string()))
        );
    }

    #[test]
    fn test_insert_row_defaults_to_empty_cells() {
        let mut d = doc("a,b\n1,2\n");
        d.insert_row(1, None).unwrap();

        assert_eq!(d.row_count(), 3);
        assert_eq!(d.grid().row(1).unwrap(), ["", ""]);
        assert_eq!(d.cell(2, 0), Some("1"));
        assert_rectangular(&d);
    }

    #[test]
    fn test_insert_row_at_end() {
        let mut d = doc("a,b\n1,2\n");
        d.insert_row(2, Some(vec!["3".into(), "4".into()])).unwrap();
        assert_eq!(d.cell(2, 1), Some("4"));
    }

    #[test]
    fn test_insert_row_rejects_header_position_and_wrong_width() {
        let mut d = doc("a,b\n1,2\n");

        assert!(matches!(
            d.insert_row(0, None),
            Err(GridError::InvalidOperation(_))
        ));
        assert!(matches!(
            d.insert_row(3, None),
            Err(GridError::OutOfBounds { .. })
        ));
        assert!(matches!(
            d.insert_row(1, Some(vec!["only one".into()])),
            Err(GridError::InvalidOperation(_))
        ));
        assert_eq!(d.row_count(), 2);
    }

    #[test]
    fn test_delete_row() {
        let mut d = doc("a\n1\n2\n");
        let cmd = d.delete_row(1).unwrap();

        assert_eq!(
            cmd,
            EditCommand::DeleteRow {
                index: 1,
                removed: vec!["1".to_string()]
            }
        );
        assert_eq!(d.cell(1, 0), Some("2"));
    }

    #[test]
    fn test_delete_header_row_is_invalid() {
        let mut d = doc("a\n1\n");
        assert!(matches!(
            d.delete_row(0),
            Err(GridError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_delete_down_to_header_only() {
        let mut d = doc("a\n1\n");
        d.delete_row(1).unwrap();
        assert_eq!(d.row_count(), 1);
    }

    #[test]
    fn test_insert_column() {
        let mut d = doc("a,b\n1,2\n3,4\n");
        d.insert_column(1, "mid", "-").unwrap();

        assert_eq!(d.header().unwrap(), ["a", "mid", "b"]);
        assert_eq!(d.grid().row(2).unwrap(), ["3", "-", "4"]);
        assert_rectangular(&d);
    }

    #[test]
    fn test_insert_column_duplicate_name() {
        let mut d = doc("a,b\n1,2\n");
        assert_eq!(
            d.insert_column(0, "b", ""),
            Err(GridError::DuplicateName("b".to_string()))
        );
        assert_eq!(d.column_count(), 2);
    }

    #[test]
    fn test_insert_column_into_empty_document_creates_header() {
        let mut d = GridDocument::new(Delimiter::Comma);
        d.insert_column(0, "id", "").unwrap();

        assert_eq!(d.header().unwrap(), ["id"]);
        assert_eq!(d.row_count(), 1);
    }

    #[test]
    fn test_delete_column() {
        let mut d = doc("a,b,c\n1,2,3\n");
        let cmd = d.delete_column(1).unwrap();

        assert_eq!(
            cmd,
            EditCommand::DeleteColumn {
                index: 1,
                removed_name: "b".to_string(),
                removed_values: vec!["2".to_string()],
            }
        );
        assert_eq!(d.grid().row(1).unwrap(), ["1", "3"]);
        assert_rectangular(&d);
    }

    #[test]
    fn test_delete_last_column_of_header_only_document() {
        let mut d = doc("a\n");
        let cmd = d.delete_column(0).unwrap();
        assert!(d.grid().is_empty());

        d.invert_and_apply(&cmd).unwrap();
        assert_eq!(d.grid(), doc("a\n").grid());
    }

    #[test]
    fn test_rename_column() {
        let mut d = doc("a,b\n1,2\n");
        d.rename_column(1, "beta").unwrap();
        assert_eq!(d.header().unwrap(), ["a", "beta"]);

        assert_eq!(
            d.rename_column(0, "beta"),
            Err(GridError::DuplicateName("beta".to_string()))
        );
        // Renaming to its own name is allowed
        assert!(d.rename_column(1, "beta").unwrap().is_noop());
    }

    #[test]
    fn test_stale_command_is_rejected_without_mutation() {
        let mut d = doc("a\n1\n");
        let stale_cmd = EditCommand::SetCell {
            row: 1,
            col: 0,
            old_value: "not what is there".to_string(),
            new_value: "x".to_string(),
        };

        assert!(matches!(
            d.apply(&stale_cmd),
            Err(GridError::InvalidOperation(_))
        ));
        assert_eq!(d.cell(1, 0), Some("1"));
        assert_eq!(d.revision(), 0);
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut d = doc("a\n1\n");
        let before = d.grid().clone();
        let batch = EditCommand::Batch {
            commands: vec![
                EditCommand::InsertRow {
                    index: 2,
                    content: vec!["2".to_string()],
                },
                EditCommand::SetCell {
                    row: 9,
                    col: 0,
                    old_value: String::new(),
                    new_value: "x".to_string(),
                },
            ],
        };

        assert!(d.apply(&batch).is_err());
        assert_eq!(d.grid(), &before);
    }

    #[test]
    fn test_unique_column_name() {
        let mut d = doc("new_column,new_column_2\n");
        assert_eq!(d.unique_column_name("new_column"), "new_column_3");
        assert_eq!(d.unique_column_name("other"), "other");

        d.rename_column(0, "x").unwrap();
        assert_eq!(d.unique_column_name("new_column"), "new_column");
    }

    #[test]
    fn test_revision_and_saved_flag() {
        let mut d = doc("a\n1\n");
        d.set_cell(1, 0, "2").unwrap();
        d.set_cell(1, 0, "3").unwrap();
        assert_eq!(d.revision(), 2);

        d.mark_saved();
        assert!(!d.is_dirty());
    }
}
