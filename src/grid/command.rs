//! Reversible edit commands
//!
//! Every variant carries enough state to build its exact inverse, so the
//! edit history never needs snapshots of the whole document.

use crate::csv::Grid;

/// One mutation of a [`GridDocument`](super::GridDocument).
///
/// Row indices count the header as row 0; data rows start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    SetCell {
        row: usize,
        col: usize,
        old_value: String,
        new_value: String,
    },
    InsertRow {
        index: usize,
        content: Vec<String>,
    },
    DeleteRow {
        index: usize,
        removed: Vec<String>,
    },
    /// `values` holds one entry per data row (the default value, repeated,
    /// for a freshly inserted column)
    InsertColumn {
        index: usize,
        name: String,
        values: Vec<String>,
    },
    DeleteColumn {
        index: usize,
        removed_name: String,
        removed_values: Vec<String>,
    },
    RenameColumn {
        index: usize,
        old_name: String,
        new_name: String,
    },
    /// Whole-grid replacement, produced when the raw-text view is committed
    ReplaceGrid { before: Grid, after: Grid },
    /// Groups commands into one undo step (applied in order for redo,
    /// reverse order for undo)
    Batch { commands: Vec<EditCommand> },
}

impl EditCommand {
    /// Get the inverse command for undo
    pub fn inverse(&self) -> Self {
        match self {
            EditCommand::SetCell {
                row,
                col,
                old_value,
                new_value,
            } => EditCommand::SetCell {
                row: *row,
                col: *col,
                old_value: new_value.clone(),
                new_value: old_value.clone(),
            },
            EditCommand::InsertRow { index, content } => EditCommand::DeleteRow {
                index: *index,
                removed: content.clone(),
            },
            EditCommand::DeleteRow { index, removed } => EditCommand::InsertRow {
                index: *index,
                content: removed.clone(),
            },
            EditCommand::InsertColumn {
                index,
                name,
                values,
            } => EditCommand::DeleteColumn {
                index: *index,
                removed_name: name.clone(),
                removed_values: values.clone(),
            },
            EditCommand::DeleteColumn {
                index,
                removed_name,
                removed_values,
            } => EditCommand::InsertColumn {
                index: *index,
                name: removed_name.clone(),
                values: removed_values.clone(),
            },
            EditCommand::RenameColumn {
                index,
                old_name,
                new_name,
            } => EditCommand::RenameColumn {
                index: *index,
                old_name: new_name.clone(),
                new_name: old_name.clone(),
            },
            EditCommand::ReplaceGrid { before, after } => EditCommand::ReplaceGrid {
                before: after.clone(),
                after: before.clone(),
            },
            EditCommand::Batch { commands } => EditCommand::Batch {
                commands: commands.iter().rev().map(EditCommand::inverse).collect(),
            },
        }
    }

    /// True when applying the command would leave the document unchanged
    pub fn is_noop(&self) -> bool {
        match self {
            EditCommand::SetCell {
                old_value,
                new_value,
                ..
            } => old_value == new_value,
            EditCommand::RenameColumn {
                old_name, new_name, ..
            } => old_name == new_name,
            EditCommand::ReplaceGrid { before, after } => before == after,
            EditCommand::Batch { commands } => commands.iter().all(EditCommand::is_noop),
            _ => false,
        }
    }

    /// Short human-readable name, e.g. for "Undo insert row"
    pub fn label(&self) -> &'static str {
        match self {
            EditCommand::SetCell { .. } => "set cell",
            EditCommand::InsertRow { .. } => "insert row",
            EditCommand::DeleteRow { .. } => "delete row",
            EditCommand::InsertColumn { .. } => "insert column",
            EditCommand::DeleteColumn { .. } => "delete column",
            EditCommand::RenameColumn { .. } => "rename column",
            EditCommand::ReplaceGrid { .. } => "edit raw text",
            EditCommand::Batch { .. } => "batch edit",
        }
    }
}
