//! Edit history (undo/redo) for grid documents.
//!
//! The history never mutates a document except through undo/redo; new edits
//! reach it via [`EditHistory::record`] after the document has applied them.

use crate::grid::{EditCommand, GridDocument, GridError};

/// Edit history with undo/redo stacks, scoped to one document.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
    /// `None` keeps every command
    max_size: Option<usize>,
}

impl EditHistory {
    /// Create an unbounded edit history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an edit history that evicts its oldest command beyond `max_size`
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size: Some(max_size),
            ..Self::default()
        }
    }

    /// Create an edit history from an optional limit
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            max_size: limit,
            ..Self::default()
        }
    }

    /// Push an applied command onto the undo stack (clears redo stack)
    pub fn record(&mut self, cmd: EditCommand) {
        self.redo_stack.clear();
        self.undo_stack.push(cmd);

        if let Some(max) = self.max_size {
            if self.undo_stack.len() > max {
                let excess = self.undo_stack.len() - max;
                self.undo_stack.drain(..excess);
                tracing::debug!(evicted = excess, "edit history limit reached");
            }
        }
    }

    /// Revert the most recent command and move it to the redo stack.
    ///
    /// If the document refuses the inverse, the command stays on the undo stack.
    pub fn undo(&mut self, doc: &mut GridDocument) -> Result<Option<EditCommand>, GridError> {
        let Some(cmd) = self.undo_stack.pop() else {
            return Ok(None);
        };
        if let Err(err) = doc.invert_and_apply(&cmd) {
            self.undo_stack.push(cmd);
            return Err(err);
        }
        tracing::debug!(command = cmd.label(), "undo");
        self.redo_stack.push(cmd.clone());
        Ok(Some(cmd))
    }

    /// Re-apply the most recently undone command and move it back to the undo stack
    pub fn redo(&mut self, doc: &mut GridDocument) -> Result<Option<EditCommand>, GridError> {
        let Some(cmd) = self.redo_stack.pop() else {
            return Ok(None);
        };
        if let Err(err) = doc.apply(&cmd) {
            self.redo_stack.push(cmd);
            return Err(err);
        }
        tracing::debug!(command = cmd.label(), "redo");
        self.undo_stack.push(cmd.clone());
        Ok(Some(cmd))
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Command the next undo would revert
    pub fn peek_undo(&self) -> Option<&EditCommand> {
        self.undo_stack.last()
    }

    /// Command the next redo would re-apply
    pub fn peek_redo(&self) -> Option<&EditCommand> {
        self.redo_stack.last()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get the number of commands in the undo stack
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of commands in the redo stack
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }
}
