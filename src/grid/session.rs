//! Document session - one open document with its history and current view
//!
//! The session is the only public way to edit a document: every mutation is
//! recorded in the session's [`EditHistory`]. The document itself lives
//! behind a `RwLock` so a background task can take consistent snapshots
//! through a [`SnapshotHandle`]; each command holds the write lock for its
//! whole duration, so a snapshot always lands between two commands.
//!
//! ```text
//! DocumentSession
//! ├── Arc<RwLock<GridDocument>>  ◀── SnapshotHandle (read lock)
//! ├── EditHistory
//! └── ViewMode
//!     ├── Grid (default)
//!     └── Raw(text)   edits here are plain text until committed
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::command::EditCommand;
use super::document::{GridDocument, GridError};
use crate::csv::{parse_csv, ParseError};
use crate::history::EditHistory;

/// Which representation the user is editing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    /// Raw delimited text, not yet committed back to the grid
    Raw(String),
}

impl ViewMode {
    pub fn is_raw(&self) -> bool {
        matches!(self, ViewMode::Raw(_))
    }
}

/// Point-in-time copy of a document's serialized form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub path: Option<PathBuf>,
    pub revision: u64,
    pub text: String,
}

/// Read-only handle for taking snapshots from another thread
#[derive(Debug, Clone)]
pub struct SnapshotHandle {
    document: Arc<RwLock<GridDocument>>,
}

impl SnapshotHandle {
    /// Serialize the document under the read lock
    pub fn snapshot(&self) -> io::Result<DocumentSnapshot> {
        let doc = self
            .document
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(DocumentSnapshot {
            path: doc.path().map(|p| p.to_path_buf()),
            revision: doc.revision(),
            text: doc.to_text()?,
        })
    }
}

/// An open document, its edit history and its current view
#[derive(Debug)]
pub struct DocumentSession {
    document: Arc<RwLock<GridDocument>>,
    history: EditHistory,
    view: ViewMode,
    /// Dirty flag when the raw view was entered
    dirty_before_raw: bool,
}

impl DocumentSession {
    /// Open a session with unbounded history
    pub fn new(document: GridDocument) -> Self {
        Self::with_history(document, EditHistory::new())
    }

    pub fn with_history(document: GridDocument, history: EditHistory) -> Self {
        Self {
            document: Arc::new(RwLock::new(document)),
            history,
            view: ViewMode::Grid,
            dirty_before_raw: false,
        }
    }

    /// Read access to the document
    pub fn read(&self) -> RwLockReadGuard<'_, GridDocument> {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GridDocument> {
        self.document
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn view(&self) -> &ViewMode {
        &self.view
    }

    pub fn is_dirty(&self) -> bool {
        self.read().is_dirty()
    }

    pub fn snapshot_handle(&self) -> SnapshotHandle {
        SnapshotHandle {
            document: Arc::clone(&self.document),
        }
    }

    /// Clear the dirty flag after the caller has written the file
    pub fn mark_saved(&mut self) {
        self.write().mark_saved();
    }

    // === Recorded edits ===

    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        value: impl Into<String>,
    ) -> Result<EditCommand, GridError> {
        let value = value.into();
        self.execute(|doc| doc.set_cell(row, col, value))
    }

    pub fn insert_row(
        &mut self,
        index: usize,
        content: Option<Vec<String>>,
    ) -> Result<EditCommand, GridError> {
        self.execute(|doc| doc.insert_row(index, content))
    }

    pub fn delete_row(&mut self, index: usize) -> Result<EditCommand, GridError> {
        self.execute(|doc| doc.delete_row(index))
    }

    pub fn insert_column(
        &mut self,
        index: usize,
        name: impl Into<String>,
        default: &str,
    ) -> Result<EditCommand, GridError> {
        let name = name.into();
        self.execute(|doc| doc.insert_column(index, name, default))
    }

    pub fn delete_column(&mut self, index: usize) -> Result<EditCommand, GridError> {
        self.execute(|doc| doc.delete_column(index))
    }

    pub fn rename_column(
        &mut self,
        index: usize,
        new_name: impl Into<String>,
    ) -> Result<EditCommand, GridError> {
        let new_name = new_name.into();
        self.execute(|doc| doc.rename_column(index, new_name))
    }

    pub fn undo(&mut self) -> Result<Option<EditCommand>, GridError> {
        self.ensure_grid_view()?;
        let mut doc = self
            .document
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.history.undo(&mut doc)
    }

    pub fn redo(&mut self) -> Result<Option<EditCommand>, GridError> {
        self.ensure_grid_view()?;
        let mut doc = self
            .document
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.history.redo(&mut doc)
    }

    /// Run one command-producing edit under the write lock and record it
    fn execute(
        &mut self,
        edit: impl FnOnce(&mut GridDocument) -> Result<EditCommand, GridError>,
    ) -> Result<EditCommand, GridError> {
        self.ensure_grid_view()?;
        let cmd = edit(&mut self.write())?;
        if !cmd.is_noop() {
            self.history.record(cmd.clone());
        }
        Ok(cmd)
    }

    /// Run several edits as one undo step. If `edits` fails, everything it
    /// applied is reverted and nothing is recorded.
    pub(crate) fn batch(
        &mut self,
        edits: impl FnOnce(&mut GridDocument, &mut Vec<EditCommand>) -> Result<(), GridError>,
    ) -> Result<EditCommand, GridError> {
        self.ensure_grid_view()?;
        let mut doc = self
            .document
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut applied = Vec::new();
        if let Err(err) = edits(&mut doc, &mut applied) {
            for cmd in applied.iter().rev() {
                if let Err(undo_err) = doc.invert_and_apply(cmd) {
                    tracing::error!(command = cmd.label(), %undo_err, "batch rollback failed");
                }
            }
            return Err(err);
        }

        applied.retain(|cmd| !cmd.is_noop());
        let cmd = EditCommand::Batch { commands: applied };
        if !cmd.is_noop() {
            self.history.record(cmd.clone());
        }
        Ok(cmd)
    }

    fn ensure_grid_view(&self) -> Result<(), GridError> {
        if self.view.is_raw() {
            return Err(GridError::InvalidOperation(
                "commit or discard the raw text view first".to_string(),
            ));
        }
        Ok(())
    }

    // === Raw text view ===

    /// Switch to the raw-text view, returning its text
    pub fn enter_raw_view(&mut self) -> io::Result<&str> {
        if !self.view.is_raw() {
            let doc = self.read();
            let text = doc.to_text()?;
            let dirty = doc.is_dirty();
            drop(doc);
            self.dirty_before_raw = dirty;
            self.view = ViewMode::Raw(text);
        }
        Ok(self.raw_text().unwrap_or_default())
    }

    /// Current raw text, when the raw view is active
    pub fn raw_text(&self) -> Option<&str> {
        match &self.view {
            ViewMode::Raw(text) => Some(text),
            ViewMode::Grid => None,
        }
    }

    /// Replace the raw text. No row-length check happens here.
    pub fn edit_raw(&mut self, text: impl Into<String>) -> Result<(), GridError> {
        let ViewMode::Raw(current) = &mut self.view else {
            return Err(GridError::InvalidOperation(
                "the raw text view is not active".to_string(),
            ));
        };
        *current = text.into();
        self.write().mark_dirty();
        Ok(())
    }

    /// Parse the raw text back into the grid and return to the grid view.
    ///
    /// On a parse error the raw text and the grid are both left untouched and
    /// the raw view stays active. Returns the recorded command, if anything changed.
    pub fn commit_raw_view(&mut self) -> Result<Option<EditCommand>, ParseError> {
        let ViewMode::Raw(text) = &self.view else {
            return Ok(None);
        };

        let mut doc = self
            .document
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let grid = match parse_csv(text, doc.delimiter()) {
            Ok(grid) => grid,
            Err(err) => {
                tracing::warn!(%err, "raw text view rejected");
                return Err(err);
            }
        };

        let recorded = if *doc.grid() == grid {
            if !self.dirty_before_raw {
                doc.mark_saved();
            }
            None
        } else {
            match doc.replace_grid(grid) {
                Ok(cmd) => {
                    self.history.record(cmd.clone());
                    Some(cmd)
                }
                Err(err) => {
                    // Only reachable if the parsed grid were not rectangular
                    tracing::error!(%err, "could not replace grid");
                    None
                }
            }
        };
        drop(doc);

        self.view = ViewMode::Grid;
        Ok(recorded)
    }

    /// Leave the raw view without applying its text. The dirty flag goes
    /// back to what it was when the raw view was entered.
    pub fn discard_raw_view(&mut self) {
        if !self.view.is_raw() {
            return;
        }
        if !self.dirty_before_raw {
            self.write().mark_saved();
        }
        self.view = ViewMode::Grid;
    }
}
