//! Grid Document model
//!
//! - [`GridDocument`]: header + rows of one file, with command-producing edits
//! - [`EditCommand`]: reversible description of one edit
//! - [`DocumentSession`]: a document, its history and its grid/raw view

mod command;
mod document;
mod session;

pub use command::EditCommand;
pub use document::{Axis, GridDocument, GridError};
pub use session::{DocumentSession, DocumentSnapshot, SnapshotHandle, ViewMode};
