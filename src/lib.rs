//! gridlink - delimited-table document model
//!
//! This crate provides the core types and logic for editing `.csv`/`.tsv`
//! files through two synchronized views (structured grid and raw text), with
//! reversible edits, pattern fill and typed relations between files.

pub mod cells;
pub mod cli;
pub mod config;
pub mod config_paths;
pub mod csv;
pub mod fill;
pub mod find;
pub mod grid;
pub mod history;
pub mod relations;
pub mod tracing;
pub mod workspace;

// Re-export commonly used types
pub use config::WorkspaceConfig;
pub use csv::{Delimiter, Grid, ParseError};
pub use grid::{DocumentSession, EditCommand, GridDocument, GridError};
pub use history::EditHistory;
pub use relations::{Relation, RelationGraph};
pub use workspace::Workspace;
