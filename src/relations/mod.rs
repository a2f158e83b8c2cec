//! Relations between tables
//!
//! - [`RelationGraph`]: tables and typed field links, validated on demand
//! - [`RelationStore`]: the `relations.json` file
//! - [`LayoutStore`]: saved node positions (`relation_layout.json`)
//! - [`import_document`]: external JSON with `relations` and/or `nodes`

mod graph;
mod import;
mod layout;
mod store;

pub use graph::{
    header_from_grid, Cardinality, HeaderSource, Relation, RelationError, RelationGraph,
    RelationId, RelationIssue, Table, TableId,
};
pub use import::{import_document, ImportReport};
pub use layout::{default_positions, Layout, LayoutEntry, LayoutStore, Position, LAYOUT_VERSION};
pub use store::{parse_records, RelationRecord, RelationStore, StoreError};
