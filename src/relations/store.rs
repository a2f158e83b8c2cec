//! Relations file (`relations.json`)
//!
//! A JSON array of relation records, written whole on every save. Table ids
//! are paths relative to the workspace root.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::graph::{Cardinality, Relation, RelationGraph};

/// One persisted relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationRecord {
    #[serde(alias = "from_table")]
    pub from_table: String,
    #[serde(alias = "from_field")]
    pub from_field: String,
    #[serde(alias = "to_table")]
    pub to_table: String,
    #[serde(alias = "to_field")]
    pub to_field: String,
    #[serde(alias = "type", default)]
    pub cardinality: Cardinality,
    /// Header row of `from_table`; missing means the workspace default
    #[serde(
        alias = "from_header_row",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub from_header_row: Option<usize>,
    #[serde(
        alias = "to_header_row",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_header_row: Option<usize>,
}

impl RelationRecord {
    /// Snapshot a relation with the header rows its tables currently use.
    /// Row 0 is written too.
    pub fn from_graph(graph: &RelationGraph, relation: &Relation) -> Self {
        let header_row = |id: &str| graph.table(id).map(|t| t.header_row);
        Self {
            from_table: relation.from_table.clone(),
            from_field: relation.from_field.clone(),
            to_table: relation.to_table.clone(),
            to_field: relation.to_field.clone(),
            cardinality: relation.cardinality,
            from_header_row: header_row(&relation.from_table),
            to_header_row: header_row(&relation.to_table),
        }
    }

    pub fn to_relation(&self) -> Relation {
        Relation::new(
            self.from_table.clone(),
            self.from_field.clone(),
            self.to_table.clone(),
            self.to_field.clone(),
            self.cardinality,
        )
    }
}

/// Error type for the relation and layout files
#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Json(serde_json::Error),
    /// Valid JSON that is not one of the accepted shapes
    Shape(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "I/O error: {}", err),
            StoreError::Json(err) => write!(f, "invalid JSON: {}", err),
            StoreError::Shape(message) => write!(f, "unrecognized document: {}", message),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Json(err) => Some(err),
            StoreError::Shape(_) => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Json(err)
    }
}

/// Parse a relations array, rejecting any other JSON shape
pub fn parse_records(value: serde_json::Value) -> Result<Vec<RelationRecord>, StoreError> {
    if !value.is_array() {
        return Err(StoreError::Shape(
            "relations must be a JSON array".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

/// Reads and writes the relations file
#[derive(Debug, Clone)]
pub struct RelationStore {
    path: PathBuf,
}

impl RelationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<RelationRecord>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let records = parse_records(serde_json::from_str(&contents)?)?;
        tracing::info!(path = %self.path.display(), count = records.len(), "loaded relations");
        Ok(records)
    }

    pub fn save(&self, records: &[RelationRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(records)?;
        std::fs::write(&self.path, contents + "\n")?;
        tracing::info!(path = %self.path.display(), count = records.len(), "saved relations");
        Ok(())
    }

    /// Load the file into `graph`, restoring header rows. Relations are not
    /// validated here; stale entries show up in `validate`.
    pub fn load_into(&self, graph: &mut RelationGraph) -> Result<usize, StoreError> {
        let records = self.load()?;
        for record in &records {
            graph.restore_relation(record.to_relation());
            if let Some(row) = record.from_header_row {
                graph.set_header_row(record.from_table.clone(), row);
            }
            if let Some(row) = record.to_header_row {
                graph.set_header_row(record.to_table.clone(), row);
            }
        }
        Ok(records.len())
    }

    /// Write every relation of `graph`
    pub fn save_graph(&self, graph: &RelationGraph) -> Result<(), StoreError> {
        let records: Vec<_> = graph
            .list_relations(None)
            .into_iter()
            .map(|(_, rel)| RelationRecord::from_graph(graph, rel))
            .collect();
        self.save(&records)
    }
}
