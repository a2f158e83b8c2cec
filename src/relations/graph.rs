//! Relation Graph - typed field links between independently loaded tables
//!
//! The graph stores identifiers only (table id + field name). Header lookups go
//! through a [`HeaderSource`], so a document can be reloaded or reshaped
//! without touching the graph; only the outcome of [`RelationGraph::validate`]
//! changes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::csv::Grid;

/// Table identity: the document path relative to the workspace root
pub type TableId = String;

/// Relation multiplicity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    #[serde(alias = "one-to-one", alias = "1:1")]
    OneToOne,
    #[serde(alias = "one-to-many", alias = "1:n", alias = "1:N")]
    OneToMany,
}

impl Cardinality {
    pub fn as_str(self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one_to_one",
            Cardinality::OneToMany => "one_to_many",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cardinality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "one_to_one" | "one-to-one" | "1:1" => Ok(Cardinality::OneToOne),
            "one_to_many" | "one-to-many" | "1:n" | "1:N" => Ok(Cardinality::OneToMany),
            other => Err(format!("unknown cardinality: {}", other)),
        }
    }
}

/// A graph node: one table and the row its header lives on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub id: TableId,
    /// Usually 0; larger when the file starts with comment/metadata rows
    pub header_row: usize,
}

/// A directed field-to-field link
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub from_table: TableId,
    pub from_field: String,
    pub to_table: TableId,
    pub to_field: String,
    pub cardinality: Cardinality,
}

impl Relation {
    pub fn new(
        from_table: impl Into<TableId>,
        from_field: impl Into<String>,
        to_table: impl Into<TableId>,
        to_field: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_field: from_field.into(),
            to_table: to_table.into(),
            to_field: to_field.into(),
            cardinality,
        }
    }

    /// Whether either end of the relation is `table`
    pub fn involves(&self, table: &str) -> bool {
        self.from_table == table || self.to_table == table
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{} ({})",
            self.from_table, self.from_field, self.to_table, self.to_field, self.cardinality
        )
    }
}

/// Stable handle for a relation within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationId(pub u64);

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for relation graph lookups and edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationError {
    UnknownTable { table: TableId },
    UnknownField { table: TableId, field: String },
    /// The table's header row index is past its last row
    HeaderRowOutOfRange {
        table: TableId,
        row: usize,
        row_count: usize,
    },
    UnknownRelation(RelationId),
}

impl fmt::Display for RelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationError::UnknownTable { table } => write!(f, "unknown table {}", table),
            RelationError::UnknownField { table, field } => {
                write!(f, "table {} has no field {:?}", table, field)
            }
            RelationError::HeaderRowOutOfRange {
                table,
                row,
                row_count,
            } => write!(
                f,
                "header row {} of table {} is out of range ({} rows)",
                row, table, row_count
            ),
            RelationError::UnknownRelation(id) => write!(f, "no relation with id {}", id),
        }
    }
}

impl std::error::Error for RelationError {}

/// A relation that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationIssue {
    pub id: RelationId,
    pub error: RelationError,
}

/// Read-only view of table headers, taken at call time
pub trait HeaderSource {
    /// Field names on row `row` of `table`
    fn header(&self, table: &str, row: usize) -> Result<Vec<String>, RelationError>;
}

/// Field names on row `row` of `grid`
pub fn header_from_grid(table: &str, grid: &Grid, row: usize) -> Result<Vec<String>, RelationError> {
    grid.row(row)
        .map(<[String]>::to_vec)
        .ok_or_else(|| RelationError::HeaderRowOutOfRange {
            table: table.to_string(),
            row,
            row_count: grid.row_count(),
        })
}

impl HeaderSource for HashMap<TableId, Grid> {
    fn header(&self, table: &str, row: usize) -> Result<Vec<String>, RelationError> {
        let grid = self.get(table).ok_or_else(|| RelationError::UnknownTable {
            table: table.to_string(),
        })?;
        header_from_grid(table, grid, row)
    }
}

/// Tables and the relations between them
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    tables: BTreeMap<TableId, Table>,
    relations: BTreeMap<RelationId, Relation>,
    next_id: u64,
    /// Header row given to tables registered implicitly by `add_relation`
    default_header_row: usize,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_header_row(default_header_row: usize) -> Self {
        Self {
            default_header_row,
            ..Self::default()
        }
    }

    // === Tables ===

    /// Register a table, keeping the header row of an already known one
    pub fn register_table(&mut self, id: impl Into<TableId>) -> &Table {
        let id = id.into();
        let header_row = self.default_header_row;
        self.tables.entry(id.clone()).or_insert(Table { id, header_row })
    }

    /// Register a table (if needed) and set its header row
    pub fn set_header_row(&mut self, id: impl Into<TableId>, header_row: usize) {
        let id = id.into();
        tracing::debug!(table = %id, header_row, "set header row");
        self.tables
            .entry(id.clone())
            .and_modify(|t| t.header_row = header_row)
            .or_insert(Table { id, header_row });
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    fn header_row_of(&self, id: &str) -> usize {
        self.tables
            .get(id)
            .map_or(self.default_header_row, |t| t.header_row)
    }

    // === Relations ===

    /// Add a relation after checking both fields against the current headers.
    ///
    /// Duplicate relations are accepted. Unknown tables are registered with
    /// the default header row once the relation is valid.
    pub fn add_relation(
        &mut self,
        source: &impl HeaderSource,
        relation: Relation,
    ) -> Result<RelationId, RelationError> {
        self.check(source, &relation)?;
        self.register_table(relation.from_table.clone());
        self.register_table(relation.to_table.clone());
        let id = self.restore_relation(relation);
        tracing::debug!(%id, "relation added");
        Ok(id)
    }

    /// Insert a relation without checking it, e.g. when loading a saved file
    pub fn restore_relation(&mut self, relation: Relation) -> RelationId {
        let id = RelationId(self.next_id);
        self.next_id += 1;
        self.register_table(relation.from_table.clone());
        self.register_table(relation.to_table.clone());
        self.relations.insert(id, relation);
        id
    }

    pub fn remove_relation(&mut self, id: RelationId) -> Result<Relation, RelationError> {
        let removed = self
            .relations
            .remove(&id)
            .ok_or(RelationError::UnknownRelation(id))?;
        tracing::debug!(%id, relation = %removed, "relation removed");
        Ok(removed)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    /// Relations in insertion order, optionally only those touching `table`
    pub fn list_relations(&self, table: Option<&str>) -> Vec<(RelationId, &Relation)> {
        self.relations
            .iter()
            .filter(|(_, rel)| table.map_or(true, |t| rel.involves(t)))
            .map(|(id, rel)| (*id, rel))
            .collect()
    }

    /// Check every relation against the current headers.
    ///
    /// Broken relations are reported, never removed.
    pub fn validate(&self, source: &impl HeaderSource) -> Vec<RelationIssue> {
        let mut cache: HashMap<(&str, usize), Result<Vec<String>, RelationError>> =
            HashMap::new();
        let mut issues = Vec::new();

        for (id, rel) in &self.relations {
            let ends = [
                (rel.from_table.as_str(), rel.from_field.as_str()),
                (rel.to_table.as_str(), rel.to_field.as_str()),
            ];
            for (table, field) in ends {
                let row = self.header_row_of(table);
                let header = cache
                    .entry((table, row))
                    .or_insert_with(|| source.header(table, row));
                let result = match header {
                    Ok(fields) => check_field(table, fields, field),
                    Err(err) => Err(err.clone()),
                };
                if let Err(error) = result {
                    tracing::warn!(%id, %error, "stale relation");
                    issues.push(RelationIssue { id: *id, error });
                    break;
                }
            }
        }
        issues
    }

    fn check(&self, source: &impl HeaderSource, relation: &Relation) -> Result<(), RelationError> {
        for (table, field) in [
            (&relation.from_table, &relation.from_field),
            (&relation.to_table, &relation.to_field),
        ] {
            let header = source.header(table, self.header_row_of(table))?;
            check_field(table, &header, field)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// `(from_table, to_table)` pairs in relation order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.relations
            .values()
            .map(|r| (r.from_table.as_str(), r.to_table.as_str()))
    }
}

fn check_field(table: &str, header: &[String], field: &str) -> Result<(), RelationError> {
    if header.iter().any(|name| name == field) {
        Ok(())
    } else {
        Err(RelationError::UnknownField {
            table: table.to_string(),
            field: field.to_string(),
        })
    }
}
