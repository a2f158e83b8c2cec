//! Layout Store - 2-D node positions for the relation graph
//!
//! Positions are plain data. Entries for tables the graph no longer knows are
//! kept (and saved back) until the caller prunes them; they are only left out
//! of [`Layout::visible`].
//!
//! File shape written:
//!
//! ```text
//! {"version": 1, "nodes": {"orders.csv": {"x": 60.0, "y": 60.0}, ...}}
//! ```
//!
//! Accepted on read: that shape, `nodes` given as a list of
//! `{tableId, x, y}`, or a bare list of `{tableId, x, y}`.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::graph::{RelationGraph, TableId};
use super::store::StoreError;

pub const LAYOUT_VERSION: u32 = 1;

// Default layout geometry
const NODE_WIDTH: f64 = 320.0;
const NODE_HEIGHT: f64 = 96.0;
const X_GAP: f64 = 190.0;
const Y_GAP: f64 = 120.0;
const PADDING: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One node position in list form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEntry {
    #[serde(alias = "table_id", alias = "id")]
    pub table_id: TableId,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize)]
struct LayoutFile<'a> {
    version: u32,
    nodes: &'a BTreeMap<TableId, Position>,
}

/// Saved node positions keyed by table id
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    nodes: BTreeMap<TableId, Position>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str) -> Option<Position> {
        self.nodes.get(table).copied()
    }

    pub fn set(&mut self, table: impl Into<TableId>, position: Position) {
        self.nodes.insert(table.into(), position);
    }

    pub fn remove(&mut self, table: &str) -> Option<Position> {
        self.nodes.remove(table)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Position)> {
        self.nodes.iter().map(|(id, pos)| (id.as_str(), *pos))
    }

    /// Entries for tables the graph knows about
    pub fn visible<'a>(
        &'a self,
        graph: &'a RelationGraph,
    ) -> impl Iterator<Item = (&'a str, Position)> + 'a {
        self.iter().filter(|(id, _)| graph.table(id).is_some())
    }

    /// Entries for tables the graph does not know about
    pub fn orphans(&self, graph: &RelationGraph) -> Vec<&str> {
        self.nodes
            .keys()
            .filter(|id| graph.table(id).is_none())
            .map(String::as_str)
            .collect()
    }

    /// Drop orphaned entries, returning their ids
    pub fn prune(&mut self, graph: &RelationGraph) -> Vec<TableId> {
        let orphans: Vec<TableId> = self.orphans(graph).into_iter().map(String::from).collect();
        for id in &orphans {
            self.nodes.remove(id);
        }
        if !orphans.is_empty() {
            tracing::debug!(count = orphans.len(), "pruned layout entries");
        }
        orphans
    }

    /// Position of every graph table: saved where available, computed otherwise
    pub fn resolved(&self, graph: &RelationGraph) -> BTreeMap<TableId, Position> {
        let mut positions = default_positions(graph);
        for (id, pos) in self.visible(graph) {
            positions.insert(id.to_string(), pos);
        }
        positions
    }

    /// Merge `other` into this layout, overwriting shared ids
    pub fn merge(&mut self, other: Layout) {
        self.nodes.extend(other.nodes);
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        let file = LayoutFile {
            version: LAYOUT_VERSION,
            nodes: &self.nodes,
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Read any accepted layout shape
    pub fn from_value(value: serde_json::Value) -> Result<Self, StoreError> {
        let nodes = match value {
            serde_json::Value::Array(_) => entries_to_map(serde_json::from_value(value)?),
            serde_json::Value::Object(mut object) => {
                if let Some(version) = object.get("version") {
                    if version.as_u64() != Some(u64::from(LAYOUT_VERSION)) {
                        return Err(StoreError::Shape(format!(
                            "unsupported layout version {}",
                            version
                        )));
                    }
                }
                match object.remove("nodes") {
                    Some(nodes @ serde_json::Value::Object(_)) => serde_json::from_value(nodes)?,
                    Some(nodes @ serde_json::Value::Array(_)) => {
                        entries_to_map(serde_json::from_value(nodes)?)
                    }
                    Some(_) => {
                        return Err(StoreError::Shape(
                            "layout nodes must be an object or an array".to_string(),
                        ))
                    }
                    None => {
                        return Err(StoreError::Shape(
                            "layout object has no nodes key".to_string(),
                        ))
                    }
                }
            }
            _ => {
                return Err(StoreError::Shape(
                    "layout must be an object or an array".to_string(),
                ))
            }
        };
        Ok(Self { nodes })
    }
}

fn entries_to_map(entries: Vec<LayoutEntry>) -> BTreeMap<TableId, Position> {
    entries
        .into_iter()
        .map(|e| (e.table_id, Position::new(e.x, e.y)))
        .collect()
}

/// Layered top-down placement of every graph table.
///
/// Layers follow a topological order of the relation edges (from -> to);
/// when the edges contain a cycle each node's layer falls back to its order of
/// first appearance. Tables without relations sit on the first layer.
pub fn default_positions(graph: &RelationGraph) -> BTreeMap<TableId, Position> {
    let mut nodes: Vec<&str> = Vec::new();
    for (from, to) in graph.edges() {
        for id in [from, to] {
            if !nodes.contains(&id) {
                nodes.push(id);
            }
        }
    }
    for table in graph.tables() {
        if !nodes.contains(&table.id.as_str()) {
            nodes.push(&table.id);
        }
    }

    let mut indegree: HashMap<&str, usize> = nodes.iter().map(|n| (*n, 0)).collect();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in graph.edges() {
        outgoing.entry(from).or_default().push(to);
        *indegree.entry(to).or_default() += 1;
    }

    let mut layers: HashMap<&str, usize> = HashMap::new();
    let mut queue: VecDeque<&str> = nodes
        .iter()
        .copied()
        .filter(|n| indegree.get(n) == Some(&0))
        .collect();
    let mut order: Vec<&str> = queue.iter().copied().collect();

    while let Some(current) = queue.pop_front() {
        let base = layers.get(current).copied().unwrap_or(0);
        for &next in outgoing.get(current).into_iter().flatten() {
            let layer = layers.entry(next).or_insert(0);
            *layer = (*layer).max(base + 1);
            if let Some(degree) = indegree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(next);
                    order.push(next);
                }
            }
        }
    }

    if order.len() != nodes.len() {
        order = nodes.clone();
        for (idx, node) in order.iter().enumerate() {
            layers.entry(*node).or_insert(idx);
        }
    }

    let mut grouped: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for node in &order {
        let layer = layers.get(node).copied().unwrap_or(0);
        grouped.entry(layer).or_default().push(*node);
    }

    let mut positions = BTreeMap::new();
    for (layer, items) in grouped {
        for (idx, node) in items.into_iter().enumerate() {
            let x = PADDING + idx as f64 * (NODE_WIDTH + X_GAP);
            let y = PADDING + layer as f64 * (NODE_HEIGHT + Y_GAP);
            positions.insert(node.to_string(), Position::new(x, y));
        }
    }
    positions
}

/// Reads and writes the layout file
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: PathBuf,
}

impl LayoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the layout. A missing file is an empty layout.
    pub fn load(&self) -> Result<Layout, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Layout::new()),
            Err(err) => return Err(err.into()),
        };
        let layout = Layout::from_value(serde_json::from_str(&contents)?)?;
        tracing::info!(path = %self.path.display(), nodes = layout.len(), "loaded layout");
        Ok(layout)
    }

    pub fn save(&self, layout: &Layout) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, layout.to_json()? + "\n")?;
        tracing::info!(path = %self.path.display(), nodes = layout.len(), "saved layout");
        Ok(())
    }
}
