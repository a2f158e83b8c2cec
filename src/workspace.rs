//! Workspace - the explicit editing context
//!
//! A workspace is a root directory with its open document sessions, the
//! relation graph over its tables and the saved graph layout. Every operation
//! goes through a `Workspace` value; nothing is global.
//!
//! Table ids are file paths relative to the root, with `/` separators, so the
//! relations file stays portable between machines.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::WorkspaceConfig;
use crate::csv::{count_records, detect_delimiter, read_record, Delimiter, ParseError};
use crate::grid::{DocumentSession, GridDocument};
use crate::history::EditHistory;
use crate::relations::{
    header_from_grid, import_document, HeaderSource, ImportReport, Layout, LayoutStore, Relation,
    RelationError, RelationGraph, RelationId, RelationIssue, RelationStore, StoreError, TableId,
};

/// Error type for workspace operations
#[derive(Debug)]
pub enum WorkspaceError {
    Io { path: PathBuf, source: io::Error },
    Parse { path: PathBuf, source: ParseError },
    Relation(RelationError),
    Store(StoreError),
    /// No open document has this table id
    NotOpen(TableId),
    /// The path does not live under the workspace root
    OutsideRoot(PathBuf),
}

impl fmt::Display for WorkspaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            WorkspaceError::Parse { path, source } => write!(f, "{}: {}", path.display(), source),
            WorkspaceError::Relation(err) => write!(f, "{}", err),
            WorkspaceError::Store(err) => write!(f, "{}", err),
            WorkspaceError::NotOpen(id) => write!(f, "{} is not open", id),
            WorkspaceError::OutsideRoot(path) => {
                write!(f, "{} is outside the workspace root", path.display())
            }
        }
    }
}

impl std::error::Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkspaceError::Io { source, .. } => Some(source),
            WorkspaceError::Parse { source, .. } => Some(source),
            WorkspaceError::Relation(err) => Some(err),
            WorkspaceError::Store(err) => Some(err),
            WorkspaceError::NotOpen(_) | WorkspaceError::OutsideRoot(_) => None,
        }
    }
}

impl From<RelationError> for WorkspaceError {
    fn from(err: RelationError) -> Self {
        WorkspaceError::Relation(err)
    }
}

impl From<StoreError> for WorkspaceError {
    fn from(err: StoreError) -> Self {
        WorkspaceError::Store(err)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> WorkspaceError + '_ {
    move |source| WorkspaceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Delimiter for a file: from its extension, else sniffed from its content
fn delimiter_for(path: &Path, content: &str) -> Delimiter {
    Delimiter::from_path(path).unwrap_or_else(|| detect_delimiter(content))
}

/// Header lookups for relation checks: open documents first, then the file on disk
struct WorkspaceHeaders<'a> {
    root: &'a Path,
    sessions: &'a BTreeMap<TableId, DocumentSession>,
}

impl HeaderSource for WorkspaceHeaders<'_> {
    fn header(&self, table: &str, row: usize) -> Result<Vec<String>, RelationError> {
        if let Some(session) = self.sessions.get(table) {
            return header_from_grid(table, session.read().grid(), row);
        }

        let unknown = || RelationError::UnknownTable {
            table: table.to_string(),
        };
        let path = self.root.join(table);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "table not readable");
            unknown()
        })?;
        let delimiter = delimiter_for(&path, &content);

        match read_record(&content, delimiter, row) {
            Ok(Some(fields)) => Ok(fields),
            Ok(None) => Err(RelationError::HeaderRowOutOfRange {
                table: table.to_string(),
                row,
                row_count: count_records(&content, delimiter),
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "table not parseable");
                Err(unknown())
            }
        }
    }
}

/// Open documents, relation graph and layout of one root directory
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    config: WorkspaceConfig,
    sessions: BTreeMap<TableId, DocumentSession>,
    graph: RelationGraph,
    layout: Layout,
    relation_store: RelationStore,
    layout_store: LayoutStore,
}

impl Workspace {
    /// Open a workspace, loading its relations and layout files
    pub fn open(root: impl Into<PathBuf>, config: WorkspaceConfig) -> Result<Self, WorkspaceError> {
        let root = root.into();
        let root = root.canonicalize().map_err(io_error(&root))?;

        let relation_store = RelationStore::new(root.join(&config.relations_file));
        let layout_store = LayoutStore::new(root.join(&config.layout_file));

        let mut graph = RelationGraph::with_default_header_row(config.default_header_row);
        relation_store.load_into(&mut graph)?;
        let layout = layout_store.load()?;

        let orphans = layout.orphans(&graph);
        if !orphans.is_empty() {
            tracing::warn!(count = orphans.len(), "layout has entries for unknown tables");
        }

        tracing::info!(
            root = %root.display(),
            relations = graph.len(),
            "workspace opened"
        );
        Ok(Self {
            root,
            config,
            sessions: BTreeMap::new(),
            graph,
            layout,
            relation_store,
            layout_store,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Table id of `path`: relative to the root, `/`-separated.
    ///
    /// Relative paths are taken relative to the root.
    pub fn table_id(&self, path: &Path) -> Result<TableId, WorkspaceError> {
        let relative = if path.is_absolute() {
            let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            absolute
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .map_err(|_| WorkspaceError::OutsideRoot(path.to_path_buf()))?
        } else {
            path.to_path_buf()
        };

        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => {
                    if parts.pop().is_none() {
                        return Err(WorkspaceError::OutsideRoot(path.to_path_buf()));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(WorkspaceError::OutsideRoot(path.to_path_buf()))
                }
            }
        }
        if parts.is_empty() {
            return Err(WorkspaceError::OutsideRoot(path.to_path_buf()));
        }
        Ok(parts.join("/"))
    }

    /// File path of a table id
    pub fn resolve(&self, table: &str) -> PathBuf {
        self.root.join(table)
    }

    // === Documents ===

    /// Open (or return the already open) document at `path`
    pub fn open_document(&mut self, path: &Path) -> Result<TableId, WorkspaceError> {
        let id = self.table_id(path)?;
        if self.sessions.contains_key(&id) {
            return Ok(id);
        }

        let full = self.resolve(&id);
        let content = std::fs::read_to_string(&full).map_err(io_error(&full))?;
        let delimiter = delimiter_for(&full, &content);
        let document = GridDocument::parse(&content, delimiter)
            .map_err(|source| WorkspaceError::Parse {
                path: full.clone(),
                source,
            })?
            .with_path(&full);

        tracing::info!(
            table = %id,
            rows = document.row_count(),
            columns = document.column_count(),
            "document opened"
        );
        let history = EditHistory::with_limit(self.config.history_limit);
        self.sessions
            .insert(id.clone(), DocumentSession::with_history(document, history));
        self.graph.register_table(id.clone());
        Ok(id)
    }

    /// Close a document, returning its session (unsaved edits included)
    pub fn close_document(&mut self, table: &str) -> Result<DocumentSession, WorkspaceError> {
        let session = self
            .sessions
            .remove(table)
            .ok_or_else(|| WorkspaceError::NotOpen(table.to_string()))?;
        if session.is_dirty() {
            tracing::warn!(table, "closed with unsaved changes");
        }
        Ok(session)
    }

    /// Write a document to its file and clear its dirty flag
    pub fn save_document(&mut self, table: &str) -> Result<(), WorkspaceError> {
        let path = self.resolve(table);
        let session = self
            .sessions
            .get_mut(table)
            .ok_or_else(|| WorkspaceError::NotOpen(table.to_string()))?;

        let text = session.read().to_text().map_err(io_error(&path))?;
        std::fs::write(&path, text).map_err(io_error(&path))?;
        session.mark_saved();
        tracing::info!(table, "document saved");
        Ok(())
    }

    pub fn session(&self, table: &str) -> Option<&DocumentSession> {
        self.sessions.get(table)
    }

    pub fn session_mut(&mut self, table: &str) -> Option<&mut DocumentSession> {
        self.sessions.get_mut(table)
    }

    /// Ids of the open documents
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    // === Relations ===

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    /// Add a relation after checking it. Table names are normalized to table
    /// ids, so `./users.csv` and `users.csv` are the same table.
    pub fn add_relation(&mut self, mut relation: Relation) -> Result<RelationId, WorkspaceError> {
        relation.from_table = self.table_id(Path::new(&relation.from_table))?;
        relation.to_table = self.table_id(Path::new(&relation.to_table))?;
        let headers = WorkspaceHeaders {
            root: &self.root,
            sessions: &self.sessions,
        };
        Ok(self.graph.add_relation(&headers, relation)?)
    }

    pub fn remove_relation(&mut self, id: RelationId) -> Result<Relation, WorkspaceError> {
        Ok(self.graph.remove_relation(id)?)
    }

    /// Set the header row of `table` (a path, normalized to its table id)
    pub fn set_header_row(
        &mut self,
        table: &str,
        header_row: usize,
    ) -> Result<TableId, WorkspaceError> {
        let id = self.table_id(Path::new(table))?;
        self.graph.set_header_row(id.clone(), header_row);
        Ok(id)
    }

    /// Check every relation against open documents and files on disk
    pub fn validate_relations(&self) -> Vec<RelationIssue> {
        let headers = WorkspaceHeaders {
            root: &self.root,
            sessions: &self.sessions,
        };
        self.graph.validate(&headers)
    }

    pub fn save_relations(&self) -> Result<(), WorkspaceError> {
        Ok(self.relation_store.save_graph(&self.graph)?)
    }

    // === Layout ===

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    pub fn save_layout(&self) -> Result<(), WorkspaceError> {
        Ok(self.layout_store.save(&self.layout)?)
    }

    /// Drop layout entries for tables the graph does not know
    pub fn prune_layout(&mut self) -> Vec<TableId> {
        self.layout.prune(&self.graph)
    }

    // === Import ===

    /// Import external JSON into the relations/layout files, then reload
    /// whatever was written
    pub fn import(&mut self, json: &str) -> Result<ImportReport, WorkspaceError> {
        let report = import_document(json, &self.relation_store, &self.layout_store)?;

        if report.relations.is_some() {
            let mut graph = RelationGraph::with_default_header_row(self.config.default_header_row);
            self.relation_store.load_into(&mut graph)?;
            for id in self.sessions.keys() {
                graph.register_table(id.clone());
            }
            self.graph = graph;
        }
        if report.nodes.is_some() {
            self.layout = self.layout_store.load()?;
        }
        Ok(report)
    }
}
