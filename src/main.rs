use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;

use gridlink::cli::{CliArgs, Command, LayoutAction, RelationsAction};
use gridlink::config::WorkspaceConfig;
use gridlink::csv::{detect_delimiter, CellPosition, Delimiter};
use gridlink::grid::{DocumentSession, GridDocument};
use gridlink::relations::{Relation, RelationId};
use gridlink::workspace::Workspace;
use gridlink::{fill, find};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    gridlink::tracing::init(if args.verbose { "debug" } else { "warn" });

    match args.command {
        Command::Check { file } => check(&file),
        Command::Fill {
            file,
            row,
            col,
            count,
            write,
        } => {
            let mut session = load_session(&file)?;
            let col = column_index(&session, &col)?;
            fill::fill_down(&mut session, CellPosition::new(row, col), count)
                .with_context(|| format!("Failed to fill {}", file.display()))?;
            finish(&file, &session, write)
        }
        Command::Find {
            file,
            needle,
            ignore_case,
        } => {
            let session = load_session(&file)?;
            let doc = session.read();
            for hit in find::find_all(&doc, &needle, !ignore_case) {
                println!("{}:{}\t{}", hit.position.row, hit.position.col, hit.value);
            }
            Ok(())
        }
        Command::Replace {
            file,
            needle,
            replacement,
            ignore_case,
            write,
        } => {
            let mut session = load_session(&file)?;
            let changed = find::replace_all(&mut session, &needle, &replacement, !ignore_case)?;
            eprintln!("{} cell(s) replaced", changed);
            finish(&file, &session, write)
        }
        Command::Relations { workspace, action } => {
            let mut ws = open_workspace(&workspace.root)?;
            relations(&mut ws, action)
        }
        Command::Layout { workspace, action } => {
            let mut ws = open_workspace(&workspace.root)?;
            layout(&mut ws, action)
        }
    }
}

fn read_document(file: &Path) -> Result<GridDocument> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let delimiter = Delimiter::from_path(file).unwrap_or_else(|| detect_delimiter(&content));
    let doc = GridDocument::parse(&content, delimiter)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    Ok(doc.with_path(file))
}

fn load_session(file: &Path) -> Result<DocumentSession> {
    Ok(DocumentSession::new(read_document(file)?))
}

fn check(file: &Path) -> Result<()> {
    let doc = read_document(file)?;
    println!(
        "{}: {} data rows, {} columns ({:?}-delimited)",
        file.display(),
        doc.grid().data_row_count(),
        doc.column_count(),
        doc.delimiter().char()
    );
    Ok(())
}

/// Column given by index or header name
fn column_index(session: &DocumentSession, col: &str) -> Result<usize> {
    if let Ok(index) = col.parse::<usize>() {
        return Ok(index);
    }
    match session.read().grid().column_index(col) {
        Some(index) => Ok(index),
        None => bail!("No column named {:?}", col),
    }
}

/// Write the document back, or print it
fn finish(file: &Path, session: &DocumentSession, write: bool) -> Result<()> {
    let text = session.read().to_text()?;
    if write {
        std::fs::write(file, text)
            .with_context(|| format!("Failed to write {}", file.display()))?;
    } else {
        print!("{}", text);
    }
    Ok(())
}

fn open_workspace(root: &Path) -> Result<Workspace> {
    let config = WorkspaceConfig::for_workspace(root);
    Workspace::open(root, config)
        .with_context(|| format!("Failed to open workspace {}", root.display()))
}

fn relations(ws: &mut Workspace, action: RelationsAction) -> Result<()> {
    match action {
        RelationsAction::List { table } => {
            let table = table
                .map(|t| ws.table_id(Path::new(&t)))
                .transpose()?;
            for (id, relation) in ws.graph().list_relations(table.as_deref()) {
                println!("{}\t{}", id, relation);
            }
        }
        RelationsAction::Add {
            from,
            to,
            many,
            cardinality,
        } => {
            let relation = Relation::new(
                from.table,
                from.field,
                to.table,
                to.field,
                RelationsAction::cardinality(many, cardinality),
            );
            let id = ws.add_relation(relation)?;
            ws.save_relations()?;
            println!("{}", id);
        }
        RelationsAction::Remove { id } => {
            let removed = ws.remove_relation(RelationId(id))?;
            ws.save_relations()?;
            println!("removed {}", removed);
        }
        RelationsAction::Validate => {
            let issues = ws.validate_relations();
            for issue in &issues {
                let relation = ws
                    .graph()
                    .relation(issue.id)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!("{}\t{}\t{}", issue.id, relation, issue.error);
            }
            if !issues.is_empty() {
                bail!("{} relation(s) are stale", issues.len());
            }
        }
        RelationsAction::HeaderRow { table, row } => {
            let id = ws.set_header_row(&table, row)?;
            ws.save_relations()?;
            println!("{}\theader row {}", id, row);
        }
    }
    Ok(())
}

fn layout(ws: &mut Workspace, action: LayoutAction) -> Result<()> {
    match action {
        LayoutAction::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = ws.import(&json)?;
            if let Some(count) = report.relations {
                println!("imported {} relation(s)", count);
            }
            if let Some(count) = report.nodes {
                println!("imported {} layout node(s)", count);
            }
        }
        LayoutAction::Show => {
            for (table, position) in ws.layout().resolved(ws.graph()) {
                println!("{}\t{}\t{}", table, position.x, position.y);
            }
        }
        LayoutAction::Prune => {
            let pruned = ws.prune_layout();
            ws.save_layout()?;
            for table in pruned {
                println!("pruned {}", table);
            }
        }
    }
    Ok(())
}
