//! Command-line argument parsing
//!
//! Supports:
//! - Checking a delimited file (shape, parse errors)
//! - Pattern fill, find and replace on one file
//! - Listing, adding, removing and validating relations in a workspace
//! - Importing and showing the relation graph layout

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::relations::Cardinality;

/// Delimited-table tool with cross-file relations
#[derive(Parser, Debug)]
#[command(name = "gridlink", version, about = "Delimited-table tool with cross-file relations")]
pub struct CliArgs {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a file and report its shape or the first parse error
    Check {
        file: PathBuf,
    },
    /// Extend the value at ROW/COL down its column
    Fill {
        file: PathBuf,
        /// Anchor row (the header is row 0)
        #[arg(long)]
        row: usize,
        /// Anchor column, by index or header name
        #[arg(long)]
        col: String,
        /// Number of cells to fill below the anchor
        #[arg(long)]
        count: usize,
        /// Write the result back instead of printing it
        #[arg(long)]
        write: bool,
    },
    /// List data cells containing NEEDLE
    Find {
        file: PathBuf,
        needle: String,
        #[arg(short, long)]
        ignore_case: bool,
    },
    /// Replace every data cell containing NEEDLE with REPLACEMENT
    Replace {
        file: PathBuf,
        needle: String,
        replacement: String,
        #[arg(short, long)]
        ignore_case: bool,
        /// Write the result back instead of printing it
        #[arg(long)]
        write: bool,
    },
    /// Relations between tables of a workspace
    Relations {
        #[command(flatten)]
        workspace: WorkspaceArgs,
        #[command(subcommand)]
        action: RelationsAction,
    },
    /// Relation graph layout of a workspace
    Layout {
        #[command(flatten)]
        workspace: WorkspaceArgs,
        #[command(subcommand)]
        action: LayoutAction,
    },
}

#[derive(Args, Debug)]
pub struct WorkspaceArgs {
    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum RelationsAction {
    /// List relations, optionally only those touching TABLE
    List {
        #[arg(long)]
        table: Option<String>,
    },
    /// Add a relation between two fields (TABLE.FIELD or TABLE:FIELD)
    Add {
        #[arg(value_parser = parse_field_ref)]
        from: FieldRef,
        #[arg(value_parser = parse_field_ref)]
        to: FieldRef,
        /// one_to_many instead of one_to_one
        #[arg(long, conflicts_with = "cardinality")]
        many: bool,
        #[arg(long)]
        cardinality: Option<Cardinality>,
    },
    /// Remove a relation by the id shown in `list`
    Remove {
        id: u64,
    },
    /// Report relations whose tables or fields no longer exist
    Validate,
    /// Set the row a table's header lives on
    HeaderRow {
        table: String,
        row: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum LayoutAction {
    /// Import a JSON document with `relations` and/or `nodes`
    Import {
        file: PathBuf,
    },
    /// Print the position of every table
    Show,
    /// Drop saved positions of tables no longer in the graph
    Prune,
}

/// A `table` + `field` pair given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub table: String,
    pub field: String,
}

/// `users.csv:id` splits at the colon; `users.csv.id` at the last dot
pub fn parse_field_ref(s: &str) -> Result<FieldRef, String> {
    let (table, field) = s
        .split_once(':')
        .or_else(|| s.rsplit_once('.'))
        .ok_or_else(|| format!("expected TABLE.FIELD or TABLE:FIELD, got {:?}", s))?;
    if table.is_empty() || field.is_empty() {
        return Err(format!("expected TABLE.FIELD or TABLE:FIELD, got {:?}", s));
    }
    Ok(FieldRef {
        table: table.to_string(),
        field: field.to_string(),
    })
}

impl RelationsAction {
    /// Cardinality requested by `add`
    pub fn cardinality(many: bool, explicit: Option<Cardinality>) -> Cardinality {
        match (explicit, many) {
            (Some(cardinality), _) => cardinality,
            (None, true) => Cardinality::OneToMany,
            (None, false) => Cardinality::OneToOne,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_check_command() {
        let args = parse(&["gridlink", "check", "data.csv"]);
        assert!(matches!(args.command, Command::Check { file } if file == PathBuf::from("data.csv")));
        assert!(!args.verbose);
    }

    #[test]
    fn test_fill_command() {
        let args = parse(&[
            "gridlink", "fill", "data.csv", "--row", "1", "--col", "id", "--count", "3", "-v",
        ]);
        assert!(args.verbose);
        let Command::Fill {
            row,
            col,
            count,
            write,
            ..
        } = args.command
        else {
            panic!("Expected fill command");
        };
        assert_eq!((row, col.as_str(), count, write), (1, "id", 3, false));
    }

    #[test]
    fn test_relations_add_defaults() {
        let args = parse(&["gridlink", "relations", "add", "orders.csv.user_id", "users.csv:id"]);
        let Command::Relations { workspace, action } = args.command else {
            panic!("Expected relations command");
        };
        assert_eq!(workspace.root, PathBuf::from("."));
        let RelationsAction::Add {
            from,
            to,
            many,
            cardinality,
        } = action
        else {
            panic!("Expected add action");
        };
        assert_eq!(from.table, "orders.csv");
        assert_eq!(from.field, "user_id");
        assert_eq!(to.table, "users.csv");
        assert_eq!(to.field, "id");
        assert_eq!(
            RelationsAction::cardinality(many, cardinality),
            Cardinality::OneToOne
        );
    }

    #[test]
    fn test_relations_root_and_many() {
        let args = parse(&[
            "gridlink", "relations", "--root", "/data", "add", "a.csv.x", "b.csv.y", "--many",
        ]);
        let Command::Relations { workspace, action } = args.command else {
            panic!("Expected relations command");
        };
        assert_eq!(workspace.root, PathBuf::from("/data"));
        assert!(matches!(action, RelationsAction::Add { many: true, .. }));
    }

    #[test]
    fn test_explicit_cardinality() {
        let args = parse(&[
            "gridlink",
            "relations",
            "add",
            "a.csv.x",
            "b.csv.y",
            "--cardinality",
            "1:n",
        ]);
        let Command::Relations {
            action: RelationsAction::Add { cardinality, .. },
            ..
        } = args.command
        else {
            panic!("Expected add action");
        };
        assert_eq!(cardinality, Some(Cardinality::OneToMany));
    }

    #[test]
    fn test_bad_field_ref_is_rejected() {
        assert!(CliArgs::try_parse_from(["gridlink", "relations", "add", "nofield", "b.csv.y"])
            .is_err());
        assert!(parse_field_ref("table.").is_err());
        assert!(parse_field_ref(":field").is_err());
    }

    #[test]
    fn test_layout_subcommands() {
        let args = parse(&["gridlink", "layout", "import", "graph.json"]);
        assert!(matches!(
            args.command,
            Command::Layout {
                action: LayoutAction::Import { .. },
                ..
            }
        ));
        let args = parse(&["gridlink", "layout", "show"]);
        assert!(matches!(
            args.command,
            Command::Layout {
                action: LayoutAction::Show,
                ..
            }
        ));
    }
}
