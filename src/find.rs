//! Grid search and replace
//!
//! Only data rows are searched; the header row never matches.

use crate::csv::CellPosition;
use crate::grid::{DocumentSession, GridDocument, GridError};

/// A data cell whose value contains the search text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMatch {
    pub position: CellPosition,
    pub value: String,
}

fn matches(value: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        value.contains(needle)
    } else {
        value.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Every data cell containing `needle`, in row-major order
pub fn find_all(doc: &GridDocument, needle: &str, case_sensitive: bool) -> Vec<CellMatch> {
    if needle.is_empty() {
        return Vec::new();
    }
    doc.grid()
        .rows()
        .iter()
        .enumerate()
        .skip(1)
        .flat_map(|(row, cells)| {
            cells.iter().enumerate().filter_map(move |(col, value)| {
                matches(value, needle, case_sensitive).then(|| CellMatch {
                    position: CellPosition::new(row, col),
                    value: value.clone(),
                })
            })
        })
        .collect()
}

/// First matching cell after `after` in row-major order, wrapping around
pub fn find_next(
    doc: &GridDocument,
    needle: &str,
    after: Option<CellPosition>,
    case_sensitive: bool,
) -> Option<CellPosition> {
    let cols = doc.column_count();
    let data_rows = doc.grid().data_row_count();
    if needle.is_empty() || cols == 0 || data_rows == 0 {
        return None;
    }

    let total = data_rows * cols;
    let start = match after {
        Some(pos) if pos.row >= 1 => ((pos.row - 1) * cols + pos.col + 1) % total,
        _ => 0,
    };

    (0..total)
        .map(|offset| (start + offset) % total)
        .map(|idx| CellPosition::new(idx / cols + 1, idx % cols))
        .find(|pos| {
            doc.cell(pos.row, pos.col)
                .is_some_and(|value| matches(value, needle, case_sensitive))
        })
}

/// Set every data cell containing `needle` to `replacement`, as one undo step.
///
/// Returns the number of cells changed.
pub fn replace_all(
    session: &mut DocumentSession,
    needle: &str,
    replacement: &str,
    case_sensitive: bool,
) -> Result<usize, GridError> {
    let mut changed = 0;
    session.batch(|doc, applied| {
        let targets = find_all(doc, needle, case_sensitive);
        for hit in targets {
            let cmd = doc.set_cell(hit.position.row, hit.position.col, replacement)?;
            if !cmd.is_noop() {
                changed += 1;
            }
            applied.push(cmd);
        }
        Ok(())
    })?;
    tracing::debug!(needle, changed, "replace all");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::Delimiter;

    fn doc() -> GridDocument {
        GridDocument::parse("name,city\nAda,London\nalan,Wilmslow\n", Delimiter::Comma).unwrap()
    }

    #[test]
    fn test_find_all_case_sensitive() {
        let hits = find_all(&doc(), "A", true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, CellPosition::new(1, 0));
    }

    #[test]
    fn test_find_all_case_insensitive() {
        let hits = find_all(&doc(), "a", false);
        let positions: Vec<_> = hits.iter().map(|h| h.position).collect();
        assert_eq!(
            positions,
            vec![CellPosition::new(1, 0), CellPosition::new(2, 0)]
        );
    }

    #[test]
    fn test_header_is_not_searched() {
        assert!(find_all(&doc(), "city", true).is_empty());
    }

    #[test]
    fn test_empty_needle_matches_nothing() {
        assert!(find_all(&doc(), "", true).is_empty());
        assert_eq!(find_next(&doc(), "", None, true), None);
    }

    #[test]
    fn test_find_next_wraps() {
        let d = doc();
        let first = find_next(&d, "l", None, true).unwrap();
        assert_eq!(first, CellPosition::new(2, 0));

        let second = find_next(&d, "l", Some(first), true).unwrap();
        assert_eq!(second, CellPosition::new(2, 1));

        let wrapped = find_next(&d, "l", Some(second), true).unwrap();
        assert_eq!(wrapped, CellPosition::new(2, 0));
    }
}
