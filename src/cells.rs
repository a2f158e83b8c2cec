//! Multi-cell edits: paste a block, clear, set or number a selection
//!
//! Each operation is one undo step. Targets are data cells only; header
//! names change through column renames.

use crate::csv::{parse_block, CellPosition};
use crate::fill::add_decimal;
use crate::grid::{Axis, DocumentSession, EditCommand, GridDocument, GridError};

fn header_target() -> GridError {
    GridError::InvalidOperation("header cells are changed by renaming columns".to_string())
}

fn check_data_cell(doc: &GridDocument, pos: CellPosition) -> Result<(), GridError> {
    if pos.row == 0 {
        return Err(header_target());
    }
    if pos.row >= doc.row_count() {
        return Err(GridError::OutOfBounds {
            axis: Axis::Row,
            index: pos.row,
            len: doc.row_count(),
        });
    }
    if pos.col >= doc.column_count() {
        return Err(GridError::OutOfBounds {
            axis: Axis::Column,
            index: pos.col,
            len: doc.column_count(),
        });
    }
    Ok(())
}

/// Selection in row-major order without repeats
fn ordered(cells: &[CellPosition]) -> Vec<CellPosition> {
    let mut cells = cells.to_vec();
    cells.sort_unstable();
    cells.dedup();
    cells
}

/// Paste a tab-separated block with its top-left corner at `anchor`.
///
/// Rows the block needs past the end of the document are appended. Columns
/// past the last one are clipped.
pub fn paste_block(
    session: &mut DocumentSession,
    anchor: CellPosition,
    text: &str,
) -> Result<EditCommand, GridError> {
    let block = parse_block(text).map_err(|e| GridError::InvalidOperation(e.to_string()))?;

    session.batch(|doc, applied| {
        check_data_cell(doc, anchor)?;
        let width = doc.column_count() - anchor.col;

        for (offset, fields) in block.iter().enumerate() {
            let row = anchor.row + offset;
            while row >= doc.row_count() {
                applied.push(doc.insert_row(doc.row_count(), None)?);
            }
            for (col, value) in fields.iter().take(width).enumerate() {
                applied.push(doc.set_cell(row, anchor.col + col, value.clone())?);
            }
        }

        tracing::debug!(
            row = anchor.row,
            col = anchor.col,
            rows = block.len(),
            "pasted block"
        );
        Ok(())
    })
}

/// Set every selected cell to `value`
pub fn set_cells(
    session: &mut DocumentSession,
    cells: &[CellPosition],
    value: &str,
) -> Result<EditCommand, GridError> {
    let targets = ordered(cells);
    session.batch(|doc, applied| {
        for pos in targets {
            check_data_cell(doc, pos)?;
            applied.push(doc.set_cell(pos.row, pos.col, value)?);
        }
        Ok(())
    })
}

/// Blank every selected cell
pub fn clear_cells(
    session: &mut DocumentSession,
    cells: &[CellPosition],
) -> Result<EditCommand, GridError> {
    set_cells(session, cells, "")
}

/// Number the selection in row-major order, counting up from the first
/// cell's value.
///
/// The first cell must hold a plain decimal number (surrounding whitespace is
/// ignored); otherwise nothing changes. Results are written without leading
/// zeros: `"007"` numbers the selection `7`, `8`, `9`.
pub fn increment_cells(
    session: &mut DocumentSession,
    cells: &[CellPosition],
) -> Result<EditCommand, GridError> {
    let targets = ordered(cells);
    session.batch(|doc, applied| {
        for &pos in &targets {
            check_data_cell(doc, pos)?;
        }
        let Some(first) = targets.first() else {
            return Ok(());
        };

        let base = doc.cell(first.row, first.col).unwrap_or_default().trim();
        if base.is_empty() || !base.bytes().all(|b| b.is_ascii_digit()) {
            tracing::debug!(base, "first cell is not a number, nothing to increment");
            return Ok(());
        }
        let base = match base.trim_start_matches('0') {
            "" => "0".to_string(),
            digits => digits.to_string(),
        };

        for (offset, pos) in targets.iter().enumerate() {
            let value = add_decimal(&base, offset as u64);
            applied.push(doc.set_cell(pos.row, pos.col, value)?);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::Delimiter;

    fn session(text: &str) -> DocumentSession {
        DocumentSession::new(GridDocument::parse(text, Delimiter::Comma).unwrap())
    }

    fn text(s: &DocumentSession) -> String {
        s.read().to_text().unwrap()
    }

    #[test]
    fn test_paste_inside_grid() {
        let mut s = session("a,b,c\n1,2,3\n4,5,6\n");
        paste_block(&mut s, CellPosition::new(1, 1), "x\ty\nz\tw\n").unwrap();
        assert_eq!(text(&s), "a,b,c\n1,x,y\n4,z,w\n");
        assert_eq!(s.history().undo_count(), 1);
    }

    #[test]
    fn test_paste_rejects_header_anchor() {
        let mut s = session("a\n1\n");
        assert!(matches!(
            paste_block(&mut s, CellPosition::new(0, 0), "x"),
            Err(GridError::InvalidOperation(_))
        ));
        assert!(!s.history().can_undo());
    }

    #[test]
    fn test_empty_paste_records_nothing() {
        let mut s = session("a\n1\n");
        paste_block(&mut s, CellPosition::new(1, 0), "\t\n\n").unwrap();
        assert!(!s.history().can_undo());
    }

    #[test]
    fn test_set_cells_ignores_repeats() {
        let mut s = session("a,b\n1,2\n3,4\n");
        let cells = [
            CellPosition::new(2, 1),
            CellPosition::new(1, 0),
            CellPosition::new(2, 1),
        ];
        let cmd = set_cells(&mut s, &cells, "n/a").unwrap();

        assert_eq!(text(&s), "a,b\nn/a,2\n3,n/a\n");
        match cmd {
            EditCommand::Batch { commands } => assert_eq!(commands.len(), 2),
            other => panic!("Expected batch, got {:?}", other),
        }
    }

    #[test]
    fn test_set_cells_out_of_bounds_changes_nothing() {
        let mut s = session("a,b\n1,2\n");
        let cells = [CellPosition::new(1, 0), CellPosition::new(1, 5)];
        assert!(matches!(
            set_cells(&mut s, &cells, "x"),
            Err(GridError::OutOfBounds {
                axis: Axis::Column,
                ..
            })
        ));
        assert_eq!(text(&s), "a,b\n1,2\n");
    }

    #[test]
    fn test_increment_requires_number() {
        let mut s = session("a\nabc\nx\n");
        let cells = [CellPosition::new(1, 0), CellPosition::new(2, 0)];
        increment_cells(&mut s, &cells).unwrap();
        assert!(!s.history().can_undo());
    }

    #[test]
    fn test_increment_drops_leading_zeros() {
        let mut s = session("a,b\n 007 ,x\n,y\n,z\n");
        let cells = [
            CellPosition::new(3, 0),
            CellPosition::new(1, 0),
            CellPosition::new(2, 0),
        ];
        increment_cells(&mut s, &cells).unwrap();
        assert_eq!(text(&s), "a,b\n7,x\n8,y\n9,z\n");
    }
}
