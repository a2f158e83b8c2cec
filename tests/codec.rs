//! Delimited codec tests
//!
//! Round-trips between raw text and the grid, quoting, and the parse error
//! surfaced at the raw/grid boundary.

use gridlink::csv::{parse_csv, serialize_csv, Delimiter, Grid, ParseErrorKind};

fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
    data.iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect()
}

// ========================================================================
// Round-trip Tests
// ========================================================================

#[test]
fn test_plain_grid_roundtrips() {
    let grid = Grid::from_rows(rows(&[
        &["id", "name", "city"],
        &["1", "Ada", "London"],
        &["2", "Grace", "Arlington"],
        &["3", "", ""],
    ]))
    .unwrap();

    for delimiter in [Delimiter::Comma, Delimiter::Tab] {
        let text = serialize_csv(&grid, delimiter).unwrap();
        assert_eq!(parse_csv(&text, delimiter).unwrap(), grid);
    }
}

#[test]
fn test_text_roundtrips_unchanged() {
    let text = "id,name\n1,Ada\n2,Grace\n";
    let grid = parse_csv(text, Delimiter::Comma).unwrap();
    assert_eq!(serialize_csv(&grid, Delimiter::Comma).unwrap(), text);
}

#[test]
fn test_field_with_delimiter_newline_and_quote_roundtrips() {
    let tricky = "a,b\nsecond \"line\"";
    let grid = Grid::from_rows(rows(&[&["note", "other"], &[tricky, "x"]])).unwrap();

    let text = serialize_csv(&grid, Delimiter::Comma).unwrap();
    assert_eq!(text, "note,other\n\"a,b\nsecond \"\"line\"\"\",x\n");

    let parsed = parse_csv(&text, Delimiter::Comma).unwrap();
    assert_eq!(parsed.get(1, 0), Some(tricky));
}

#[test]
fn test_tab_field_roundtrips_in_tsv() {
    let grid = Grid::from_rows(rows(&[&["k", "v"], &["has\ttab", "has,comma"]])).unwrap();
    let text = serialize_csv(&grid, Delimiter::Tab).unwrap();

    assert_eq!(text, "k\tv\n\"has\ttab\"\thas,comma\n");
    assert_eq!(parse_csv(&text, Delimiter::Tab).unwrap(), grid);
}

#[test]
fn test_header_only_roundtrips() {
    let grid = Grid::with_header(["a", "b"]).unwrap();
    let text = serialize_csv(&grid, Delimiter::Comma).unwrap();
    assert_eq!(text, "a,b\n");
    assert_eq!(parse_csv(&text, Delimiter::Comma).unwrap(), grid);
}

// ========================================================================
// Parse Error Tests
// ========================================================================

#[test]
fn test_short_row_error_contract() {
    let err = parse_csv("a,b,c\n1,2\n", Delimiter::Comma).unwrap_err();

    assert_eq!(err.line, 2);
    assert_eq!(err.expected_column_count(), Some(3));
    assert_eq!(err.actual_column_count(), Some(2));
    assert_eq!(
        err.to_string(),
        "CSV parse error at line 2: found 2 columns, expected 3"
    );
}

#[test]
fn test_first_bad_row_is_reported() {
    let err = parse_csv("a,b\n1,2\n3\n4,5,6\n", Delimiter::Comma).unwrap_err();
    assert_eq!(err.line, 3);
    assert_eq!(
        err.kind,
        ParseErrorKind::RowLengthMismatch {
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn test_duplicate_header_is_rejected() {
    let err = parse_csv("id,name,id\n", Delimiter::Comma).unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::DuplicateHeader {
            name: "id".to_string()
        }
    );
}

#[test]
fn test_header_names_are_case_sensitive() {
    let grid = parse_csv("Id,id\n1,2\n", Delimiter::Comma).unwrap();
    assert_eq!(grid.column_count(), 2);
}

#[test]
fn test_from_rows_checks_shape() {
    let err = Grid::from_rows(rows(&[&["a", "b"], &["1"]])).unwrap_err();
    assert_eq!(err.line, 2);
}
