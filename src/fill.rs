//! Pattern fill - extends a numeric suffix pattern down a column
//!
//! `"item_001"` decomposes into prefix `"item_"`, digits `"001"` and suffix
//! `""`; filling three cells yields `item_002`, `item_003`, `item_004`.
//! The digit width is preserved but never truncates (`"999"` + 1 is `"1000"`).
//! Values without any digit are repeated unchanged.

use crate::csv::CellPosition;
use crate::grid::{Axis, DocumentSession, EditCommand, GridError};

/// A value split around its last run of ASCII digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericPattern<'a> {
    pub prefix: &'a str,
    pub digits: &'a str,
    pub suffix: &'a str,
}

impl NumericPattern<'_> {
    /// The value `offset` steps after the anchor
    pub fn nth(&self, offset: u64) -> String {
        format!(
            "{}{}{}",
            self.prefix,
            add_decimal(self.digits, offset),
            self.suffix
        )
    }
}

/// Split `value` around its last maximal run of decimal digits
pub fn decompose(value: &str) -> Option<NumericPattern<'_>> {
    let bytes = value.as_bytes();
    let end = bytes.iter().rposition(u8::is_ascii_digit)? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);

    Some(NumericPattern {
        prefix: &value[..start],
        digits: &value[start..end],
        suffix: &value[end..],
    })
}

/// Values for the `count` cells following `anchor`
pub fn generate(anchor: &str, count: usize) -> Vec<String> {
    match decompose(anchor) {
        Some(pattern) => (1..=count as u64).map(|offset| pattern.nth(offset)).collect(),
        None => vec![anchor.to_string(); count],
    }
}

/// Add `offset` to a decimal digit string, keeping its width (leading zeros)
/// and growing it when the sum needs more digits
pub(crate) fn add_decimal(digits: &str, offset: u64) -> String {
    let mut out: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
    let mut carry = offset;
    let mut i = out.len();

    while carry > 0 && i > 0 {
        i -= 1;
        let sum = u64::from(out[i]) + carry % 10;
        out[i] = (sum % 10) as u8;
        carry = carry / 10 + sum / 10;
    }

    let mut prefix = Vec::new();
    while carry > 0 {
        prefix.push((carry % 10) as u8);
        carry /= 10;
    }
    prefix.reverse();
    prefix.extend(out);

    prefix.into_iter().map(|d| char::from(b'0' + d)).collect()
}

/// Fill the `count` cells below `anchor` in its column as one undo step.
///
/// Rows past the end of the document are inserted first.
pub fn fill_down(
    session: &mut DocumentSession,
    anchor: CellPosition,
    count: usize,
) -> Result<EditCommand, GridError> {
    session.batch(|doc, applied| {
        if anchor.row == 0 {
            return Err(GridError::InvalidOperation(
                "the header cannot anchor a fill".to_string(),
            ));
        }
        let seed = doc
            .cell(anchor.row, anchor.col)
            .ok_or(if anchor.row >= doc.row_count() {
                GridError::OutOfBounds {
                    axis: Axis::Row,
                    index: anchor.row,
                    len: doc.row_count(),
                }
            } else {
                GridError::OutOfBounds {
                    axis: Axis::Column,
                    index: anchor.col,
                    len: doc.column_count(),
                }
            })?
            .to_string();

        for (offset, value) in generate(&seed, count).into_iter().enumerate() {
            let target = anchor.row + 1 + offset;
            while target >= doc.row_count() {
                applied.push(doc.insert_row(doc.row_count(), None)?);
            }
            applied.push(doc.set_cell(target, anchor.col, value)?);
        }

        tracing::debug!(
            row = anchor.row,
            col = anchor.col,
            count,
            seed = %seed,
            "pattern fill"
        );
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose() {
        assert_eq!(
            decompose("item_001"),
            Some(NumericPattern {
                prefix: "item_",
                digits: "001",
                suffix: "",
            })
        );
        assert_eq!(
            decompose("v2.txt"),
            Some(NumericPattern {
                prefix: "v",
                digits: "2",
                suffix: ".txt",
            })
        );
        assert_eq!(decompose("a1b22c").map(|p| p.digits), Some("22"));
        assert_eq!(decompose("no digits"), None);
        assert_eq!(decompose(""), None);
    }

    #[test]
    fn test_generate_preserves_width() {
        assert_eq!(
            generate("item_001", 3),
            vec!["item_002", "item_003", "item_004"]
        );
    }

    #[test]
    fn test_generate_without_digits_repeats() {
        assert_eq!(generate("x", 2), vec!["x", "x"]);
    }

    #[test]
    fn test_generate_grows_past_width() {
        assert_eq!(generate("v999", 1), vec!["v1000"]);
        assert_eq!(generate("09", 2), vec!["10", "11"]);
    }

    #[test]
    fn test_generate_handles_huge_numbers() {
        assert_eq!(
            generate("id99999999999999999999999", 1),
            vec!["id100000000000000000000000"]
        );
    }

    #[test]
    fn test_generate_zero_count() {
        assert!(generate("a1", 0).is_empty());
    }

    #[test]
    fn test_add_decimal_multi_digit_offset() {
        assert_eq!(add_decimal("0005", 123), "0128");
        assert_eq!(add_decimal("95", 10), "105");
    }
}
