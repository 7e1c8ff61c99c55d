//! Parsing and formatting of Excel-style cell references and ranges.
//!
//! Rows and columns are 1-based throughout (`A` = column 1). Columns use
//! base-26 letters with no zero digit (`Z` = 26, `AA` = 27).

use crate::error::{Result, SheetpackError};

/// Highest column Excel supports (XFD).
pub const MAX_COL: u32 = 16_384;
/// Highest row Excel supports.
pub const MAX_ROW: u32 = 1_048_576;

fn invalid(input: &str) -> SheetpackError {
    SheetpackError::InvalidAddress(input.to_string())
}

/// Convert a 1-based column number to its letter form (`1` -> `"A"`, `27` -> `"AA"`).
#[allow(clippy::cast_possible_truncation, clippy::indexing_slicing)] // rem < 26, len <= 3 for col <= MAX_COL
pub fn col_to_letters(col: u32) -> Result<String> {
    if col == 0 || col > MAX_COL {
        return Err(invalid(&format!("column {col}")));
    }
    let mut letters = [0u8; 3];
    let mut len = 0;
    let mut n = col;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters[len] = b'A' + rem;
        len += 1;
        n = (n - 1) / 26;
    }
    letters[..len].reverse();
    // Only ASCII letters went in.
    Ok(std::str::from_utf8(&letters[..len]).unwrap_or("A").to_string())
}

/// Format a (row, col) pair as an address like `"B3"`.
pub fn to_address(row: u32, col: u32) -> Result<String> {
    if row == 0 || row > MAX_ROW {
        return Err(invalid(&format!("row {row}")));
    }
    Ok(format!("{}{row}", col_to_letters(col)?))
}

/// Parse a cell reference like `"B3"` or `"$B$3"` into (row, col), both 1-based.
///
/// Fails with `InvalidAddress` on empty input, interleaved letters/digits,
/// a zero row, or out-of-range coordinates.
pub fn parse_cell_ref(cell_ref: &str) -> Result<(u32, u32)> {
    let s = cell_ref.trim();
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for ch in s.chars() {
        if ch == '$' && !saw_row {
            continue;
        }
        if ch.is_ascii_alphabetic() {
            if saw_row {
                // Letters after digits: "A1B" is not an address.
                return Err(invalid(cell_ref));
            }
            let upper = ch.to_ascii_uppercase();
            col = col
                .saturating_mul(26)
                .saturating_add(upper as u32 - 'A' as u32 + 1);
            saw_col = true;
        } else if ch.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(ch as u32 - '0' as u32);
            saw_row = true;
        } else {
            return Err(invalid(cell_ref));
        }
    }

    if !saw_col || !saw_row || row == 0 || row > MAX_ROW || col > MAX_COL {
        return Err(invalid(cell_ref));
    }
    Ok((row, col))
}

/// Parse a range like `"A1:B10"` (or a single ref `"A1"`) into
/// (start_row, start_col, end_row, end_col), all 1-based.
pub fn parse_cell_range(range: &str) -> Result<(u32, u32, u32, u32)> {
    if let Some((start, end)) = range.split_once(':') {
        let (start_row, start_col) = parse_cell_ref(start)?;
        let (end_row, end_col) = parse_cell_ref(end)?;
        Ok((start_row, start_col, end_row, end_col))
    } else {
        let (row, col) = parse_cell_ref(range)?;
        Ok((row, col, row, col))
    }
}

/// Format an absolute, sheet-qualified reference like `'Sheet 1'!$B$3`.
///
/// This is the form defined names are serialized in.
pub fn format_absolute(sheet: &str, row: u32, col: u32) -> Result<String> {
    if row == 0 || row > MAX_ROW {
        return Err(invalid(&format!("row {row}")));
    }
    let letters = col_to_letters(col)?;
    Ok(format!(
        "'{}'!${letters}${row}",
        sheet.replace('\'', "''")
    ))
}

/// Parse a sheet-qualified reference (`'Sheet 1'!$B$3` or `Sheet1!B3`)
/// into (sheet, row, col). The sheet part is optional.
pub fn parse_absolute(reference: &str) -> Result<(Option<String>, u32, u32)> {
    match reference.rsplit_once('!') {
        Some((sheet, cell)) => {
            let sheet = sheet
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .map_or_else(|| sheet.to_string(), |s| s.replace("''", "'"));
            let (row, col) = parse_cell_ref(cell)?;
            Ok((Some(sheet), row, col))
        }
        None => {
            let (row, col) = parse_cell_ref(reference)?;
            Ok((None, row, col))
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_col_to_letters() {
        assert_eq!(col_to_letters(1).unwrap(), "A");
        assert_eq!(col_to_letters(26).unwrap(), "Z");
        assert_eq!(col_to_letters(27).unwrap(), "AA");
        assert_eq!(col_to_letters(52).unwrap(), "AZ");
        assert_eq!(col_to_letters(702).unwrap(), "ZZ");
        assert_eq!(col_to_letters(703).unwrap(), "AAA");
        assert_eq!(col_to_letters(MAX_COL).unwrap(), "XFD");
        assert!(col_to_letters(0).is_err());
        assert!(col_to_letters(MAX_COL + 1).is_err());
    }

    #[test]
    fn test_to_address() {
        assert_eq!(to_address(3, 2).unwrap(), "B3");
        assert_eq!(to_address(1, 1).unwrap(), "A1");
        assert_eq!(to_address(10, 28).unwrap(), "AB10");
        assert!(to_address(0, 1).is_err());
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("B3").unwrap(), (3, 2));
        assert_eq!(parse_cell_ref("$B$3").unwrap(), (3, 2));
        assert_eq!(parse_cell_ref("aa10").unwrap(), (10, 27));
        assert_eq!(parse_cell_ref(" A1 ").unwrap(), (1, 1));
    }

    #[test]
    fn test_parse_cell_ref_rejects_malformed() {
        assert!(parse_cell_ref("").is_err());
        assert!(parse_cell_ref("A").is_err());
        assert!(parse_cell_ref("1").is_err());
        assert!(parse_cell_ref("A0").is_err());
        assert!(parse_cell_ref("A1B").is_err());
        assert!(parse_cell_ref("A-1").is_err());
        assert!(parse_cell_ref("XFE1").is_err());
    }

    #[test]
    fn test_parse_cell_range() {
        assert_eq!(parse_cell_range("A1:B10").unwrap(), (1, 1, 10, 2));
        assert_eq!(parse_cell_range("C5").unwrap(), (5, 3, 5, 3));
        assert!(parse_cell_range("A1:").is_err());
    }

    #[test]
    fn test_address_roundtrip() {
        for &(row, col) in &[(1, 1), (3, 2), (100, 27), (1_048_576, 16_384)] {
            let addr = to_address(row, col).unwrap();
            assert_eq!(parse_cell_ref(&addr).unwrap(), (row, col));
        }
    }

    #[test]
    fn test_format_absolute() {
        assert_eq!(format_absolute("blort", 3, 1).unwrap(), "'blort'!$A$3");
        assert_eq!(
            format_absolute("it's", 1, 2).unwrap(),
            "'it''s'!$B$1"
        );
    }

    #[test]
    fn test_parse_absolute() {
        assert_eq!(
            parse_absolute("'blort'!$A$3").unwrap(),
            (Some("blort".to_string()), 3, 1)
        );
        assert_eq!(
            parse_absolute("Sheet1!B2").unwrap(),
            (Some("Sheet1".to_string()), 2, 2)
        );
        assert_eq!(parse_absolute("C4").unwrap(), (None, 4, 3));
    }
}
