//! Cell values and A1-style references.
//!
//! Cells are a thin data holder: the package engine only needs to write them into
//! `<sheetData>` and read them back.

/// Value stored in a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    /// Text; written through the shared string table
    String(String),
    Bool(bool),
    /// Error literal such as `#DIV/0!`
    Error(String),
    /// Formula text without the leading `=`, with the last computed value if known
    Formula {
        formula: String,
        cached: Option<Box<CellValue>>,
    },
}

impl CellValue {
    pub fn formula<S: Into<String>>(formula: S) -> Self {
        CellValue::Formula {
            formula: formula.into(),
            cached: None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

/// A cell: value plus an optional opaque index into the styles part.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<u32>,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self { value, style: None }
    }
}

/// Largest column index (`XFD`).
pub const MAX_COLUMNS: u32 = 16_384;

/// Largest row index.
pub const MAX_ROWS: u32 = 1_048_576;

/// Convert a 1-based column number to letters (1 -> `A`, 27 -> `AA`).
pub fn column_to_letters(col: u32) -> String {
    let mut letters = Vec::with_capacity(3);
    let mut col = col;
    while col > 0 {
        col -= 1;
        letters.push(b'A' + (col % 26) as u8);
        col /= 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Build an A1 reference from 1-based (row, column).
pub fn coords_to_reference(row: u32, col: u32) -> String {
    format!("{}{}", column_to_letters(col), row)
}

/// Parse an A1 reference (`$` markers allowed) into 1-based (row, column).
pub fn reference_to_coords(reference: &str) -> Option<(u32, u32)> {
    let bytes = reference.as_bytes();
    let mut pos = 0;
    if bytes.first() == Some(&b'$') {
        pos += 1;
    }

    let mut col = 0u32;
    let col_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
        col = col
            .checked_mul(26)?
            .checked_add((bytes[pos].to_ascii_uppercase() - b'A' + 1) as u32)?;
        pos += 1;
    }
    if pos == col_start {
        return None;
    }
    if bytes.get(pos) == Some(&b'$') {
        pos += 1;
    }

    let row = atoi_simd::parse::<u32>(&bytes[pos..]).ok()?;
    if row == 0 || row > MAX_ROWS || col > MAX_COLUMNS {
        return None;
    }
    Some((row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(column_to_letters(1), "A");
        assert_eq!(column_to_letters(26), "Z");
        assert_eq!(column_to_letters(27), "AA");
        assert_eq!(column_to_letters(MAX_COLUMNS), "XFD");
    }

    #[test]
    fn test_reference_to_coords() {
        assert_eq!(reference_to_coords("A1"), Some((1, 1)));
        assert_eq!(reference_to_coords("$C$12"), Some((12, 3)));
        assert_eq!(reference_to_coords("ab3"), Some((3, 28)));
        assert_eq!(reference_to_coords("12"), None);
        assert_eq!(reference_to_coords("A0"), None);
        assert_eq!(reference_to_coords("A1B"), None);
        assert_eq!(reference_to_coords("XFE1"), None);
    }

    proptest! {
        #[test]
        fn reference_conversion_is_reversible(row in 1u32..=MAX_ROWS, col in 1u32..=MAX_COLUMNS) {
            let reference = coords_to_reference(row, col);
            prop_assert_eq!(reference_to_coords(&reference), Some((row, col)));
        }
    }
}
