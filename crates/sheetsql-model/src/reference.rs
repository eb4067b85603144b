//! A1-style cell references
//!
//! Columns are addressed by spreadsheet letters (A, B, ..., Z, AA, ...) and
//! rows by 1-based numbers in text form; internally everything is zero-based.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

/// Highest zero-based column index addressable with three letters (`XFD`).
pub const MAX_COLUMN_INDEX: u32 = 16_383;

/// Convert a zero-based column index to its letter name (0 = A, 25 = Z, 26 = AA)
pub fn column_name(index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = index as u64 + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Convert column letters to a zero-based index (A = 0, B = 1, ..., AA = 26)
///
/// Letters are matched case-insensitively.
pub fn column_index(name: &str) -> Result<u32, ReferenceError> {
    if name.is_empty() {
        return Err(ReferenceError::InvalidColumn(name.to_string()));
    }

    let mut result: u64 = 0;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(ReferenceError::InvalidColumn(name.to_string()));
        }
        let value = (c.to_ascii_uppercase() as u64) - ('A' as u64) + 1;
        result = result * 26 + value;
        if result > MAX_COLUMN_INDEX as u64 + 1 {
            return Err(ReferenceError::ColumnOutOfRange(name.to_string()));
        }
    }
    Ok((result - 1) as u32)
}

/// A single cell position (zero-based row and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    /// Zero-based row index
    pub row: u32,
    /// Zero-based column index
    pub col: u32,
}

impl CellRef {
    /// Create a reference from zero-based coordinates
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse a reference like `B3` or `$B$3`
    pub fn parse(text: &str) -> Result<Self, ReferenceError> {
        let cell = text.trim();
        if cell.is_empty() {
            return Err(ReferenceError::InvalidCell(text.to_string()));
        }

        let mut col_str = String::new();
        let mut row_str = String::new();

        for c in cell.chars() {
            if c == '$' {
                continue;
            }
            if c.is_ascii_alphabetic() && row_str.is_empty() {
                col_str.push(c);
            } else if c.is_ascii_digit() && !col_str.is_empty() {
                row_str.push(c);
            } else {
                return Err(ReferenceError::InvalidCell(text.to_string()));
            }
        }

        if col_str.is_empty() || row_str.is_empty() {
            return Err(ReferenceError::InvalidCell(text.to_string()));
        }

        let col = column_index(&col_str)?;
        let row: u32 = row_str
            .parse()
            .map_err(|_| ReferenceError::InvalidCell(text.to_string()))?;
        if row == 0 {
            return Err(ReferenceError::InvalidCell(text.to_string()));
        }

        Ok(Self { row: row - 1, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row as u64 + 1)
    }
}

impl FromStr for CellRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A rectangular block of cells, both corners inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    /// Top-left corner
    pub start: CellRef,
    /// Bottom-right corner
    pub end: CellRef,
}

impl CellRange {
    /// Create a range, normalizing the corners so `start` is top-left
    pub fn new(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse `A1:C10`; a single reference like `A1` is a one-cell range
    pub fn parse(text: &str) -> Result<Self, ReferenceError> {
        let parts: Vec<&str> = text.split(':').collect();
        match parts.as_slice() {
            [single] => {
                let cell = CellRef::parse(single)?;
                Ok(Self::new(cell, cell))
            }
            [first, last] => Ok(Self::new(CellRef::parse(first)?, CellRef::parse(last)?)),
            _ => Err(ReferenceError::InvalidRange(text.to_string())),
        }
    }

    /// Number of rows covered
    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns covered
    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Check whether a cell lies inside the range
    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Iterate over every cell position, row by row
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellRef::new(row, col))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl FromStr for CellRange {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(1), "B");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(51), "AZ");
        assert_eq!(column_name(52), "BA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
        assert_eq!(column_name(MAX_COLUMN_INDEX), "XFD");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A").unwrap(), 0);
        assert_eq!(column_index("b").unwrap(), 1);
        assert_eq!(column_index("Z").unwrap(), 25);
        assert_eq!(column_index("AA").unwrap(), 26);
        assert_eq!(column_index("AZ").unwrap(), 51);
        assert_eq!(column_index("XFD").unwrap(), MAX_COLUMN_INDEX);
        assert!(column_index("").is_err());
        assert!(column_index("A1").is_err());
        assert!(column_index("XFE").is_err());
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef::new(0, 0));
        assert_eq!(CellRef::parse("B2").unwrap(), CellRef::new(1, 1));
        assert_eq!(CellRef::parse("ab10").unwrap(), CellRef::new(9, 27));
        assert_eq!(CellRef::parse("$C$4").unwrap(), CellRef::new(3, 2));
        assert!(CellRef::parse("A0").is_err());
        assert!(CellRef::parse("1A").is_err());
        assert!(CellRef::parse("A1B").is_err());
        assert!(CellRef::parse("").is_err());
    }

    #[test]
    fn test_cell_ref_display() {
        assert_eq!(CellRef::new(0, 0).to_string(), "A1");
        assert_eq!(CellRef::new(9, 27).to_string(), "AB10");
    }

    #[test]
    fn test_parse_range() {
        let range = CellRange::parse("A1:C10").unwrap();
        assert_eq!(range.start, CellRef::new(0, 0));
        assert_eq!(range.end, CellRef::new(9, 2));
        assert_eq!(range.width(), 3);
        assert_eq!(range.height(), 10);
        assert_eq!(range.to_string(), "A1:C10");
    }

    #[test]
    fn test_parse_single_cell_range() {
        let range = CellRange::parse("A1").unwrap();
        assert_eq!(range.start, range.end);
        assert_eq!(range.to_string(), "A1");
    }

    #[test]
    fn test_range_normalizes_corners() {
        let range = CellRange::parse("C3:A1").unwrap();
        assert_eq!(range.to_string(), "A1:C3");
        assert!(range.contains(CellRef::new(1, 1)));
        assert!(!range.contains(CellRef::new(3, 0)));
    }

    #[test]
    fn test_parse_range_invalid() {
        assert!(CellRange::parse("A1:B2:C3").is_err());
        assert!(CellRange::parse("").is_err());
        assert!(CellRange::parse("A1:").is_err());
    }

    #[test]
    fn test_range_cells() {
        let range = CellRange::parse("A1:B2").unwrap();
        let cells: Vec<String> = range.cells().map(|c| c.to_string()).collect();
        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);
    }
}
