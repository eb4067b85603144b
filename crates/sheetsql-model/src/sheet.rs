//! Sheets and rows
//!
//! A sheet is an ordered sequence of optional rows; a missing row is
//! entirely blank. Each row is a sparse column-index-to-cell mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::reference::{CellRange, CellRef};

/// One physical row of a sheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    /// Cells keyed by zero-based column index; gaps are implicit blanks
    pub cells: BTreeMap<u32, Cell>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from consecutive cells starting at column 0
    pub fn from_cells<I, C>(cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Cell>,
    {
        let cells = cells
            .into_iter()
            .enumerate()
            .map(|(col, cell)| (col as u32, cell.into()))
            .filter(|(_, cell)| !cell.is_blank())
            .collect();
        Self { cells }
    }

    /// Get the cell at a column, if one is stored
    pub fn get(&self, col: u32) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Get a mutable reference to a stored cell
    pub fn get_mut(&mut self, col: u32) -> Option<&mut Cell> {
        self.cells.get_mut(&col)
    }

    /// Store a cell, replacing any previous value
    pub fn set(&mut self, col: u32, cell: impl Into<Cell>) {
        self.cells.insert(col, cell.into());
    }

    /// Index of the last non-blank cell plus one (0 for an empty row)
    pub fn last_cell_num(&self) -> u32 {
        self.cells
            .iter()
            .rev()
            .find(|(_, cell)| !cell.is_blank())
            .map(|(col, _)| col + 1)
            .unwrap_or(0)
    }

    /// Check whether the row holds no non-blank cell
    pub fn is_empty(&self) -> bool {
        self.last_cell_num() == 0
    }
}

/// A named sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name as shown on its tab
    pub name: String,
    /// Rows by zero-based index; `None` marks a missing row
    rows: Vec<Option<Row>>,
    /// Used range declared by the source document, if its format has one
    dimension: Option<CellRange>,
}

impl Sheet {
    /// Create an empty sheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            dimension: None,
        }
    }

    /// Builder-style variant of [`Sheet::set_dimension`]
    pub fn with_dimension(mut self, dimension: CellRange) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Builder-style row append
    pub fn with_row(mut self, row: Row) -> Self {
        self.push_row(row);
        self
    }

    /// The declared used range
    pub fn dimension(&self) -> Option<CellRange> {
        self.dimension
    }

    /// Declare (or clear) the used range
    pub fn set_dimension(&mut self, dimension: Option<CellRange>) {
        self.dimension = dimension;
    }

    /// Append a row after the last stored row
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(Some(row));
    }

    /// Store a row at an index, padding with missing rows as needed
    pub fn set_row(&mut self, index: u32, row: Row) {
        let index = index as usize;
        if index >= self.rows.len() {
            self.rows.resize(index + 1, None);
        }
        self.rows[index] = Some(row);
    }

    /// Get a row by zero-based index
    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(index as usize).and_then(Option::as_ref)
    }

    /// Get a mutable row by zero-based index
    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.rows.get_mut(index as usize).and_then(Option::as_mut)
    }

    /// Get a cell; missing rows and gaps yield `None`
    pub fn cell(&self, at: CellRef) -> Option<&Cell> {
        self.row(at.row).and_then(|row| row.get(at.col))
    }

    /// Get a mutable cell reference
    pub fn cell_mut(&mut self, at: CellRef) -> Option<&mut Cell> {
        self.row_mut(at.row).and_then(|row| row.get_mut(at.col))
    }

    /// Store a cell, creating the row if needed
    pub fn set_cell(&mut self, at: CellRef, cell: impl Into<Cell>) {
        let index = at.row as usize;
        if index >= self.rows.len() {
            self.rows.resize(index + 1, None);
        }
        self.rows[index]
            .get_or_insert_with(Row::new)
            .set(at.col, cell);
    }

    /// Iterate over present rows with their indices
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| row.as_ref().map(|row| (index as u32, row)))
    }

    /// Index of the last stored row
    ///
    /// Like the underlying file formats, this reports 0 both for a sheet
    /// without rows and for a sheet whose only row is row 0. Use
    /// [`Sheet::physical_row_count`] or [`Sheet::row_count`] to tell apart.
    pub fn last_row_index(&self) -> u32 {
        self.rows.len().saturating_sub(1) as u32
    }

    /// Number of rows actually present
    pub fn physical_row_count(&self) -> u32 {
        self.rows.iter().filter(|row| row.is_some()).count() as u32
    }

    /// Number of addressable rows (last row index + 1, or 0 for an empty sheet)
    pub fn row_count(&self) -> u32 {
        let count = self.last_row_index() + 1;
        if count == 1 && self.physical_row_count() == 0 {
            0
        } else {
            count
        }
    }

    /// Remove a row, shifting every following row up by one
    ///
    /// Returns the removed row (`None` if it was missing or out of range).
    pub fn remove_row(&mut self, index: u32) -> Option<Row> {
        let position = index as usize;
        if position >= self.rows.len() {
            return None;
        }

        let removed = self.rows.remove(position);
        while matches!(self.rows.last(), Some(None)) {
            self.rows.pop();
        }

        if let Some(dimension) = self.dimension.as_mut() {
            if index < dimension.start.row {
                dimension.start.row -= 1;
                dimension.end.row -= 1;
            } else if dimension.end.row >= index && dimension.end.row > dimension.start.row {
                dimension.end.row -= 1;
            }
        }

        removed
    }

    /// Compute the used range from the stored cells
    pub fn used_range(&self) -> Option<CellRange> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (row_index, row) in self.rows() {
            let (Some(first), Some(last)) = (row.cells.keys().next(), row.cells.keys().next_back())
            else {
                continue;
            };
            bounds = Some(match bounds {
                None => (row_index, *first, row_index, *last),
                Some((r0, c0, r1, c1)) => (
                    r0.min(row_index),
                    c0.min(*first),
                    r1.max(row_index),
                    c1.max(*last),
                ),
            });
        }
        bounds.map(|(r0, c0, r1, c1)| CellRange::new(CellRef::new(r0, c0), CellRef::new(r1, c1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(values: &[&str]) -> Row {
        Row::from_cells(values.iter().copied())
    }

    #[test]
    fn test_empty_sheet_reports_zero_rows() {
        let sheet = Sheet::new("Empty");
        assert_eq!(sheet.last_row_index(), 0);
        assert_eq!(sheet.physical_row_count(), 0);
        assert_eq!(sheet.row_count(), 0);
    }

    #[test]
    fn test_single_row_is_not_confused_with_empty() {
        let sheet = Sheet::new("One").with_row(text_row(&["a", "b"]));
        assert_eq!(sheet.last_row_index(), 0);
        assert_eq!(sheet.physical_row_count(), 1);
        assert_eq!(sheet.row_count(), 1);
    }

    #[test]
    fn test_missing_rows_count_towards_row_count() {
        let mut sheet = Sheet::new("Sparse");
        sheet.set_cell(CellRef::new(4, 0), "x");
        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.physical_row_count(), 1);
        assert!(sheet.row(2).is_none());
        assert!(sheet.cell(CellRef::new(2, 0)).is_none());
    }

    #[test]
    fn test_last_cell_num_ignores_trailing_blanks() {
        let mut row = text_row(&["a", "", "c"]);
        assert_eq!(row.last_cell_num(), 3);
        row.set(7, Cell::Blank);
        assert_eq!(row.last_cell_num(), 3);
        assert_eq!(Row::new().last_cell_num(), 0);
    }

    #[test]
    fn test_remove_row_shifts_following_rows() {
        let mut sheet = Sheet::new("S")
            .with_row(text_row(&["r1"]))
            .with_row(text_row(&["r2"]))
            .with_row(text_row(&["r3"]));

        let removed = sheet.remove_row(1).unwrap();
        assert_eq!(removed.get(0), Some(&Cell::text("r2")));
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.cell(CellRef::new(1, 0)), Some(&Cell::text("r3")));
    }

    #[test]
    fn test_remove_row_trims_trailing_missing_rows() {
        let mut sheet = Sheet::new("S");
        sheet.set_cell(CellRef::new(0, 0), "a");
        sheet.set_cell(CellRef::new(2, 0), "c");
        sheet.remove_row(2);
        assert_eq!(sheet.row_count(), 1);
    }

    #[test]
    fn test_remove_row_shrinks_dimension() {
        let mut sheet = Sheet::new("S")
            .with_row(text_row(&["a", "b"]))
            .with_row(text_row(&["c", "d"]))
            .with_dimension(CellRange::parse("A1:B2").unwrap());
        sheet.remove_row(0);
        assert_eq!(sheet.dimension().unwrap().to_string(), "A1:B1");
    }

    #[test]
    fn test_remove_row_above_dimension_moves_it_up() {
        let mut sheet = Sheet::new("S")
            .with_row(text_row(&["title"]))
            .with_dimension(CellRange::parse("B3:D5").unwrap());
        sheet.set_row(2, text_row(&["", "x"]));
        sheet.remove_row(0);
        assert_eq!(sheet.dimension().unwrap().to_string(), "B2:D4");

        assert!(sheet.remove_row(1).is_some());
        assert_eq!(sheet.dimension().unwrap().to_string(), "B2:D3");
    }

    #[test]
    fn test_used_range() {
        let mut sheet = Sheet::new("S");
        assert!(sheet.used_range().is_none());
        sheet.set_cell(CellRef::new(1, 1), 1.0);
        sheet.set_cell(CellRef::new(3, 4), "x");
        assert_eq!(sheet.used_range().unwrap().to_string(), "B2:E4");
    }
}
