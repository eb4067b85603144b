//! Workbooks

use serde::{Deserialize, Serialize};

use crate::dates::DateSystem;
use crate::sheet::Sheet;

/// An ordered collection of sheets
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workbook {
    /// Sheets in tab order
    pub sheets: Vec<Sheet>,
    /// Epoch used by date serials in this workbook
    pub date_system: DateSystem,
}

impl Workbook {
    /// Create an empty workbook using the 1900 date system
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style sheet append
    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Append a sheet
    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Sheet names in tab order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Position of a sheet, matching the name case-insensitively
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.sheets
            .iter()
            .position(|s| s.name.to_lowercase() == wanted)
    }

    /// Look up a sheet by name (case-insensitive)
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheet_index(name).map(|i| &self.sheets[i])
    }

    /// Look up a mutable sheet by name (case-insensitive)
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheet_index(name).map(move |i| &mut self.sheets[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_lookup_is_case_insensitive() {
        let workbook = Workbook::new()
            .with_sheet(Sheet::new("Sheet1"))
            .with_sheet(Sheet::new("Data"));
        assert_eq!(workbook.sheet_index("sheet1"), Some(0));
        assert_eq!(workbook.sheet("DATA").map(|s| s.name.as_str()), Some("Data"));
        assert!(workbook.sheet("missing").is_none());
    }

    #[test]
    fn test_sheet_names_keep_tab_order() {
        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::new("B"));
        workbook.add_sheet(Sheet::new("A"));
        assert_eq!(workbook.sheet_names(), vec!["B", "A"]);
        assert_eq!(workbook.date_system, DateSystem::V1900);
    }
}
