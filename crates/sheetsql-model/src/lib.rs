//! # sheetsql-model
//!
//! The passive grid that sheetsql exposes through its relational layer:
//! workbooks made of named sheets, sheets made of sparse rows, and rows made
//! of dynamically typed cells.
//!
//! ## Features
//!
//! - **Cells**: a closed [`Cell`] enum (boolean, number, text, blank, error, formula)
//! - **References**: A1 notation for cells and ranges ([`CellRef`], [`CellRange`])
//! - **Dates**: 1900/1904 date serial conversion ([`DateSystem`])
//!
//! ## Example
//!
//! ```rust
//! use sheetsql_model::{CellRef, Row, Sheet, Workbook};
//!
//! let sheet = Sheet::new("Sheet1").with_row(Row::from_cells(["a", "b"]));
//! let workbook = Workbook::new().with_sheet(sheet);
//!
//! let cell = workbook.sheet("sheet1").and_then(|s| s.cell(CellRef::parse("B1").ok()?));
//! assert_eq!(cell.map(|c| c.kind()), Some(sheetsql_model::CellKind::Text));
//! ```

pub mod cell;
pub mod dates;
pub mod error;
pub mod reference;
pub mod sheet;
pub mod workbook;

// Re-exports
pub use cell::{Cell, CellKind, ErrorCode, Formula};
pub use dates::{datetime_to_serial, serial_to_datetime, DateSystem};
pub use error::ReferenceError;
pub use reference::{column_index, column_name, CellRange, CellRef, MAX_COLUMN_INDEX};
pub use sheet::{Row, Sheet};
pub use workbook::Workbook;
