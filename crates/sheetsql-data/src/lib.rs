//! # sheetsql-data
//!
//! Workbook storage for sheetsql - load a whole workbook into the grid model
//! and write it back.
//!
//! ## Features
//!
//! - **Excel Support**: Read `.xlsx`, `.xlsm`, `.xls` and `.ods` files using `calamine`
//! - **Declared Dimensions**: `<dimension>` of XLSX worksheets, read with `zip` + `quick-xml`
//! - **XLSX Writing**: Minimal SpreadsheetML packages with atomic file replacement
//! - **CSV Support**: Delimited text with number and boolean inference
//!
//! ## Example
//!
//! ```rust,ignore
//! use sheetsql_data::{FileStore, WorkbookStore};
//!
//! let store = FileStore::new("data.xlsx")?;
//! let mut workbook = store.load()?;
//! workbook.sheets[0].remove_row(0);
//!
//! let mut writer = store.open_writer()?;
//! writer.write(&workbook)?;
//! writer.close()?;
//! ```

pub mod error;
pub mod file_store;
pub mod sources;
pub mod store;
pub mod xlsx;

// Re-exports
pub use error::{DataError, Result};
pub use file_store::{FileFormat, FileStore};
pub use sources::{CsvOptions, ExcelSource};
pub use store::{MemoryStore, StoreLocation, WorkbookStore, WorkbookWriter};
