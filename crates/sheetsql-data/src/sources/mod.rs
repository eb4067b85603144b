//! Readers for the supported file formats.
//!
//! Excel-family files (XLSX, XLSM, XLS, ODS) go through calamine; delimited
//! text goes through the csv crate.

pub mod csv;
pub mod excel;

pub use csv::CsvOptions;
pub use excel::ExcelSource;
