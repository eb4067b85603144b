//! XLSX package access beyond what calamine offers.
//!
//! Reading cell values goes through calamine; this module covers the
//! declared dimension, the date system flag and writing.

pub mod package;
pub mod parts;
pub mod writer;

pub use package::XlsxPackage;
pub use parts::{PackageFacts, WorkbookPart};
pub use writer::{build_package, write_workbook};
