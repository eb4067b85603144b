//! sheetsql CLI - Command-line interface library
//!
//! This library provides the CLI functionality for sheetsql:
//! - Sheets: list the tables of a workbook
//! - Query: print every row a query selects
//! - Delete: remove one row and commit the workbook
//!
//! # Library Usage
//!
//! ```ignore
//! use sheetsql_cli::{render_query, OutputFormat, QueryOptions};
//!
//! let table = render_query(&path, "SELECT * FROM Sheet1", &QueryOptions::default())?;
//! println!("{}", table);
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # List sheets
//! sheetsql sheets book.xlsx
//!
//! # Dump a sheet as JSON
//! sheetsql query book.xlsx "SELECT * FROM Sheet1" --format json
//!
//! # Delete the third row and write the workbook back
//! sheetsql delete book.xlsx "SELECT * FROM Sheet1" --row 3
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{delete_command, load_config, query_command, render_query, sheets_command};
pub use app::{run_cli, OutputFormat, QueryOptions};
