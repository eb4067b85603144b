//! # sheetsql-core
//!
//! Relational access to spreadsheet grids: each sheet of a workbook is a
//! table, each physical row a record and each column position a field.
//!
//! ## Features
//!
//! - **Sessions**: load a workbook from a [`WorkbookStore`] and commit it back
//! - **Cursors**: forward-only or scrollable navigation with JDBC positioning rules
//! - **Typed Reads**: cell values coerced to booleans, integers, decimals, dates and text
//! - **Metadata**: per-column descriptors, optionally typed from the current row
//! - **Formulas**: cached results or in-process evaluation of a common function subset
//! - **Deletion**: rows removed in memory, written out on commit
//!
//! ## Example
//!
//! ```rust
//! use sheetsql_core::{Coercible, Navigable, Session, SessionConfig};
//! use sheetsql_data::MemoryStore;
//! use sheetsql_model::{Row, Sheet, Workbook};
//!
//! let workbook = Workbook::new().with_sheet(
//!     Sheet::new("People")
//!         .with_row(Row::from_cells(["Ada", "1815"]))
//!         .with_row(Row::from_cells(["Grace", "1906"])),
//! );
//! let store = MemoryStore::new(workbook);
//! let mut session = Session::open(Box::new(store), SessionConfig::default())?;
//!
//! let mut rs = session.query("SELECT * FROM People")?;
//! let mut names = Vec::new();
//! while rs.next()? {
//!     names.extend(rs.get_string(1)?);
//! }
//! assert_eq!(names, ["Ada", "Grace"]);
//! # Ok::<(), sheetsql_core::SqlError>(())
//! ```

pub mod coerce;
pub mod config;
pub mod cursor;
pub mod decimal;
pub mod error;
pub mod formula;
pub mod metadata;
pub mod mutation;
pub mod params;
pub mod query;
pub mod result_set;
pub mod session;
pub mod statement;
pub mod value;

// Re-exports
pub use coerce::{Coercible, FromCell, TypeCoercer};
pub use config::{FormulaMode, ScrollMode, SessionConfig};
pub use cursor::{Cursor, Navigable};
pub use decimal::Decimal;
pub use error::{Result, SqlError, Warning};
pub use formula::{EvalError, ExpressionEvaluator, FormulaEvaluator};
pub use metadata::{ColumnDescriptor, ColumnStrategy, MetadataResolver};
pub use mutation::{DeletedRow, Mutable, MutationTracker};
pub use params::{ParameterBag, ParameterBindable, ParameterValue};
pub use result_set::ResultSet;
pub use session::Session;
pub use sheetsql_data::{FileStore, MemoryStore, StoreLocation, WorkbookStore};
pub use statement::PreparedQuery;
pub use value::{SqlType, TargetType, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
