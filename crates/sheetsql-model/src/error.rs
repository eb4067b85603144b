//! Error types for the grid model.

use thiserror::Error;

/// Errors raised while parsing cell references and error literals
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// Column letters could not be parsed
    #[error("Invalid column name '{0}'")]
    InvalidColumn(String),

    /// Column letters exceed the addressable column range
    #[error("Column '{0}' is out of range")]
    ColumnOutOfRange(String),

    /// A cell reference such as `B3` could not be parsed
    #[error("Invalid cell reference '{0}'")]
    InvalidCell(String),

    /// A range such as `A1:C3` could not be parsed
    #[error("Invalid range '{0}'")]
    InvalidRange(String),

    /// Unknown spreadsheet error literal
    #[error("Unknown error code '{0}'")]
    UnknownErrorCode(String),
}
