//! Error types for the relational layer.

use std::fmt;

use sheetsql_data::DataError;
use thiserror::Error;

/// Result type for sheetsql operations
pub type Result<T> = std::result::Result<T, SqlError>;

/// Errors surfaced by sessions, statements and result sets
#[derive(Debug, Error)]
pub enum SqlError {
    /// A cell was read while the cursor was not on a row
    #[error("Invalid cursor position: {0}")]
    InvalidCursorPosition(String),

    /// A positioning request that can never be satisfied, such as `absolute(0)`
    #[error("Illegal cursor position: {0}")]
    IllegalPosition(i64),

    /// Backward move on a forward-only cursor
    #[error("Result set is forward only: cannot move from row {current} to row {target}")]
    ForwardOnlyViolation {
        /// Row the cursor was on
        current: i64,
        /// Row that was requested
        target: i64,
    },

    /// The column count of a sheet cannot be determined
    #[error("Cannot determine the columns of sheet '{0}'")]
    AmbiguousSchema(String),

    /// The cell's value has no conversion to the requested type
    #[error("Cannot convert {from} to {to}")]
    IncompatibleType {
        /// Description of the source value
        from: String,
        /// Name of the requested type
        to: &'static str,
    },

    /// Error cell or a formula that could not be resolved
    #[error("Data retrieval error: {0}")]
    DataRetrieval(String),

    /// Capability not implemented
    #[error("Feature not supported: {0}")]
    FeatureNotSupported(String),

    /// Query text without a usable `FROM` clause
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// The workbook could not be written
    #[error("Commit failed: {0}")]
    CommitFailure(#[source] DataError),

    /// Operation on a closed session
    #[error("Session is closed")]
    SessionClosed,

    /// Operation on a closed result set
    #[error("Result set is closed")]
    CursorClosed,

    /// Column index outside `1..=column_count`
    #[error("Invalid column index {index}, result set has {count} columns")]
    InvalidColumnIndex {
        /// Requested 1-based index
        index: usize,
        /// Number of columns
        count: usize,
    },

    /// Column label that names no column
    #[error("Invalid column label '{0}'")]
    InvalidColumnLabel(String),

    /// Parameter ordinals start at 1
    #[error("Invalid parameter index {0}")]
    InvalidParameterIndex(u32),

    /// The query names a sheet the workbook does not have
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// The workbook could not be loaded
    #[error("Failed to open workbook: {0}")]
    OpenFailure(#[source] DataError),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SqlError {
    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        SqlError::FeatureNotSupported(what.into())
    }

    pub(crate) fn incompatible(from: impl fmt::Display, to: &'static str) -> Self {
        SqlError::IncompatibleType {
            from: from.to_string(),
            to,
        }
    }
}

/// A non-fatal condition recorded on a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// What happened
    pub message: String,
    /// Text of the underlying error, if any
    pub cause: Option<String>,
}

impl Warning {
    /// Create a warning with an underlying cause
    pub fn with_cause(message: impl Into<String>, cause: &dyn std::error::Error) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}
