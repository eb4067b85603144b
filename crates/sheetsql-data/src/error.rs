//! Error types for workbook storage.

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or storing a workbook
#[derive(Debug, Error)]
pub enum DataError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Failed to open workbook
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    /// Sheet not found in workbook
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid range or cell reference
    #[error("Invalid range: {0}")]
    InvalidRange(#[from] sheetsql_model::ReferenceError),

    /// Format cannot perform the requested operation
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Error reading or writing the ZIP package
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Calamine error
    #[error("Excel error: {0}")]
    Calamine(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<calamine::Error> for DataError {
    fn from(err: calamine::Error) -> Self {
        DataError::Calamine(err.to_string())
    }
}

impl From<tempfile::PersistError> for DataError {
    fn from(err: tempfile::PersistError) -> Self {
        DataError::Io(err.error)
    }
}
