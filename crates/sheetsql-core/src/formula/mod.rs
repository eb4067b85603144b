//! Formula resolution
//!
//! Formula cells are turned into concrete cells before their type is
//! inferred or they are coerced. The [`FormulaEvaluator`] trait is the seam;
//! [`ExpressionEvaluator`] handles the common formula subset.

mod eval;
pub mod lexer;
pub mod parser;

use sheetsql_model::{Cell, CellRef, Formula, Workbook};
use thiserror::Error;

use crate::error::SqlError;

pub use eval::ExpressionEvaluator;

/// Failure to produce any value for a formula
///
/// Spreadsheet errors such as `#DIV/0!` are values, not failures; they come
/// back as [`Cell::Error`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Unknown function {0}")]
    UnknownFunction(String),

    #[error("Wrong number of arguments to {0}")]
    Arity(String),

    #[error("Circular reference through {0}")]
    Cycle(String),
}

impl From<EvalError> for SqlError {
    fn from(err: EvalError) -> Self {
        SqlError::DataRetrieval(err.to_string())
    }
}

/// Resolves formula cells to concrete values
pub trait FormulaEvaluator {
    /// Resolve the formula stored at `at` on `sheet`
    ///
    /// The returned cell is never [`Cell::Formula`].
    fn resolve(
        &self,
        workbook: &Workbook,
        sheet: &str,
        at: CellRef,
        formula: &Formula,
    ) -> Result<Cell, EvalError>;
}
