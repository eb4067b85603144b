//! Cell values
//!
//! A cell holds exactly one dynamically typed value. Formula cells carry
//! their expression text and, when the source document stored one, the
//! cached result of the last calculation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

/// A single grid cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Cell {
    /// TRUE / FALSE
    Boolean(bool),
    /// A number; `date_formatted` is set when the cell style marks it as a date
    Numeric {
        /// The stored binary value
        value: f64,
        /// Whether the number format of the cell is a date/time format
        date_formatted: bool,
    },
    /// A string
    Text(String),
    /// An empty but present cell
    #[default]
    Blank,
    /// A spreadsheet error value such as `#DIV/0!`
    Error(ErrorCode),
    /// A formula with its optional cached result
    Formula(Formula),
}

impl Cell {
    /// Plain (not date formatted) number
    pub fn number(value: f64) -> Self {
        Cell::Numeric {
            value,
            date_formatted: false,
        }
    }

    /// Date formatted number (a date serial)
    pub fn date_serial(value: f64) -> Self {
        Cell::Numeric {
            value,
            date_formatted: true,
        }
    }

    /// Text cell
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Formula cell without a cached result
    pub fn formula(expression: impl Into<String>) -> Self {
        Cell::Formula(Formula::new(expression))
    }

    /// Formula cell with a cached result
    pub fn formula_with_result(expression: impl Into<String>, cached: Cell) -> Self {
        Cell::Formula(Formula::new(expression).with_cached(cached))
    }

    /// The variant tag of this cell
    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Boolean(_) => CellKind::Boolean,
            Cell::Numeric { .. } => CellKind::Numeric,
            Cell::Text(_) => CellKind::Text,
            Cell::Blank => CellKind::Blank,
            Cell::Error(_) => CellKind::Error,
            Cell::Formula(_) => CellKind::Formula,
        }
    }

    /// Check if the cell is blank
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Blank)
    }

    /// Check if the cell holds a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, Cell::Formula(_))
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Boolean(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<ErrorCode> for Cell {
    fn from(value: ErrorCode) -> Self {
        Cell::Error(value)
    }
}

/// Variant tag of a [`Cell`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Boolean,
    Numeric,
    Text,
    Blank,
    Error,
    Formula,
}

/// Formula expression plus the result cached by the producing application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    /// Expression text without the leading `=`
    pub expression: String,
    /// Last calculated value, never itself a formula
    pub cached: Option<Box<Cell>>,
}

impl Formula {
    /// Create a formula without a cached value
    pub fn new(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        let expression = match expression.strip_prefix('=') {
            Some(rest) => rest.to_string(),
            None => expression,
        };
        Self {
            expression,
            cached: None,
        }
    }

    /// Attach a cached result; nested formulas are flattened to their own cache
    pub fn with_cached(mut self, cached: Cell) -> Self {
        self.cached = match cached {
            Cell::Formula(inner) => inner.cached,
            other => Some(Box::new(other)),
        };
        self
    }

    /// The cached result, if any
    pub fn cached_value(&self) -> Option<&Cell> {
        self.cached.as_deref()
    }
}

/// Spreadsheet error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// `#NULL!`
    Null,
    /// `#DIV/0!`
    Div0,
    /// `#VALUE!`
    Value,
    /// `#REF!`
    Ref,
    /// `#NAME?`
    Name,
    /// `#NUM!`
    Num,
    /// `#N/A`
    NA,
    /// `#GETTING_DATA`
    GettingData,
}

impl ErrorCode {
    /// All error codes in their canonical order
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::Null,
        ErrorCode::Div0,
        ErrorCode::Value,
        ErrorCode::Ref,
        ErrorCode::Name,
        ErrorCode::Num,
        ErrorCode::NA,
        ErrorCode::GettingData,
    ];

    /// The literal as written in a sheet
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Null => "#NULL!",
            ErrorCode::Div0 => "#DIV/0!",
            ErrorCode::Value => "#VALUE!",
            ErrorCode::Ref => "#REF!",
            ErrorCode::Name => "#NAME?",
            ErrorCode::Num => "#NUM!",
            ErrorCode::NA => "#N/A",
            ErrorCode::GettingData => "#GETTING_DATA",
        }
    }

    /// The BIFF error byte
    pub fn code(self) -> u8 {
        match self {
            ErrorCode::Null => 0x00,
            ErrorCode::Div0 => 0x07,
            ErrorCode::Value => 0x0F,
            ErrorCode::Ref => 0x17,
            ErrorCode::Name => 0x1D,
            ErrorCode::Num => 0x24,
            ErrorCode::NA => 0x2A,
            ErrorCode::GettingData => 0x2B,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == upper)
            .ok_or_else(|| ReferenceError::UnknownErrorCode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_kind() {
        assert_eq!(Cell::from(true).kind(), CellKind::Boolean);
        assert_eq!(Cell::from(1.5).kind(), CellKind::Numeric);
        assert_eq!(Cell::from("x").kind(), CellKind::Text);
        assert_eq!(Cell::default().kind(), CellKind::Blank);
        assert_eq!(Cell::from(ErrorCode::NA).kind(), CellKind::Error);
        assert_eq!(Cell::formula("1+1").kind(), CellKind::Formula);
    }

    #[test]
    fn test_formula_strips_equals() {
        let formula = Formula::new("=SUM(A1:A3)");
        assert_eq!(formula.expression, "SUM(A1:A3)");
        assert!(formula.cached_value().is_none());
    }

    #[test]
    fn test_formula_cache_is_never_a_formula() {
        let inner = Cell::formula_with_result("1+1", Cell::number(2.0));
        let outer = Formula::new("A1").with_cached(inner);
        assert_eq!(outer.cached_value(), Some(&Cell::number(2.0)));
    }

    #[test]
    fn test_error_code_roundtrip() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>().unwrap(), code);
        }
        assert_eq!("#div/0!".parse::<ErrorCode>().unwrap(), ErrorCode::Div0);
        assert!("#BOGUS".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_error_code_bytes() {
        assert_eq!(ErrorCode::Div0.code(), 7);
        assert_eq!(ErrorCode::NA.code(), 42);
    }
}
