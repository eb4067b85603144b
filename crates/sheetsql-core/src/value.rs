//! Relational values and type descriptors

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;

/// A cell value as seen through the generic object accessor
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Blank cell
    Null,
    /// Boolean cell
    Boolean(bool),
    /// Plain numeric cell
    Decimal(Decimal),
    /// Text cell
    Text(String),
    /// Date-formatted numeric cell
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Check for SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The relational type of this value
    pub fn sql_type(&self) -> SqlType {
        match self {
            Value::Null => SqlType::Null,
            Value::Boolean(_) => SqlType::Boolean,
            Value::Decimal(_) => SqlType::Numeric,
            Value::Text(_) => SqlType::Varchar,
            Value::Timestamp(_) => SqlType::Timestamp,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", format_timestamp(ts)),
        }
    }
}

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS[.fff]`
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// Relational column types reported by result set metadata
///
/// Codes follow the numbering common to database connectivity APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    /// Boolean cells
    Boolean,
    /// Date-formatted numeric cells
    Timestamp,
    /// Plain numeric cells
    Numeric,
    /// Text cells
    Varchar,
    /// Blank cells
    Null,
    /// Error cells
    Datalink,
    /// Type not determined (static metadata)
    Other,
}

impl SqlType {
    /// Vendor type code
    pub fn code(self) -> i32 {
        match self {
            SqlType::Boolean => 16,
            SqlType::Timestamp => 93,
            SqlType::Numeric => 2,
            SqlType::Varchar => 12,
            SqlType::Null => 0,
            SqlType::Datalink => 70,
            SqlType::Other => 1111,
        }
    }

    /// Type name
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Numeric => "NUMERIC",
            SqlType::Varchar => "VARCHAR",
            SqlType::Null => "NULL",
            SqlType::Datalink => "DATALINK",
            SqlType::Other => "OTHER",
        }
    }

    /// Rust type returned by the generic object accessor for this column type
    pub fn host_type(self) -> &'static str {
        match self {
            SqlType::Boolean => "bool",
            SqlType::Timestamp => "NaiveDateTime",
            SqlType::Numeric => "Decimal",
            SqlType::Varchar => "String",
            SqlType::Null | SqlType::Datalink | SqlType::Other => "Value",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Types a cell can be requested as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Bytes,
    Date,
    Time,
    Timestamp,
    Object,
}

impl TargetType {
    /// Name used in conversion errors
    pub fn name(self) -> &'static str {
        match self {
            TargetType::Boolean => "boolean",
            TargetType::Byte => "byte",
            TargetType::Short => "short",
            TargetType::Int => "int",
            TargetType::Long => "long",
            TargetType::Float => "float",
            TargetType::Double => "double",
            TargetType::Decimal => "decimal",
            TargetType::String => "string",
            TargetType::Bytes => "bytes",
            TargetType::Date => "date",
            TargetType::Time => "time",
            TargetType::Timestamp => "timestamp",
            TargetType::Object => "object",
        }
    }

    /// Whether the target is a primitive number without a null representation
    pub fn is_primitive_numeric(self) -> bool {
        matches!(
            self,
            TargetType::Byte
                | TargetType::Short
                | TargetType::Int
                | TargetType::Long
                | TargetType::Float
                | TargetType::Double
        )
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
