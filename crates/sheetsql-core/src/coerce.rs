//! Cell-to-value coercion
//!
//! Every conversion starts from a resolved cell (formulas already replaced
//! by their result). Blank cells become `None` for every target, error cells
//! always fail, and each remaining variant converts only to the targets
//! listed in its [`FromCell`] implementation.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use sheetsql_model::{serial_to_datetime, Cell, DateSystem};

use crate::decimal::Decimal;
use crate::error::{Result, SqlError};
use crate::value::{format_timestamp, TargetType, Value};

/// Short description of a cell for conversion errors
pub(crate) fn describe(cell: &Cell) -> String {
    match cell {
        Cell::Boolean(b) => format!("boolean {}", b),
        Cell::Numeric {
            value,
            date_formatted: true,
        } => format!("date serial {}", value),
        Cell::Numeric { value, .. } => format!("number {}", value),
        Cell::Text(s) => format!("text '{}'", s),
        Cell::Blank => "blank".to_string(),
        Cell::Error(code) => format!("error {}", code),
        Cell::Formula(f) => format!("formula ={}", f.expression),
    }
}

/// Converts resolved cells into typed values
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCoercer {
    date_system: DateSystem,
}

impl TypeCoercer {
    /// Create a coercer for a workbook's date system
    pub fn new(date_system: DateSystem) -> Self {
        Self { date_system }
    }

    /// The date system used for date-formatted numbers
    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    /// Strict conversion; `Ok(None)` means the cell was blank
    pub fn coerce<T: FromCell>(&self, cell: &Cell) -> Result<Option<T>> {
        match self.check(cell)? {
            None => Ok(None),
            Some(cell) => T::from_cell(cell, self).map(Some),
        }
    }

    /// Widened conversion used by the generic object accessor
    pub fn coerce_object<T: FromCell>(&self, cell: &Cell) -> Result<Option<T>> {
        match self.check(cell)? {
            None => Ok(None),
            Some(cell) => T::from_object(cell, self).map(Some),
        }
    }

    /// The generic object for a cell (`Value::Null` for blanks)
    pub fn to_value(&self, cell: &Cell) -> Result<Value> {
        Ok(self.coerce_object::<Value>(cell)?.unwrap_or(Value::Null))
    }

    fn check<'c>(&self, cell: &'c Cell) -> Result<Option<&'c Cell>> {
        match cell {
            Cell::Blank => Ok(None),
            Cell::Error(code) => Err(SqlError::DataRetrieval(format!(
                "cell holds error value {}",
                code
            ))),
            Cell::Formula(f) => Err(SqlError::DataRetrieval(format!(
                "formula ={} has not been resolved",
                f.expression
            ))),
            other => Ok(Some(other)),
        }
    }

    /// Calendar date-time of a date-formatted numeric cell
    fn datetime(&self, cell: &Cell, target: TargetType) -> Result<NaiveDateTime> {
        match cell {
            Cell::Numeric {
                value,
                date_formatted: true,
            } => serial_to_datetime(*value, self.date_system)
                .ok_or_else(|| SqlError::incompatible(describe(cell), target.name())),
            other => Err(SqlError::incompatible(describe(other), target.name())),
        }
    }

    fn decimal(&self, cell: &Cell, target: TargetType) -> Result<Decimal> {
        match cell {
            Cell::Numeric { value, .. } => Decimal::from_f64(*value)
                .ok_or_else(|| SqlError::incompatible(describe(cell), target.name())),
            other => Err(SqlError::incompatible(describe(other), target.name())),
        }
    }
}

/// Types a resolved, non-blank, non-error cell can be converted to
pub trait FromCell: Sized {
    /// The target this type represents
    const TARGET: TargetType;

    /// Strict conversion used by the typed getters
    fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self>;

    /// Host-object conversion; widens where the object view allows more
    fn from_object(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        Self::from_cell(cell, coercer)
    }
}

impl FromCell for bool {
    const TARGET: TargetType = TargetType::Boolean;

    fn from_cell(cell: &Cell, _: &TypeCoercer) -> Result<Self> {
        match cell {
            Cell::Boolean(b) => Ok(*b),
            Cell::Text(s) if s == "1" => Ok(true),
            Cell::Text(s) if s == "0" => Ok(false),
            other => Err(SqlError::incompatible(describe(other), Self::TARGET.name())),
        }
    }

    fn from_object(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        match cell {
            Cell::Numeric { value, .. } => Ok(*value > 0.0),
            other => Self::from_cell(other, coercer),
        }
    }
}

macro_rules! integral_from_cell {
    ($($ty:ty => $target:ident),* $(,)?) => {$(
        impl FromCell for $ty {
            const TARGET: TargetType = TargetType::$target;

            fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
                coercer
                    .decimal(cell, Self::TARGET)?
                    .trunc()
                    .and_then(|truncated| <$ty>::try_from(truncated).ok())
                    .ok_or_else(|| SqlError::incompatible(describe(cell), Self::TARGET.name()))
            }
        }
    )*};
}

integral_from_cell!(i8 => Byte, i16 => Short, i32 => Int, i64 => Long);

impl FromCell for f64 {
    const TARGET: TargetType = TargetType::Double;

    fn from_cell(cell: &Cell, _: &TypeCoercer) -> Result<Self> {
        match cell {
            Cell::Numeric { value, .. } => Ok(*value),
            other => Err(SqlError::incompatible(describe(other), Self::TARGET.name())),
        }
    }
}

impl FromCell for f32 {
    const TARGET: TargetType = TargetType::Float;

    fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        let value = f64::from_cell(cell, coercer)
            .map_err(|_| SqlError::incompatible(describe(cell), Self::TARGET.name()))?;
        let narrowed = value as f32;
        if value.is_finite() && !narrowed.is_finite() {
            return Err(SqlError::incompatible(describe(cell), Self::TARGET.name()));
        }
        Ok(narrowed)
    }
}

impl FromCell for Decimal {
    const TARGET: TargetType = TargetType::Decimal;

    fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        coercer.decimal(cell, Self::TARGET)
    }
}

impl FromCell for String {
    const TARGET: TargetType = TargetType::String;

    fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        match cell {
            Cell::Boolean(b) => Ok(b.to_string()),
            Cell::Text(s) => Ok(s.clone()),
            Cell::Numeric {
                date_formatted: true,
                ..
            } => {
                let ts = coercer.datetime(cell, Self::TARGET)?;
                Ok(format_timestamp(&ts))
            }
            Cell::Numeric { .. } => Ok(coercer.decimal(cell, Self::TARGET)?.to_string()),
            other => Err(SqlError::incompatible(describe(other), Self::TARGET.name())),
        }
    }
}

impl FromCell for Vec<u8> {
    const TARGET: TargetType = TargetType::Bytes;

    fn from_cell(cell: &Cell, _: &TypeCoercer) -> Result<Self> {
        match cell {
            Cell::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(SqlError::incompatible(describe(other), Self::TARGET.name())),
        }
    }
}

impl FromCell for NaiveDateTime {
    const TARGET: TargetType = TargetType::Timestamp;

    fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        coercer.datetime(cell, Self::TARGET)
    }
}

impl FromCell for NaiveDate {
    const TARGET: TargetType = TargetType::Date;

    fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        Ok(coercer.datetime(cell, Self::TARGET)?.date())
    }
}

impl FromCell for NaiveTime {
    const TARGET: TargetType = TargetType::Time;

    fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        Ok(coercer.datetime(cell, Self::TARGET)?.time())
    }
}

impl FromCell for Value {
    const TARGET: TargetType = TargetType::Object;

    fn from_cell(cell: &Cell, coercer: &TypeCoercer) -> Result<Self> {
        match cell {
            Cell::Boolean(b) => Ok(Value::Boolean(*b)),
            Cell::Numeric {
                date_formatted: true,
                ..
            } => Ok(Value::Timestamp(coercer.datetime(cell, Self::TARGET)?)),
            Cell::Numeric { .. } => Ok(Value::Decimal(coercer.decimal(cell, Self::TARGET)?)),
            Cell::Text(s) => Ok(Value::Text(s.clone())),
            Cell::Blank => Ok(Value::Null),
            other => Err(SqlError::DataRetrieval(format!(
                "cannot read {} as an object",
                describe(other)
            ))),
        }
    }
}

/// Typed column access on the row under a cursor
///
/// Columns are 1-based. Accessors for primitive numbers and booleans return
/// zero/false for blank cells; the others return `None`. In both cases
/// [`Coercible::was_null`] reports `true` until the next read.
pub trait Coercible {
    /// 1-based index of a column label
    fn find_column(&self, label: &str) -> Result<usize>;

    /// Whether the last value read came from a blank cell
    fn was_null(&self) -> bool;

    /// Read a column with a strict conversion
    fn read<T: FromCell>(&mut self, column: usize) -> Result<Option<T>>;

    /// Read a column through the widened object conversion
    fn read_object<T: FromCell>(&mut self, column: usize) -> Result<Option<T>>;

    fn get_boolean(&mut self, column: usize) -> Result<bool> {
        Ok(self.read::<bool>(column)?.unwrap_or(false))
    }

    fn get_byte(&mut self, column: usize) -> Result<i8> {
        Ok(self.read::<i8>(column)?.unwrap_or(0))
    }

    fn get_short(&mut self, column: usize) -> Result<i16> {
        Ok(self.read::<i16>(column)?.unwrap_or(0))
    }

    fn get_int(&mut self, column: usize) -> Result<i32> {
        Ok(self.read::<i32>(column)?.unwrap_or(0))
    }

    fn get_long(&mut self, column: usize) -> Result<i64> {
        Ok(self.read::<i64>(column)?.unwrap_or(0))
    }

    fn get_float(&mut self, column: usize) -> Result<f32> {
        Ok(self.read::<f32>(column)?.unwrap_or(0.0))
    }

    fn get_double(&mut self, column: usize) -> Result<f64> {
        Ok(self.read::<f64>(column)?.unwrap_or(0.0))
    }

    fn get_decimal(&mut self, column: usize) -> Result<Option<Decimal>> {
        self.read::<Decimal>(column)
    }

    fn get_string(&mut self, column: usize) -> Result<Option<String>> {
        self.read::<String>(column)
    }

    fn get_bytes(&mut self, column: usize) -> Result<Option<Vec<u8>>> {
        self.read::<Vec<u8>>(column)
    }

    fn get_date(&mut self, column: usize) -> Result<Option<NaiveDate>> {
        self.read::<NaiveDate>(column)
    }

    fn get_time(&mut self, column: usize) -> Result<Option<NaiveTime>> {
        self.read::<NaiveTime>(column)
    }

    fn get_timestamp(&mut self, column: usize) -> Result<Option<NaiveDateTime>> {
        self.read::<NaiveDateTime>(column)
    }

    /// The cell as a generic [`Value`]
    fn get_object(&mut self, column: usize) -> Result<Value> {
        Ok(self.read::<Value>(column)?.unwrap_or(Value::Null))
    }

    /// The cell converted through the widened object path
    fn get_object_as<T: FromCell>(&mut self, column: usize) -> Result<Option<T>> {
        self.read_object::<T>(column)
    }

    fn get_boolean_by_label(&mut self, label: &str) -> Result<bool> {
        let column = self.find_column(label)?;
        self.get_boolean(column)
    }

    fn get_int_by_label(&mut self, label: &str) -> Result<i32> {
        let column = self.find_column(label)?;
        self.get_int(column)
    }

    fn get_long_by_label(&mut self, label: &str) -> Result<i64> {
        let column = self.find_column(label)?;
        self.get_long(column)
    }

    fn get_double_by_label(&mut self, label: &str) -> Result<f64> {
        let column = self.find_column(label)?;
        self.get_double(column)
    }

    fn get_decimal_by_label(&mut self, label: &str) -> Result<Option<Decimal>> {
        let column = self.find_column(label)?;
        self.get_decimal(column)
    }

    fn get_string_by_label(&mut self, label: &str) -> Result<Option<String>> {
        let column = self.find_column(label)?;
        self.get_string(column)
    }

    fn get_timestamp_by_label(&mut self, label: &str) -> Result<Option<NaiveDateTime>> {
        let column = self.find_column(label)?;
        self.get_timestamp(column)
    }

    fn get_object_by_label(&mut self, label: &str) -> Result<Value> {
        let column = self.find_column(label)?;
        self.get_object(column)
    }
}
