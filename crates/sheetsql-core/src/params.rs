//! Query parameters
//!
//! Values are stored by 1-based ordinal. Gaps are allowed and nothing is
//! cleared between executions unless asked for.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::decimal::Decimal;
use crate::error::{Result, SqlError};

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

macro_rules! parameter_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {$(
        impl From<$ty> for ParameterValue {
            fn from(value: $ty) -> Self {
                ParameterValue::$variant(value $(as $cast)?)
            }
        }
    )*};
}

parameter_from!(
    bool => Boolean,
    i8 => Integer as i64,
    i16 => Integer as i64,
    i32 => Integer as i64,
    i64 => Integer,
    f32 => Double as f64,
    f64 => Double,
    Decimal => Decimal,
    String => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
);

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_string())
    }
}

impl<T: Into<ParameterValue>> From<Option<T>> for ParameterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParameterValue::Null, Into::into)
    }
}

/// Parameter values keyed by ordinal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    values: BTreeMap<u32, ParameterValue>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous one at that ordinal
    pub fn set(&mut self, ordinal: u32, value: impl Into<ParameterValue>) -> Result<()> {
        if ordinal == 0 {
            return Err(SqlError::InvalidParameterIndex(ordinal));
        }
        self.values.insert(ordinal, value.into());
        Ok(())
    }

    pub fn get(&self, ordinal: u32) -> Option<&ParameterValue> {
        self.values.get(&ordinal)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &ParameterValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

/// Binding of placeholder values
pub trait ParameterBindable {
    /// The underlying bag
    fn parameters_mut(&mut self) -> &mut ParameterBag;

    fn set_parameter(&mut self, ordinal: u32, value: impl Into<ParameterValue>) -> Result<()> {
        self.parameters_mut().set(ordinal, value)
    }

    fn set_null(&mut self, ordinal: u32) -> Result<()> {
        self.parameters_mut().set(ordinal, ParameterValue::Null)
    }

    fn clear_parameters(&mut self) {
        self.parameters_mut().clear();
    }
}

impl ParameterBindable for ParameterBag {
    fn parameters_mut(&mut self) -> &mut ParameterBag {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_overwrite() {
        let mut bag = ParameterBag::new();
        bag.set_parameter(1, 42_i32).unwrap();
        bag.set_parameter(1, "replaced").unwrap();
        assert_eq!(bag.get(1), Some(&ParameterValue::Text("replaced".to_string())));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_gaps_are_allowed() {
        let mut bag = ParameterBag::new();
        bag.set_parameter(5, 2.5_f64).unwrap();
        bag.set_null(2).unwrap();
        let ordinals: Vec<u32> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(ordinals, vec![2, 5]);
        assert_eq!(bag.get(2), Some(&ParameterValue::Null));
        assert_eq!(bag.get(3), None);
    }

    #[test]
    fn test_ordinal_zero_is_rejected() {
        let mut bag = ParameterBag::new();
        assert!(matches!(
            bag.set_parameter(0, true),
            Err(SqlError::InvalidParameterIndex(0))
        ));
        assert!(bag.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut bag = ParameterBag::new();
        bag.set_parameter(1, Some(7_i64)).unwrap();
        bag.set_parameter(2, None::<String>).unwrap();
        assert_eq!(bag.get(1), Some(&ParameterValue::Integer(7)));
        assert_eq!(bag.get(2), Some(&ParameterValue::Null));
        bag.clear_parameters();
        assert!(bag.is_empty());
    }
}
