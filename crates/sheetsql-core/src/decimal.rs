//! Exact decimal numbers
//!
//! Numeric cells hold binary doubles. Reading them as decimals goes through
//! the shortest text that round-trips the double, so a cell showing `0.1`
//! yields exactly `0.1` rather than `0.1000000000000000055511151231257827`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A decimal number `mantissa * 10^-scale`
///
/// Values are kept normalized: the mantissa carries no trailing zeros, so
/// large magnitudes have a negative scale (`1e40` is `1 * 10^40`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: i128,
    scale: i32,
}

fn pow10(exp: u32) -> Option<i128> {
    10_i128.checked_pow(exp)
}

impl Decimal {
    /// Zero
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
    };

    /// Create a decimal from an unscaled value and a scale
    pub fn new(mantissa: i128, scale: i32) -> Self {
        let mut d = Self { mantissa, scale };
        d.normalize();
        d
    }

    fn normalize(&mut self) {
        if self.mantissa == 0 {
            self.scale = 0;
            return;
        }
        while self.mantissa % 10 == 0 {
            self.mantissa /= 10;
            self.scale -= 1;
        }
    }

    /// Convert a double using its shortest round-trip representation
    ///
    /// Returns `None` for NaN and infinities. Every finite double converts.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }

        // `{:e}` yields the shortest digits that round-trip, e.g. "1.2345e2".
        let text = format!("{:e}", value);
        let (digits_part, exp_part) = text.split_once('e')?;
        let exponent: i32 = exp_part.parse().ok()?;

        let negative = digits_part.starts_with('-');
        let unsigned = digits_part.trim_start_matches('-');
        let (int_digits, frac_digits) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        // at most 17 significant digits, well inside i128
        let digits: i128 = format!("{}{}", int_digits, frac_digits).parse().ok()?;
        let scale = i32::try_from(frac_digits.len()).ok()? - exponent;

        Some(Self::new(if negative { -digits } else { digits }, scale))
    }

    /// The unscaled value
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Power of ten the mantissa is divided by; negative for large integers
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Integer part, truncated toward zero
    ///
    /// `None` when the integer part does not fit an `i128`.
    pub fn trunc(&self) -> Option<i128> {
        match u32::try_from(self.scale) {
            // a mantissa below 10^39 has no integer digits past scale 38
            Ok(scale) => Some(pow10(scale).map_or(0, |divisor| self.mantissa / divisor)),
            Err(_) => {
                let factor = pow10(self.scale.unsigned_abs())?;
                self.mantissa.checked_mul(factor)
            }
        }
    }

    /// Nearest double
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            let zeros = "0".repeat(self.scale.unsigned_abs() as usize);
            return write!(f, "{}{}", self.mantissa, zeros);
        }
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale.unsigned_abs() as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int_part, frac_part)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

/// Error returned when text is not a plain decimal number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError(String);

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid decimal '{}'", self.0)
    }
}

impl std::error::Error for ParseDecimalError {}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();
        let negative = trimmed.starts_with('-');
        let unsigned = trimmed.trim_start_matches(['-', '+']);
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let joined = format!("{}{}", int_part, frac_part);
        let significant = joined.trim_end_matches('0');
        let dropped = i32::try_from(joined.len() - significant.len()).map_err(|_| err())?;
        let scale = i32::try_from(frac_part.len()).map_err(|_| err())? - dropped;
        let significant = significant.trim_start_matches('0');
        if significant.is_empty() {
            return Ok(Self::ZERO);
        }
        let mantissa: i128 = significant.parse().map_err(|_| err())?;
        Ok(Self::new(if negative { -mantissa } else { mantissa }, scale))
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        let widen = |d: &Decimal| {
            pow10((scale - d.scale).unsigned_abs())
                .and_then(|factor| d.mantissa.checked_mul(factor))
        };
        match (widen(self), widen(other)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::new(value as i128, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_uses_shortest_text() {
        assert_eq!(Decimal::from_f64(0.1).unwrap().to_string(), "0.1");
        assert_eq!(Decimal::from_f64(42.0).unwrap().to_string(), "42");
        assert_eq!(Decimal::from_f64(-123.45).unwrap().to_string(), "-123.45");
        assert_eq!(Decimal::from_f64(1e21).unwrap().to_string(), "1000000000000000000000");
        assert_eq!(Decimal::from_f64(0.000125).unwrap().to_string(), "0.000125");
        assert_eq!(Decimal::from_f64(0.0).unwrap(), Decimal::ZERO);
        assert_eq!(Decimal::from_f64(-0.5).unwrap().to_string(), "-0.5");
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert!(Decimal::from_f64(f64::NAN).is_none());
        assert!(Decimal::from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn test_from_f64_large_magnitudes() {
        let big = Decimal::from_f64(1e40).unwrap();
        assert_eq!((big.mantissa(), big.scale()), (1, -40));
        assert_eq!(big.to_string(), format!("1{}", "0".repeat(40)));

        let max = Decimal::from_f64(f64::MAX).unwrap();
        assert_eq!(max.mantissa(), 17976931348623157);
        assert_eq!(max.scale(), -292);
        assert_eq!(max.to_string().len(), 309);
        assert_eq!(max.to_f64(), f64::MAX);
        assert_eq!(Decimal::from_f64(-1e300).unwrap().to_string().len(), 302);
    }

    #[test]
    fn test_trunc() {
        assert_eq!(Decimal::from_f64(42.9).unwrap().trunc(), Some(42));
        assert_eq!(Decimal::from_f64(-42.9).unwrap().trunc(), Some(-42));
        assert_eq!(Decimal::from_f64(0.5).unwrap().trunc(), Some(0));
        assert_eq!(Decimal::from_f64(4200.0).unwrap().trunc(), Some(4200));
        assert_eq!(Decimal::from_f64(1e40).unwrap().trunc(), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("12.50".parse::<Decimal>().unwrap(), Decimal::new(125, 1));
        assert_eq!("-0.05".parse::<Decimal>().unwrap().to_string(), "-0.05");
        assert_eq!(".5".parse::<Decimal>().unwrap().to_string(), "0.5");
        assert!("1e3".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
        assert!("-".parse::<Decimal>().is_err());
        assert_eq!("4200".parse::<Decimal>().unwrap(), Decimal::new(42, -2));
        assert_eq!("000.000".parse::<Decimal>().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_ordering() {
        let a = Decimal::from_f64(1.5).unwrap();
        let b = Decimal::from_f64(1.25).unwrap();
        assert!(a > b);
        assert_eq!(Decimal::new(150, 2), a);
        assert!(Decimal::from_f64(1e40).unwrap() > Decimal::from_f64(9.5e39).unwrap());
        assert!(Decimal::from_f64(-1e300).unwrap() < Decimal::from_f64(0.5).unwrap());
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(Decimal::new(125, 1).to_f64(), 12.5);
    }
}
