//! Exact-decimal resource quantities
//!
//! A [`Quantity`] is an exact amount of a resource (CPU in cores, memory or
//! storage in bytes) kept as unscaled digits plus a base-10 exponent, so
//! fractional amounts like `100m` or `1.5Gi` never pass through floating
//! point. Conversions to whole units or milli-units round up and saturate at
//! `i64::MAX` instead of wrapping or panicking, since user-declared amounts
//! are not trusted to be reasonable.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Smallest supported exponent: milli-unit resolution.
const MIN_SCALE: i32 = -3;

/// Error returned when quantity text cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityParseError {
    #[error("empty quantity string")]
    Empty,
    #[error("negative quantities are not supported: {0}")]
    Negative(String),
    #[error("invalid digits in quantity: {0}")]
    InvalidDigits(String),
    #[error("unrecognized quantity suffix: {0}")]
    UnknownSuffix(String),
    #[error("quantity out of representable range: {0}")]
    OutOfRange(String),
}

/// Suffix family a quantity was expressed in, controlling canonical display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Decimal SI suffixes: m, k, M, G, T
    #[default]
    DecimalSi,
    /// Binary suffixes: Ki, Mi, Gi, Ti
    BinarySi,
}

/// An exact resource amount: `digits * 10^scale` in base units
#[derive(Debug, Clone, Copy)]
pub struct Quantity {
    digits: i64,
    scale: i32,
    format: Format,
}

const BINARY_SUFFIXES: [(&str, i128); 4] = [
    ("Ti", 1 << 40),
    ("Gi", 1 << 30),
    ("Mi", 1 << 20),
    ("Ki", 1 << 10),
];

const DECIMAL_SUFFIXES: [(&str, i32); 4] = [("T", 12), ("G", 9), ("M", 6), ("k", 3)];

fn pow10(exp: u32) -> i128 {
    10i128.pow(exp)
}

impl Quantity {
    /// The zero amount, distinct from an absent amount
    pub fn zero() -> Self {
        Quantity {
            digits: 0,
            scale: 0,
            format: Format::DecimalSi,
        }
    }

    /// Quantity of `value` whole units
    pub fn from_value(value: i64) -> Self {
        Quantity {
            digits: value,
            scale: 0,
            format: Format::DecimalSi,
        }
    }

    /// Quantity of `millis` milli-units
    pub fn from_milli(millis: i64) -> Self {
        Quantity {
            digits: millis,
            scale: MIN_SCALE,
            format: Format::DecimalSi,
        }
    }

    /// The same amount, rendered with the given suffix family
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn is_zero(&self) -> bool {
        self.digits == 0
    }

    /// Amount in whole units, rounded up, saturating at `i64::MAX`
    pub fn value(&self) -> i64 {
        self.scaled_to(0)
    }

    /// Amount in milli-units, rounded up, saturating at `i64::MAX`
    pub fn milli_value(&self) -> i64 {
        self.scaled_to(MIN_SCALE)
    }

    /// Amount expressed at `target` scale, rounded up, saturating.
    fn scaled_to(&self, target: i32) -> i64 {
        let shift = self.scale - target;
        let wide = if shift >= 0 {
            (self.digits as i128).saturating_mul(pow10(shift as u32))
        } else {
            let div = pow10((-shift) as u32);
            // Round up: a nonzero fraction of a unit still reserves the unit.
            let d = self.digits as i128;
            if d >= 0 {
                (d + div - 1) / div
            } else {
                d / div
            }
        };
        wide.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Numeric value in milli-units as i128, for exact comparison.
    fn exact_millis(&self) -> i128 {
        let shift = self.scale - MIN_SCALE;
        debug_assert!(shift >= 0, "scale below milli resolution");
        (self.digits as i128).saturating_mul(pow10(shift as u32))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.exact_millis() == other.exact_millis()
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.exact_millis().cmp(&other.exact_millis())
    }
}

impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(QuantityParseError::Empty);
        }
        if s.starts_with('-') {
            return Err(QuantityParseError::Negative(s.to_string()));
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(QuantityParseError::InvalidDigits(s.to_string()));
        }

        let mut digits: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let d = c
                .to_digit(10)
                .ok_or_else(|| QuantityParseError::InvalidDigits(s.to_string()))? as i128;
            digits = digits
                .checked_mul(10)
                .and_then(|v| v.checked_add(d))
                .ok_or_else(|| QuantityParseError::OutOfRange(s.to_string()))?;
        }
        let frac_len = frac_part.len() as i32;

        if suffix == "m" || suffix.is_empty() || DECIMAL_SUFFIXES.iter().any(|(t, _)| *t == suffix)
        {
            let suffix_scale = match suffix {
                "m" => MIN_SCALE,
                "" => 0,
                other => {
                    DECIMAL_SUFFIXES
                        .iter()
                        .find(|(t, _)| *t == other)
                        .map(|(_, e)| *e)
                        .unwrap_or(0) // unreachable, covered by the branch guard
                }
            };
            let mut scale = suffix_scale - frac_len;
            // Sub-milli precision rounds up to milli resolution.
            while scale < MIN_SCALE {
                digits = (digits + 9) / 10;
                scale += 1;
            }
            let digits =
                i64::try_from(digits).map_err(|_| QuantityParseError::OutOfRange(s.to_string()))?;
            return Ok(Quantity {
                digits,
                scale,
                format: Format::DecimalSi,
            });
        }

        if let Some((_, mult)) = BINARY_SUFFIXES.iter().find(|(t, _)| *t == suffix) {
            let scaled = digits.saturating_mul(*mult);
            let div = pow10(frac_len as u32);
            let bytes = scaled / div + i128::from(scaled % div != 0);
            // Past i64::MAX the amount is kept as the capped sentinel.
            let digits = i64::try_from(bytes).unwrap_or(i64::MAX);
            return Ok(Quantity {
                digits,
                scale: 0,
                format: Format::BinarySi,
            });
        }

        Err(QuantityParseError::UnknownSuffix(s.to_string()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }

        let millis = self.exact_millis();
        if millis % 1000 != 0 {
            // Fractional units only have a decimal milli rendering,
            // regardless of the original suffix family.
            return write!(f, "{}m", millis);
        }
        let units = millis / 1000;

        if self.format == Format::BinarySi {
            for (suffix, mult) in BINARY_SUFFIXES {
                if units % mult == 0 {
                    return write!(f, "{}{}", units / mult, suffix);
                }
            }
            return write!(f, "{}", units);
        }

        for (suffix, exp) in DECIMAL_SUFFIXES {
            let mult = pow10(exp as u32);
            if units % mult == 0 {
                return write!(f, "{}{}", units / mult, suffix);
            }
        }
        write!(f, "{}", units)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
