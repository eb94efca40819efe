//! Amount type for handling monetary values exchanged with the finance API.
//!
//! The API sends amounts as JSON numbers, and occasionally as numeric strings. This module provides
//! the `Amount` type which wraps `Decimal` so that arithmetic on amounts is exact, while still
//! reading and writing the plain numbers the API expects.

use crate::format::format_currency;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Represents an amount of money in the account's currency.
///
/// `Display` renders it the way the app shows money everywhere, e.g. `R$ 1.234,56`.
///
/// # Examples
///
/// ```
/// # use fintrack::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1234.5").unwrap();
/// assert_eq!(amount.to_string(), "R$ 1.234,50");
/// ```
///
/// Parsing accepts a comma as the decimal separator, which is how amounts are typed in the form:
/// ```
/// # use fintrack::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("12,90").unwrap();
/// let b = Amount::from_str("12.90").unwrap();
/// assert_eq!(a, b);
/// ```
///
/// Thousands separators are accepted in both styles, so what `Display` prints parses back:
/// ```
/// # use fintrack::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("1.234,56").unwrap();
/// let b = Amount::from_str("1,234.56").unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Creates a new Amount from a Decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug)]
pub enum AmountError {
    /// The separators do not form a number in either the `1.234,56` or the `1,234.56` style.
    Ambiguous(String),
    Decimal(rust_decimal::Error),
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Ambiguous(s) => write!(f, "Ambiguous amount '{s}'"),
            AmountError::Decimal(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AmountError::Ambiguous(_) => None,
            AmountError::Decimal(e) => Some(e),
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let normalized = normalize(trimmed)?;
        let value = Decimal::from_str(&normalized).map_err(AmountError::Decimal)?;
        Ok(Amount(value))
    }
}

/// Rewrites `s` with a `.` decimal point and no grouping. The last separator is the decimal one,
/// unless a single kind of separator occurs more than once, in which case it only groups
/// thousands. A lone `,` or `.` is always a decimal point.
fn normalize(s: &str) -> Result<String, AmountError> {
    let (grouping, decimal) = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => (Some('.'), Some(comma)),
        (Some(dot), Some(_)) => (Some(','), Some(dot)),
        (Some(_), None) if s.matches('.').count() > 1 => (Some('.'), None),
        (Some(dot), None) => (None, Some(dot)),
        (None, Some(_)) if s.matches(',').count() > 1 => (Some(','), None),
        (None, Some(comma)) => (None, Some(comma)),
        (None, None) => (None, None),
    };
    let (integer, fraction) = match decimal {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let integer = match grouping {
        Some(sep) => ungroup(s, integer, sep)?,
        None => integer.to_string(),
    };
    Ok(match fraction {
        Some(fraction) => format!("{integer}.{fraction}"),
        None => integer,
    })
}

/// Removes `sep` from `integer`, which must be split into groups of three digits after the first.
fn ungroup(original: &str, integer: &str, sep: char) -> Result<String, AmountError> {
    let digits = integer.trim_start_matches(['-', '+']);
    let sign = &integer[..integer.len() - digits.len()];
    let mut groups = digits.split(sep);
    let leading_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()));
    if !leading_ok || !groups.all(|g| g.len() == 3) {
        return Err(AmountError::Ambiguous(original.to_string()));
    }
    Ok(format!("{sign}{}", digits.replace(sep, "")))
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&format_currency(self.0))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // The API expects a JSON number.
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Amount, E> {
        // The shortest round-trip representation of the float is what the server meant.
        Decimal::from_str(&v.to_string())
            .or_else(|_| Decimal::from_scientific(&format!("{v:e}")))
            .map(Amount)
            .map_err(E::custom)
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}
