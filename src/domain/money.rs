//! Fixed-point currency amounts.
//!
//! [`Money`] stores BRL amounts as a signed count of centavos. Floating
//! point never leaves the parsing boundary: JSON numbers are rounded to the
//! nearest centavo on the way in and every computation afterwards is exact
//! integer arithmetic.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest absolute amount accepted from clients (R$ 1 000 000 000.00).
const MAX_ABS_CENTS: i64 = 100_000_000_000;

/// Errors raised while parsing or combining amounts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// Input was not a decimal number.
    #[error("invalid amount: {0}")]
    Malformed(String),

    /// Input exceeded the accepted range.
    #[error("amount out of range: {0}")]
    OutOfRange(String),

    /// Checked arithmetic overflowed.
    #[error("amount arithmetic overflow")]
    Overflow,
}

/// A signed BRL amount with centavo precision.
///
/// Serialized as a decimal string with exactly two fraction digits
/// (`"10.00"`). Deserializes from either a JSON string or a JSON number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from a raw centavo count.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw centavo count.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns the amount in reais as a float, for external APIs that
    /// expect JSON numbers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Converts a floating-point amount, rounding half away from zero.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Malformed`] for NaN or infinities and
    /// [`MoneyError::OutOfRange`] past the accepted magnitude.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_decimal(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::Malformed(value.to_string()));
        }
        let cents = (value * 100.0).round();
        if cents.abs() > MAX_ABS_CENTS as f64 {
            return Err(MoneyError::OutOfRange(value.to_string()));
        }
        Ok(Self(cents as i64))
    }

    /// Returns `true` if the amount is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is strictly less than zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns the additive inverse.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] for `i64::MIN` centavos.
    pub fn checked_neg(self) -> Result<Self, MoneyError> {
        self.0.checked_neg().map(Self).ok_or(MoneyError::Overflow)
    }

    /// Adds two amounts.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on overflow.
    pub fn checked_add(self, rhs: Self) -> Result<Self, MoneyError> {
        self.0.checked_add(rhs.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Subtracts `rhs` from `self`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on overflow.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, MoneyError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Multiplies by an integer factor.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on overflow.
    pub fn checked_mul(self, factor: i64) -> Result<Self, MoneyError> {
        self.0.checked_mul(factor).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Returns `self - rhs`, or zero when the result would be negative.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on overflow.
    pub fn floored_sub(self, rhs: Self) -> Result<Self, MoneyError> {
        Ok(self.checked_sub(rhs)?.max(Self::ZERO))
    }

    /// Computes a basis-point share of this amount, rounded half away from
    /// zero to the centavo. `percent_bps(300)` is `round(amount * 0.03, 2)`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] on overflow.
    pub fn percent_bps(self, bps: u32) -> Result<Self, MoneyError> {
        let scaled = i128::from(self.0) * i128::from(bps);
        let half = if scaled < 0 { -5_000 } else { 5_000 };
        let rounded = (scaled + half) / 10_000;
        i64::try_from(rounded)
            .map(Self)
            .map_err(|_| MoneyError::Overflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(MoneyError::Malformed(s.to_string()));
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| MoneyError::OutOfRange(s.to_string()))?
        };

        // Two digits are kept; a third decides rounding, the rest are ignored.
        let mut frac_digits = frac_part.bytes().map(|b| i64::from(b - b'0'));
        let tenths = frac_digits.next().unwrap_or(0);
        let hundredths = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().is_some_and(|d| d >= 5);

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .filter(|c| *c <= MAX_ABS_CENTS)
            .ok_or_else(|| MoneyError::OutOfRange(s.to_string()))?;

        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a number or string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_decimal(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .filter(|c| c.abs() <= MAX_ABS_CENTS)
            .map(Money)
            .ok_or_else(|| E::custom(MoneyError::OutOfRange(v.to_string())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(MoneyError::OutOfRange(v.to_string())))
            .and_then(|v| self.visit_i64(v))
    }
}
