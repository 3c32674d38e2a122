//! Fixed-point money value object.
//!
//! Amounts are integer SGD cents to keep arithmetic exact; derived amounts
//! (GST, totals) round half-up on cents. JSON carries plain two-decimal
//! strings (`"1070.00"`), while `Display` renders the en-SG currency form
//! (`S$1,070.00`).

use core::fmt;
use core::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Amount of money in integer cents.
///
/// Negative values are permitted; they appear as signed adjustment deltas
/// (budget corrections), never as stored invoice or payment amounts.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Multiply by a unitless quantity (line item totals).
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Saturating addition of a signed delta (running counters).
    pub fn saturating_add(self, delta: Money) -> Money {
        Money(self.0.saturating_add(delta.0))
    }

    /// Percentage of this amount, rounded half-up on cents.
    ///
    /// Rounding is applied to the magnitude so that `percent` of a negative
    /// delta mirrors `percent` of the positive one; paired adjustments then
    /// cancel exactly.
    pub fn percent(self, percent: u32) -> Option<Money> {
        let scaled = i128::from(self.0).checked_mul(i128::from(percent))?;
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            -((-scaled + 50) / 100)
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// Plain two-decimal rendering without currency symbol or grouping
    /// (the JSON wire form).
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}S${}.{:02}", group_thousands(abs / 100), abs % 100)
    }
}

fn group_thousands(whole: u64) -> String {
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parse a decimal amount such as `1070`, `1070.5` or `-3.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || DomainError::validation(format!("malformed money amount '{s}'"));

        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, frac) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(bad());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(bad());
        }
        if frac.len() > 2 {
            return Err(DomainError::validation(format!(
                "money amount '{s}' has more than 2 decimal places"
            )));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| bad())?
        };
        // "3.5" means 50 cents, not 5.
        let frac_cents = match frac.len() {
            0 => 0,
            1 => i64::from(frac.as_bytes()[0] - b'0') * 10,
            _ => frac.parse().map_err(|_| bad())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(|| DomainError::validation(format!("money amount '{s}' out of range")))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MoneyVisitor;

        impl Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string or number of dollars")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                v.parse().map_err(|e: DomainError| E::custom(e))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                v.checked_mul(100)
                    .map(Money)
                    .ok_or_else(|| E::custom("money amount out of range"))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .map(Money)
                    .ok_or_else(|| E::custom("money amount out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
                let cents = (v * 100.0).round();
                if !cents.is_finite() || cents < i64::MIN as f64 || cents > i64::MAX as f64 {
                    return Err(E::custom("money amount out of range"));
                }
                Ok(Money(cents as i64))
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}
