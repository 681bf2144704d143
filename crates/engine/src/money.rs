use std::{fmt, ops::Neg, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Signed money amount represented as integer **minor units** (cents).
///
/// Use this type for **all** monetary values in the engine (balances, deltas,
/// ledger amounts) to avoid floating-point drift.
///
/// The value is signed so the same type carries balance deltas:
/// - positive = credit / increase
/// - negative = debit / decrease
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(123_456);
/// assert_eq!(amount.minor(), 123_456);
/// assert_eq!(amount.to_string(), "1234.56");
/// ```
///
/// Parsing from user input (accepts `,` as a thousands separator; rejects more
/// than 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("1,234.56".parse::<Money>().unwrap().minor(), 123_456);
/// assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Overflow-checked addition.
    pub fn checked_add(self, rhs: Money) -> ResultEngine<Money> {
        self.0
            .checked_add(rhs.0)
            .map(Money)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))
    }

    /// Overflow-checked subtraction.
    pub fn checked_sub(self, rhs: Money) -> ResultEngine<Money> {
        self.0
            .checked_sub(rhs.0)
            .map(Money)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))
    }

    /// Subtraction whose result must stay `>= 0`.
    ///
    /// Fails with [`EngineError::OutOfRange`] when `rhs` exceeds `self`.
    pub fn checked_sub_non_negative(self, rhs: Money) -> ResultEngine<Money> {
        let out = self.checked_sub(rhs)?;
        if out.is_negative() {
            return Err(EngineError::OutOfRange(format!(
                "{self} - {rhs} would be negative"
            )));
        }
        Ok(out)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

/// Validates the integer part of a decimal string and strips its `,` group
/// separators.
fn integer_digits(raw: &str) -> Option<String> {
    let mut groups = raw.split(',');
    let head = groups.next()?;
    if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let grouped = raw.contains(',');
    if grouped && head.len() > 3 {
        return None;
    }

    let mut digits = head.to_string();
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }

    // "0" is fine, "007" / "0,123" are not.
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    Some(digits)
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a human decimal string into minor units.
    ///
    /// Accepts an optional leading `+`/`-`, `,` thousands separators in groups
    /// of three and `.` as decimal separator with at most 2 fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s}"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };
        if rest.is_empty() {
            return Err(empty());
        }

        let (int_part, frac_part) = match rest.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (rest, None),
        };

        let digits = integer_digits(int_part).ok_or_else(invalid)?;
        let units: i64 = digits.parse().map_err(|_| overflow())?;

        let cents: i64 = match frac_part {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
                }
            }
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -total } else { total }))
    }
}
