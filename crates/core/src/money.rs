//! Monetary amounts in the smallest currency unit.
//!
//! Amounts arrive on the wire as decimal numbers (`1580.67`) and are held as
//! integer cents so that running totals stay exact under any sequence of
//! deltas.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Signed amount in cents.
///
/// Serialized as a decimal number with two places; deserialization rounds to
/// the nearest cent.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Round a decimal amount to the nearest cent (half away from zero).
    pub fn from_decimal(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::validation(format!("amount {value} is not finite")));
        }
        let cents = (value * 100.0).round();
        if cents.abs() >= i64::MAX as f64 {
            return Err(DomainError::validation(format!("amount {value} is out of range")));
        }
        Ok(Self(cents as i64))
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Multiply by a non-integral factor (e.g. a quantity), rounding to a cent.
    pub fn scale(self, factor: f64) -> Self {
        Self((self.0 as f64 * factor).round() as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl TryFrom<f64> for Money {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Money> for f64 {
    fn from(value: Money) -> Self {
        value.to_f64()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn money(value: f64) -> Money {
        Money::from_decimal(value).unwrap()
    }

    #[test]
    fn fractional_amounts_cancel_exactly() {
        let mut total = Money::ZERO;
        total += money(0.1);
        total += money(0.2);
        assert_eq!(total, money(0.3));

        total -= money(0.1);
        total -= money(0.2);
        assert!(total.is_zero());
    }

    #[test]
    fn rounds_to_nearest_cent() {
        assert_eq!(money(19.999).cents(), 2000);
        assert_eq!(money(-0.004).cents(), 0);
        assert_eq!(money(1580.67).cents(), 158_067);
    }

    #[test]
    fn rejects_non_finite_amounts() {
        assert!(Money::from_decimal(f64::NAN).is_err());
        assert!(Money::from_decimal(f64::INFINITY).is_err());
    }

    #[test]
    fn displays_two_decimal_places() {
        assert_eq!(Money::from_cents(158_067).to_string(), "1580.67");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn serializes_as_decimal_number() {
        let json = serde_json::to_string(&Money::from_cents(25_050)).unwrap();
        assert_eq!(json, "250.5");
        let back: Money = serde_json::from_str("250.5").unwrap();
        assert_eq!(back.cents(), 25_050);
        let whole: Money = serde_json::from_str("100").unwrap();
        assert_eq!(whole.cents(), 10_000);
    }

    #[test]
    fn scale_rounds_to_cent() {
        assert_eq!(Money::from_cents(333).scale(1.5).cents(), 500);
        assert_eq!(Money::from_cents(1000).scale(2.0).cents(), 2000);
    }

    proptest! {
        /// Property: adding then removing any set of amounts leaves nothing behind.
        #[test]
        fn add_then_remove_is_zero(cents in prop::collection::vec(-1_000_000i64..1_000_000, 0..50)) {
            let amounts: Vec<Money> = cents.iter().map(|c| Money::from_cents(*c)).collect();
            let mut total: Money = amounts.iter().sum();
            for a in &amounts {
                total -= *a;
            }
            prop_assert!(total.is_zero());
        }
    }
}
