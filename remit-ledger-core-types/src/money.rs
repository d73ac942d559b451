//! Fixed precision decimal used for every amount, rate and cost in the ledger.
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal, RoundingStrategy,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

/// Number of decimal places derived values (quotients, averages) are rounded to
/// before they are persisted.
pub const MONEY_SCALE: u32 = 8;

#[derive(Error, Debug, Clone)]
pub enum MoneyError {
    #[error("MoneyError - DivisionByZero: cannot divide {0} by zero")]
    DivisionByZero(Decimal),
    #[error("MoneyError - Overflow: {0} {1} {2} does not fit a decimal")]
    Overflow(Decimal, &'static str, Decimal),
    #[error("MoneyError - NotFinite: {0} has no decimal representation")]
    NotFinite(f64),
    #[error("MoneyError - Parse: {0}")]
    Parse(#[from] rust_decimal::Error),
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[derive(sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const ONE: Money = Money(Decimal::ONE);
    pub const ONE_HUNDRED: Money = Money(Decimal::ONE_HUNDRED);

    /// `num * 10^-scale`, e.g. `Money::new(1325, 3)` is `1.325`.
    pub const fn new(num: i64, scale: u32) -> Self {
        Money(Decimal::from_parts(
            (num.unsigned_abs() & 0xFFFF_FFFF) as u32,
            (num.unsigned_abs() >> 32) as u32,
            0,
            num < 0,
            scale,
        ))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Money(value)
    }

    pub fn to_decimal(self) -> Decimal {
        self.0
    }

    pub fn from_f64(value: f64) -> Result<Self, MoneyError> {
        Decimal::from_f64(value)
            .map(Money)
            .ok_or(MoneyError::NotFinite(value))
    }

    /// Lossy conversion for display purposes only.
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    pub fn checked_add(self, rhs: Money) -> Result<Money, MoneyError> {
        self.0
            .checked_add(rhs.0)
            .map(Money)
            .ok_or(MoneyError::Overflow(self.0, "+", rhs.0))
    }

    pub fn checked_sub(self, rhs: Money) -> Result<Money, MoneyError> {
        self.0
            .checked_sub(rhs.0)
            .map(Money)
            .ok_or(MoneyError::Overflow(self.0, "-", rhs.0))
    }

    pub fn checked_mul(self, rhs: Money) -> Result<Money, MoneyError> {
        self.0
            .checked_mul(rhs.0)
            .map(Money)
            .ok_or(MoneyError::Overflow(self.0, "*", rhs.0))
    }

    pub fn checked_div(self, rhs: Money) -> Result<Money, MoneyError> {
        if rhs.is_zero() {
            return Err(MoneyError::DivisionByZero(self.0));
        }
        self.0
            .checked_div(rhs.0)
            .map(Money)
            .ok_or(MoneyError::Overflow(self.0, "/", rhs.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(self) -> Money {
        Money(self.0.abs())
    }

    pub fn min(self, other: Money) -> Money {
        if other < self {
            other
        } else {
            self
        }
    }

    pub fn max(self, other: Money) -> Money {
        if other > self {
            other
        } else {
            self
        }
    }

    pub fn round_dp(self, dp: u32) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
                .normalize(),
        )
    }

    /// Rounds to [`MONEY_SCALE`].
    pub fn round_money(self) -> Money {
        self.round_dp(MONEY_SCALE)
    }

    /// True when `|self - other| <= tolerance`.
    pub fn approx_eq(self, other: Money, tolerance: Money) -> bool {
        (self - other).abs() <= tolerance
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Money(Decimal::from_str(s.trim())?))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Money(Decimal::from(value))
    }
}

impl From<i32> for Money {
    fn from(value: i32) -> Self {
        Money(Decimal::from(value))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul for Money {
    type Output = Money;

    fn mul(self, rhs: Money) -> Money {
        Money(self.0 * rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn division_by_zero_is_an_error() {
        let res = Money::from(10).checked_div(Money::ZERO);
        assert!(matches!(res, Err(MoneyError::DivisionByZero(n)) if n == dec!(10)));
    }

    #[test]
    fn arithmetic_stays_exact() {
        let a: Money = "0.1".parse().unwrap();
        let b: Money = "0.2".parse().unwrap();
        assert_eq!(a + b, Money::new(3, 1));
        assert_eq!(b - a, Money::new(1, 1));
        assert_eq!(a * b, Money::new(2, 2));
        assert_eq!(-a, Money::new(-1, 1));
    }

    #[test]
    fn new_handles_sign_and_scale() {
        assert_eq!(Money::new(1325, 3).to_decimal(), dec!(1.325));
        assert_eq!(Money::new(-84_000, 0).to_decimal(), dec!(-84000));
        assert_eq!(
            Money::new(500_000_000_000, 3).to_decimal(),
            dec!(500000000.000)
        );
    }

    #[test]
    fn comparisons() {
        let small = Money::from(1);
        let large = Money::from(2);
        assert!(small < large);
        assert!(large > small);
        assert!(small <= Money::from(1));
        assert_eq!(small.min(large), small);
        assert_eq!(small.max(large), large);
        assert!(Money::ZERO.is_zero());
        assert!(Money::from(-1).is_negative());
    }

    #[test]
    fn rounding_to_money_scale() {
        let third = Money::ONE.checked_div(Money::from(3)).unwrap();
        assert_eq!(third.round_money(), Money::new(33_333_333, 8));
        assert_eq!(Money::new(1000, 3).round_money().to_string(), "1");
    }

    #[test]
    fn approx_eq_uses_tolerance() {
        let tolerance = Money::new(1, 2);
        assert!(Money::new(1000, 3).approx_eq(Money::new(1005, 3), tolerance));
        assert!(!Money::new(1000, 3).approx_eq(Money::new(1020, 3), tolerance));
    }

    #[test]
    fn float_round_trip_for_display() {
        let m = Money::from_f64(1.5).unwrap();
        assert_eq!(m, Money::new(15, 1));
        assert_eq!(m.to_f64(), 1.5);
        assert!(Money::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn sums() {
        let values = [Money::from(1), Money::from(2), Money::from(-4)];
        assert_eq!(values.iter().sum::<Money>(), Money::from(-1));
    }
}
