use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub, SubAssign};

/// Money type holding an amount in the smallest currency unit.
///
/// All arithmetic is integer; division truncates toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// create from minor units (cents, rupiah, etc)
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// get amount in minor units
    pub const fn as_minor(&self) -> i64 {
        self.0
    }

    /// check if negative
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// flat percentage of this amount, truncated (e.g., 10% of 5_000_000)
    pub fn checked_percentage(&self, rate: Rate) -> Option<Self> {
        self.0.checked_mul(rate.as_percent()).map(|v| Money(v / 100))
    }

    /// split into `parts` equal shares, truncated
    pub fn checked_div(&self, parts: u32) -> Option<Self> {
        if parts == 0 {
            return None;
        }
        Some(Money(self.0 / i64::from(parts)))
    }

    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, count: u32) -> Money {
        Money(self.0 * i64::from(count))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + *x)
    }
}

/// flat interest rate as a whole percent, charged once on principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Rate(i64);

impl Rate {
    pub const ZERO: Rate = Rate(0);

    /// create from percentage (e.g., 10 for 10%)
    pub const fn from_percentage(p: i64) -> Self {
        Rate(p)
    }

    /// get as percentage
    pub const fn as_percent(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_percentage_truncates() {
        let principal = Money::from_minor(5_000_000);
        assert_eq!(
            principal.checked_percentage(Rate::from_percentage(10)),
            Some(Money::from_minor(500_000))
        );

        // 999 * 15 / 100 = 149.85
        let odd = Money::from_minor(999);
        assert_eq!(
            odd.checked_percentage(Rate::from_percentage(15)),
            Some(Money::from_minor(149))
        );
    }

    #[test]
    fn test_division_truncates_and_rejects_zero() {
        let total = Money::from_minor(1_000);
        assert_eq!(total.checked_div(3), Some(Money::from_minor(333)));
        assert_eq!(total.checked_div(0), None);
    }

    #[test]
    fn test_overflow_is_reported() {
        let huge = Money::from_minor(i64::MAX);
        assert_eq!(huge.checked_percentage(Rate::from_percentage(2)), None);
        assert_eq!(huge.checked_add(Money::from_minor(1)), None);
    }

    #[test]
    fn test_sum_and_display() {
        let amounts = [Money::from_minor(110_000), Money::from_minor(110_000)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, Money::from_minor(220_000));
        assert_eq!(total.to_string(), "220000");
        assert_eq!(Rate::from_percentage(10).to_string(), "10%");
    }
}
