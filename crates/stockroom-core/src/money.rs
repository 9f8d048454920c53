//! # Money Module
//!
//! Integer minor-unit money for prices, line totals and order totals.
//!
//! ## Where Rounding Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit price × qty ──► line total      (exact, no rounding)             │
//! │  Σ line totals    ──► subtotal        (exact, no rounding)             │
//! │  subtotal × (100 − pct) / 100 ──► total   (ONE round-half-up step)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let unit = Money::from_cents(100);
//! let line = unit.multiply_quantity(2);
//! assert_eq!(line.cents(), 200);
//!
//! let total = (line + Money::from_cents(50)).apply_discount_percent(10);
//! assert_eq!(total.cents(), 225);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the smallest currency unit.
///
/// Signed so that spend reversals on cancellation can be expressed as
/// negative deltas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Line total for `qty` units at this unit price.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Checked variant of [`Money::multiply_quantity`].
    ///
    /// Returns `None` when the product does not fit in an i64.
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Checked addition.
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Applies a whole-number percentage discount with round-half-up.
    ///
    /// `percent` is clamped to `0..=100`. Computed as
    /// `(cents × (100 − percent) + 50) / 100` in i128, so large subtotals
    /// cannot overflow the intermediate product.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// // 999 × 0.85 = 849.15 → 849
    /// assert_eq!(Money::from_cents(999).apply_discount_percent(15).cents(), 849);
    /// // 5 × 0.90 = 4.5 → 5 (half rounds up)
    /// assert_eq!(Money::from_cents(5).apply_discount_percent(10).cents(), 5);
    /// ```
    pub fn apply_discount_percent(&self, percent: u32) -> Money {
        let pct = percent.min(100) as i128;
        let kept = self.0 as i128 * (100 - pct);
        let rounded = if kept >= 0 {
            (kept + 50) / 100
        } else {
            (kept - 50) / 100
        };
        Money(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented rendering with two decimals, no currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Money(cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_sum_of_lines() {
        let total: Money = [200, 50].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 250);
    }

    #[test]
    fn test_discount_rounds_once_on_total() {
        assert_eq!(Money::from_cents(250).apply_discount_percent(10).cents(), 225);
        // 333 × 0.95 = 316.35
        assert_eq!(Money::from_cents(333).apply_discount_percent(5).cents(), 316);
        // 15 × 0.90 = 13.5 → 14
        assert_eq!(Money::from_cents(15).apply_discount_percent(10).cents(), 14);
    }

    #[test]
    fn test_discount_bounds() {
        let amount = Money::from_cents(1234);
        assert_eq!(amount.apply_discount_percent(0), amount);
        assert!(amount.apply_discount_percent(100).is_zero());
        assert!(amount.apply_discount_percent(250).is_zero());
    }

    #[test]
    fn test_discount_large_amount_does_not_overflow() {
        let big = Money::from_cents(i64::MAX / 2);
        let discounted = big.apply_discount_percent(50);
        assert!(discounted.cents() > 0);
        assert!(discounted < big);
    }

    #[test]
    fn test_checked_multiply_overflow() {
        assert!(Money::from_cents(i64::MAX).checked_multiply_quantity(2).is_none());
        assert_eq!(
            Money::from_cents(100).checked_multiply_quantity(3),
            Some(Money::from_cents(300))
        );
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_cents(4200)).unwrap();
        assert_eq!(json, "4200");
    }
}
