//! # Money Module
//!
//! `Money` (integer cents) and `TaxRate` (basis points).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Bill totals are sums of captured line prices:                          │
//! │                                                                         │
//! │    3 × 100 cents = 300 cents         exact, no drift                    │
//! │    300 × 825 bps = 24.75 cents       one rounding step, at the cent     │
//! │                                                                         │
//! │  Floats would make "total == Σ lines" an approximate check, and the     │
//! │  analytics sums would drift as orders accumulate.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::{Money, TaxRate};
//!
//! let line = Money::from_cents(100).multiply_quantity(3);
//! assert_eq!(line.cents(), 300);
//!
//! let tax = line.calculate_tax(TaxRate::from_bps(1000));
//! assert_eq!(tax.cents(), 30);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Serialized as a bare integer, so `{"totalSales": 300}` means 300 cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
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

    /// Whole currency units (dollars) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Minor units portion, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Calculates tax, rounding half-up to the cent.
    ///
    /// ## Implementation
    /// `(amount × bps + 5000) / 10000` in `i128`, so large totals at
    /// 100% tax cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::{Money, TaxRate};
    ///
    /// // $10.00 × 8.25% = $0.825 → $0.83
    /// let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Line extension: unit price × quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Line extension, `None` on overflow.
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Integer division for averages. Returns zero when `count` is zero.
    pub fn average_over(&self, count: i64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        Money(self.0 / count)
    }

    /// Formats with a currency symbol, e.g. `$10.99` or `€3.50`.
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with("$"))
    }
}

// Operators saturate instead of panicking. Validated prices and quantities
// keep real totals far from the limits; bill totals go through
// `checked_add` / `checked_mul_quantity` so overflow is reported.

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (1 bps = 0.01%, 825 = 8.25%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Percentage for display only, never for arithmetic.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
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
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::from_cents(0).to_string(), "$0.00");
        assert_eq!(Money::from_cents(350).format_with("€"), "€3.50");
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 300 × 8.25% = 24.75 → 25
        assert_eq!(Money::from_cents(300).calculate_tax(TaxRate::from_bps(825)).cents(), 25);
        // 1000 × 8.25% = 82.5 → 83
        assert_eq!(Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825)).cents(), 83);
        // 1 × 10% = 0.1 → 0
        assert_eq!(Money::from_cents(1).calculate_tax(TaxRate::from_bps(1000)).cents(), 0);
    }

    #[test]
    fn test_tax_zero_rate() {
        assert!(Money::from_cents(12345).calculate_tax(TaxRate::zero()).is_zero());
    }

    #[test]
    fn test_tax_does_not_overflow_on_large_totals() {
        let total = Money::from_cents(i64::MAX / 2);
        let tax = total.calculate_tax(TaxRate::from_bps(10000));
        assert_eq!(tax.cents(), i64::MAX / 2);
    }

    #[test]
    fn test_sum_and_average() {
        let lines = vec![Money::from_cents(300), Money::from_cents(150), Money::from_cents(50)];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total.cents(), 500);
        assert_eq!(total.average_over(3).cents(), 166);
        assert_eq!(total.average_over(0), Money::zero());
    }

    #[test]
    fn test_overflow_is_checked_or_saturated() {
        let big = Money::from_cents(i64::MAX / 2 + 1);

        assert_eq!(big.checked_mul_quantity(2), None);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(
            Money::from_cents(300).checked_mul_quantity(3),
            Some(Money::from_cents(900))
        );

        assert_eq!(big.multiply_quantity(10).cents(), i64::MAX);
        assert_eq!((big + big).cents(), i64::MAX);
        let total: Money = vec![big, big, big].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    #[test]
    fn test_tax_rate_display() {
        assert_eq!(TaxRate::from_bps(825).to_string(), "8.25%");
        assert_eq!(TaxRate::from_bps(1000).to_string(), "10.00%");
        assert!((TaxRate::from_bps(825).percentage() - 8.25).abs() < 1e-9);
    }
}
