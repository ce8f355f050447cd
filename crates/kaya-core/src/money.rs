//! # Money Module
//!
//! Provides the `Money` type for monetary values.
//!
//! ## Exact Decimals, Rounded Only For Display
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  STORED                              PRESENTED                          │
//! │                                                                         │
//! │  subtotal   90                       "90.00"                            │
//! │  tax        13.5       (90 × 0.15)   "13.50"                            │
//! │  discount   10.35      (103.5 × 10%) "10.35"                            │
//! │  total      93.15                    "93.15"                            │
//! │                                                                         │
//! │  A percentage of a percentage can carry more than two places           │
//! │  (e.g. 7% of 103.57 = 7.2499). The full value is kept; only            │
//! │  `Display` / `round_2dp` round, half away from zero.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kaya_core::money::Money;
//!
//! let price = Money::from_major(45);
//! let line = price * 2;                        // 90
//! let total = line + Money::from_cents(1350);  // 103.50
//! assert_eq!(total.to_string(), "103.50");
//! assert_eq!((-total).to_string(), "-103.50");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of decimal places used when presenting money.
pub const DISPLAY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A signed monetary amount in major currency units (e.g. cedis).
///
/// ## Design Decisions
/// - **Decimal (not f64)**: `0.1 + 0.2 == 0.3` holds, and tax and percentage
///   discounts are computed without binary drift.
/// - **Signed**: refunds and cancellations are mirror-image records with
///   negative amounts.
/// - **JSON number on the wire**: serialized as a float so the payloads stay
///   plain `{"price": 45}` rather than `{"price": "45"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    /// Zero money value.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates money from whole units (45 → 45.00).
    #[inline]
    pub fn from_major(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Creates money from hundredths (1035 → 10.35).
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Wraps an exact decimal value.
    #[inline]
    pub const fn from_decimal(value: Decimal) -> Self {
        Money(value)
    }

    /// Returns the underlying decimal value.
    #[inline]
    pub const fn decimal(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is exactly zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Floors the amount at zero.
    #[inline]
    pub fn floor_zero(self) -> Self {
        self.max(Money::ZERO)
    }

    /// Multiplies by an exact factor (a tax fraction, a percentage / 100).
    #[inline]
    pub fn scale(&self, factor: Decimal) -> Self {
        Money(self.0 * factor)
    }

    /// Returns `percent`% of this amount.
    ///
    /// ```rust
    /// use kaya_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let base = Money::from_cents(10350);
    /// assert_eq!(base.percent(Decimal::from(10)), Money::from_cents(1035));
    /// ```
    #[inline]
    pub fn percent(&self, percent: Decimal) -> Self {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Rounds to two decimal places, half away from zero.
    ///
    /// Presentation only. Stored values are never rounded.
    pub fn round_2dp(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns true if the two amounts differ by less than `tolerance`.
    pub fn approx_eq(&self, other: Money, tolerance: Decimal) -> bool {
        (self.0 - other.0).abs() < tolerance
    }

    /// Returns the amount as f64 (lossy, for charts and logs).
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

// =============================================================================
// Arithmetic Operations
// =============================================================================

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Money;

    #[inline]
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

/// Multiply by a quantity (signed: negative quantities are returns).
impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, quantity: i64) -> Money {
        Money(self.0 * Decimal::from(quantity))
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

// =============================================================================
// Parsing & Display
// =============================================================================

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

/// Formats with exactly two decimals: `103.5` → `"103.50"`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.round_2dp().0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
