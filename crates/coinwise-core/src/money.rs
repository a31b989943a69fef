//! # Money Module
//!
//! Provides the `Money` type for amounts in the drill currency.
//!
//! ## Why a Newtype?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The drill works in whole currency units (1, 5, 10, 50, ... 元).        │
//! │                                                                         │
//! │  Prices, tray totals, change and "paid so far" all flow through the    │
//! │  same arithmetic. A bare i64 lets a piece count slip into a total;     │
//! │  Money keeps amounts and counts apart at compile time.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use coinwise_core::money::Money;
//!
//! let price = Money::from_units(45);
//! let paid = Money::from_units(50);
//! assert_eq!((paid - price).units(), 5);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// An amount in whole currency units.
///
/// ## Design Decisions
/// - **i64 (signed)**: "paid so far" can dip below zero mid-calculation
/// - **Single field tuple struct**: serializes as a plain integer in TOML/JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole units.
    ///
    /// ## Example
    /// ```rust
    /// use coinwise_core::money::Money;
    ///
    /// let price = Money::from_units(120);
    /// assert_eq!(price.units(), 120);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Subtracts, returning `None` when the result would be negative.
    ///
    /// ## Example
    /// ```rust
    /// use coinwise_core::money::Money;
    ///
    /// let ten = Money::from_units(10);
    /// assert_eq!(ten.checked_sub_non_negative(Money::from_units(4)), Some(Money::from_units(6)));
    /// assert_eq!(ten.checked_sub_non_negative(Money::from_units(11)), None);
    /// ```
    #[inline]
    pub fn checked_sub_non_negative(&self, other: Money) -> Option<Money> {
        let diff = self.0.checked_sub(other.0)?;
        (diff >= 0).then_some(Money(diff))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the bare number; the currency suffix is a front-end concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
