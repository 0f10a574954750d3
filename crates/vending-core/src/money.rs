//! # Money Module
//!
//! Integer-cent money and the set of coins a buyer may deposit.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every balance, unit cost and receipt total is a whole number of cents │
//! │                                                                         │
//! │    deposit 5/10/20/50/100  ──►  balance (i64 cents)                    │
//! │    unit_cost × quantity    ──►  cost    (i64 cents, checked multiply)  │
//! │    balance - cost          ──►  change  (greedy coin breakdown)        │
//! │                                                                         │
//! │  Floats never appear, so the ledger sums are exact.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vending_core::money::{AcceptedDenominations, Money};
//!
//! let cost = Money::from_cents(65).times(3).unwrap();
//! assert_eq!(cost.cents(), 195);
//!
//! let coins = AcceptedDenominations::default();
//! assert!(coins.accepts(50));
//! assert!(!coins.accepts(25));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// Account.balance ──► deposit (+coin) ──► purchase (−cost) ──► reset (0)
///                                               │
/// Product.unit_cost × quantity ─────────────────┘
/// ```
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

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use vending_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(65).times(2), Some(Money::from_cents(130)));
    /// assert_eq!(Money::from_cents(i64::MAX).times(2), None);
    /// ```
    #[inline]
    pub fn times(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Adds two values, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
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

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Money(cents)
    }
}

impl fmt::Display for Money {
    /// Formats as `1.85`; the machine has no currency symbol of its own.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Accepted Denominations
// =============================================================================

/// Default coins a buyer may deposit, in cents.
pub const DEFAULT_DENOMINATIONS: [i64; 5] = [5, 10, 20, 50, 100];

/// The whitelist of single-coin amounts a deposit may carry.
///
/// Kept sorted ascending with duplicates collapsed. Configuration decides the
/// contents; [`AcceptedDenominations::default`] is `{5, 10, 20, 50, 100}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(try_from = "Vec<i64>")]
pub struct AcceptedDenominations(Vec<i64>);

impl AcceptedDenominations {
    /// Builds a whitelist from raw cent values.
    ///
    /// ## Rules
    /// - At least one value
    /// - Every value strictly positive
    /// - Duplicates are collapsed
    pub fn new(values: impl IntoIterator<Item = i64>) -> Result<Self, ValidationError> {
        let mut values: Vec<i64> = values.into_iter().collect();

        if values.is_empty() {
            return Err(ValidationError::Required {
                field: "accepted_denominations".to_string(),
            });
        }

        if values.iter().any(|v| *v <= 0) {
            return Err(ValidationError::MustBePositive {
                field: "accepted_denominations".to_string(),
            });
        }

        values.sort_unstable();
        values.dedup();
        Ok(AcceptedDenominations(values))
    }

    /// Whether `amount` is exactly one accepted coin.
    #[inline]
    pub fn accepts(&self, amount: i64) -> bool {
        self.0.binary_search(&amount).is_ok()
    }

    /// Accepted values in ascending order.
    #[inline]
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl TryFrom<Vec<i64>> for AcceptedDenominations {
    type Error = ValidationError;

    fn try_from(values: Vec<i64>) -> Result<Self, Self::Error> {
        AcceptedDenominations::new(values)
    }
}

impl Default for AcceptedDenominations {
    fn default() -> Self {
        AcceptedDenominations(DEFAULT_DENOMINATIONS.to_vec())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let mut balance = Money::from_cents(150);
        balance += Money::from_cents(50);
        assert_eq!(balance.cents(), 200);

        balance -= Money::from_cents(195);
        assert_eq!(balance, Money::from_cents(5));
        assert!(balance.is_positive());
        assert!((Money::zero() - balance).is_negative());
    }

    #[test]
    fn test_times_detects_overflow() {
        assert_eq!(Money::from_cents(65).times(3), Some(Money::from_cents(195)));
        assert_eq!(Money::from_cents(i64::MAX / 2 + 1).times(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(185).to_string(), "1.85");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-250).to_string(), "-2.50");
    }

    #[test]
    fn test_default_denominations() {
        let coins = AcceptedDenominations::default();
        for coin in [5, 10, 20, 50, 100] {
            assert!(coins.accepts(coin));
        }
        for amount in [0, -5, 1, 15, 25, 200] {
            assert!(!coins.accepts(amount));
        }
    }

    #[test]
    fn test_custom_denominations() {
        let coins = AcceptedDenominations::new([25, 5, 25, 200]).unwrap();
        assert_eq!(coins.as_slice(), &[5, 25, 200]);
        assert!(coins.accepts(25));
        assert!(!coins.accepts(100));

        assert!(AcceptedDenominations::new(Vec::new()).is_err());
        assert!(AcceptedDenominations::new([5, 0]).is_err());
        assert!(AcceptedDenominations::new([-10]).is_err());
    }

    #[test]
    fn test_deserialize_normalizes() {
        let coins: AcceptedDenominations = serde_json::from_str("[50, 5, 50]").unwrap();
        assert_eq!(coins.as_slice(), &[5, 50]);
        assert!(serde_json::from_str::<AcceptedDenominations>("[]").is_err());
    }
}
