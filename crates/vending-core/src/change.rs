//! # Coin Change
//!
//! Breaks a remaining balance into coins, largest first.
//!
//! ```text
//!   185 ──► 100 ──► 85 ──► 50 ──► 35 ──► 20 ──► 15 ──► 10 ──► 5 ──► 5 ──► 0
//!           ×1            ×1            ×1            ×1           ×1
//! ```
//!
//! The greedy walk is exact for the 100/50/20/10/5 system whenever the
//! remainder is a multiple of 5, which every balance built from accepted
//! deposits and positive unit costs is.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Coin values paid out as change, highest first.
pub const CHANGE_COINS: [i64; 5] = [100, 50, 20, 10, 5];

/// Count of each coin returned to the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CoinChange {
    pub hundreds: i64,
    pub fifties: i64,
    pub twenties: i64,
    pub tens: i64,
    pub fives: i64,
}

impl CoinChange {
    /// Total value of the coins in cents.
    pub fn total(&self) -> i64 {
        self.hundreds * 100 + self.fifties * 50 + self.twenties * 20 + self.tens * 10 + self.fives * 5
    }
}

/// Greedy change for `remainder` cents.
///
/// Negative input yields all zeros. A remainder that is not a multiple of 5
/// leaves the sub-5 residue unpaid.
///
/// ## Example
/// ```rust
/// use vending_core::change::compute_change;
///
/// let change = compute_change(585);
/// assert_eq!(change.hundreds, 5);
/// assert_eq!(change.total(), 585);
/// ```
pub fn compute_change(remainder: i64) -> CoinChange {
    if remainder <= 0 {
        return CoinChange::default();
    }

    let mut left = remainder;
    let mut counts = [0i64; 5];
    for (count, coin) in counts.iter_mut().zip(CHANGE_COINS) {
        *count = left / coin;
        left %= coin;
    }

    let [hundreds, fifties, twenties, tens, fives] = counts;
    CoinChange {
        hundreds,
        fifties,
        twenties,
        tens,
        fives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(h: i64, f: i64, tw: i64, t: i64, fv: i64) -> CoinChange {
        CoinChange {
            hundreds: h,
            fifties: f,
            twenties: tw,
            tens: t,
            fives: fv,
        }
    }

    #[test]
    fn test_one_of_each() {
        assert_eq!(compute_change(185), coins(1, 1, 1, 1, 1));
    }

    #[test]
    fn test_many_hundreds() {
        assert_eq!(compute_change(585), coins(5, 1, 1, 1, 1));
    }

    #[test]
    fn test_zero_and_negative() {
        assert_eq!(compute_change(0), CoinChange::default());
        assert_eq!(compute_change(-5), CoinChange::default());
        assert_eq!(compute_change(i64::MIN), CoinChange::default());
    }

    #[test]
    fn test_twenties_repeat() {
        // 40 and 90 need two twenties; a single 50 never covers 40
        assert_eq!(compute_change(40), coins(0, 0, 2, 0, 0));
        assert_eq!(compute_change(90), coins(0, 1, 2, 0, 0));
        assert_eq!(compute_change(35), coins(0, 0, 1, 1, 1));
    }

    #[test]
    fn test_totals_match_for_multiples_of_five() {
        for remainder in (0..=1000).step_by(5) {
            assert_eq!(compute_change(remainder).total(), remainder);
        }
    }
}
