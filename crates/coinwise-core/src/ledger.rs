//! # Tender Ledger
//!
//! The tray: the ordered pieces the player has put down.
//!
//! ## Tray Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Tray Operations                                      │
//! │                                                                         │
//! │  Player Action            Ledger Call             Effect                │
//! │  ─────────────            ───────────             ──────                │
//! │  Tap wallet coin ───────► add(denomination) ────► push to end          │
//! │  Tap tray coin ─────────► remove(index) ────────► delete at position   │
//! │  Reset button ──────────► clear() ──────────────► empty                │
//! │  Cashier replay ────────► place(denomination) ──► push, no cap         │
//! │  Any redraw ────────────► total() ──────────────► sum of values        │
//! │                                                                         │
//! │  The lock that blocks the player during animations lives in the        │
//! │  runtime crate. The ledger itself is plain data.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The total is never cached: it is summed on demand, so it cannot drift
//! from the pieces.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Denomination;
use crate::MAX_TRAY_ITEMS;

/// Ordered multiset of denominations on the tray.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderLedger {
    items: Vec<Denomination>,
}

impl TenderLedger {
    /// Creates an empty tray.
    pub fn new() -> Self {
        TenderLedger { items: Vec::new() }
    }

    /// Appends a piece and returns the new total.
    ///
    /// ## Errors
    /// `TrayFull` once `MAX_TRAY_ITEMS` pieces are down.
    pub fn add(&mut self, denomination: Denomination) -> CoreResult<Money> {
        if self.items.len() >= MAX_TRAY_ITEMS {
            return Err(CoreError::TrayFull {
                max: MAX_TRAY_ITEMS,
            });
        }
        self.items.push(denomination);
        Ok(self.total())
    }

    /// Appends a piece placed by the cashier and returns the new total.
    ///
    /// Not bounded by `MAX_TRAY_ITEMS`: a breakdown of a large price can
    /// run past the player's limit.
    pub fn place(&mut self, denomination: Denomination) -> Money {
        self.items.push(denomination);
        self.total()
    }

    /// Removes the piece at `index`, or returns `None` if out of range.
    pub fn remove(&mut self, index: usize) -> Option<Denomination> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Empties the tray.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all piece values.
    pub fn total(&self) -> Money {
        self.items.iter().map(|d| d.value).sum()
    }

    pub fn items(&self) -> &[Denomination] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DenominationKind;

    fn coin(value: i64) -> Denomination {
        Denomination::new(value, DenominationKind::Coin)
    }

    #[test]
    fn test_add_and_total() {
        let mut tray = TenderLedger::new();
        assert_eq!(tray.total(), Money::zero());

        assert_eq!(tray.add(coin(10)).unwrap().units(), 10);
        assert_eq!(tray.add(coin(5)).unwrap().units(), 15);
        assert_eq!(tray.len(), 2);
    }

    #[test]
    fn test_remove_by_position_keeps_order() {
        let mut tray = TenderLedger::new();
        for v in [10, 5, 1] {
            tray.add(coin(v)).unwrap();
        }

        let removed = tray.remove(1).unwrap();
        assert_eq!(removed.value.units(), 5);
        let left: Vec<i64> = tray.items().iter().map(|d| d.value.units()).collect();
        assert_eq!(left, vec![10, 1]);
        assert_eq!(tray.total().units(), 11);
    }

    #[test]
    fn test_remove_out_of_range_is_none() {
        let mut tray = TenderLedger::new();
        tray.add(coin(1)).unwrap();
        assert!(tray.remove(3).is_none());
        assert_eq!(tray.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut tray = TenderLedger::new();
        tray.add(coin(50)).unwrap();
        tray.clear();
        assert!(tray.is_empty());
        assert!(tray.total().is_zero());
    }

    #[test]
    fn test_tray_full() {
        let mut tray = TenderLedger::new();
        for _ in 0..MAX_TRAY_ITEMS {
            tray.add(coin(1)).unwrap();
        }
        assert!(matches!(
            tray.add(coin(1)),
            Err(CoreError::TrayFull { .. })
        ));
    }

    #[test]
    fn test_place_ignores_player_limit() {
        let mut tray = TenderLedger::new();
        for _ in 0..MAX_TRAY_ITEMS {
            tray.add(coin(1)).unwrap();
        }
        assert_eq!(tray.place(coin(5)).units(), MAX_TRAY_ITEMS as i64 + 5);
        assert_eq!(tray.len(), MAX_TRAY_ITEMS + 1);

        // The player still cannot add on top
        assert!(tray.add(coin(1)).is_err());
    }
}
