//! # Change Decomposer
//!
//! Greedy breakdown of a payment into the pieces the cashier animation shows.
//!
//! ## Two Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Player paid 60 for a 45 item                                          │
//! │                                                                         │
//! │  Phase 1: price (canonical subset 50, 10, 5, 1)                        │
//! │     45 ──► 10 10 10 10 5                                               │
//! │                                                                         │
//! │  Phase 2: change (full catalog, largest first)                         │
//! │     15 ──► 10 5                                                        │
//! │                                                                         │
//! │  Sequence (price first, then change):                                  │
//! │     [10, 10, 10, 10, 5, 10, 5]      sum = 60                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The greedy fill guarantees the sum matches whenever the smallest unit
//! divides the remainder. It does NOT guarantee the fewest pieces for
//! arbitrary denomination sets. A remainder that cannot be covered is an
//! error, never a silently short sequence.

use serde::{Deserialize, Serialize};

use crate::catalog::{CanonicalSubset, DenominationCatalog};
use crate::error::{BreakdownPhase, CoreError, CoreResult};
use crate::money::Money;
use crate::types::Denomination;

// =============================================================================
// Breakdown
// =============================================================================

/// The two halves of a decomposed payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Pieces summing to the product price.
    pub price_part: Vec<Denomination>,

    /// Pieces summing to the overpaid amount. Empty for exact payments.
    pub change_part: Vec<Denomination>,
}

impl Breakdown {
    /// Price pieces followed by change pieces, in animation order.
    pub fn sequence(&self) -> Vec<Denomination> {
        self.price_part
            .iter()
            .chain(self.change_part.iter())
            .cloned()
            .collect()
    }

    pub fn price_total(&self) -> Money {
        self.price_part.iter().map(|d| d.value).sum()
    }

    pub fn change_total(&self) -> Money {
        self.change_part.iter().map(|d| d.value).sum()
    }

    /// Number of pieces across both halves.
    pub fn len(&self) -> usize {
        self.price_part.len() + self.change_part.len()
    }

    pub fn is_empty(&self) -> bool {
        self.price_part.is_empty() && self.change_part.is_empty()
    }
}

// =============================================================================
// Greedy Fill
// =============================================================================

/// Takes as many of each denomination as fit, largest first.
///
/// `pieces` must already be sorted largest first.
fn greedy_fill(
    target: Money,
    pieces: &[&Denomination],
    phase: BreakdownPhase,
) -> CoreResult<Vec<Denomination>> {
    let mut remainder = target;
    let mut out = Vec::new();

    for denomination in pieces {
        let unit = denomination.value;
        if !unit.is_positive() {
            continue;
        }
        while remainder >= unit {
            out.push((*denomination).clone());
            remainder -= unit;
        }
    }

    if !remainder.is_zero() {
        return Err(CoreError::DecompositionIncomplete {
            phase,
            target,
            remainder,
        });
    }

    Ok(out)
}

// =============================================================================
// Public API
// =============================================================================

/// Splits a payment of `paid` against `price` into price and change pieces.
///
/// The price is rebuilt from `canonical`, the change from every catalog
/// entry. A `paid` at or below the price yields an empty change part.
///
/// ## Errors
/// `DecompositionIncomplete` naming the phase that left a remainder.
pub fn decompose(
    price: Money,
    paid: Money,
    catalog: &DenominationCatalog,
    canonical: &CanonicalSubset,
) -> CoreResult<Breakdown> {
    let price_part = greedy_fill(price, &canonical.descending(), BreakdownPhase::Price)?;

    let change = paid
        .checked_sub_non_negative(price)
        .unwrap_or_else(Money::zero);
    let change_part = greedy_fill(change, &catalog.descending(), BreakdownPhase::Change)?;

    Ok(Breakdown {
        price_part,
        change_part,
    })
}

/// A way to pay `price` exactly, drawn from the whole catalog.
///
/// Used by the "show me" button, which is allowed to reach for notes.
pub fn solution(price: Money, catalog: &DenominationCatalog) -> CoreResult<Vec<Denomination>> {
    greedy_fill(price, &catalog.descending(), BreakdownPhase::Price)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DenominationKind;
    use proptest::prelude::*;

    fn m(units: i64) -> Money {
        Money::from_units(units)
    }

    fn values(pieces: &[Denomination]) -> Vec<i64> {
        pieces.iter().map(|d| d.value.units()).collect()
    }

    fn defaults() -> (DenominationCatalog, CanonicalSubset) {
        let catalog = DenominationCatalog::default_catalog();
        let canonical = CanonicalSubset::default_for(&catalog).unwrap();
        (catalog, canonical)
    }

    #[test]
    fn test_exact_payment_has_no_change() {
        let (catalog, canonical) = defaults();
        let breakdown = decompose(m(45), m(45), &catalog, &canonical).unwrap();

        assert_eq!(values(&breakdown.price_part), vec![10, 10, 10, 10, 5]);
        assert!(breakdown.change_part.is_empty());
    }

    #[test]
    fn test_overpayment_walkthrough() {
        let (catalog, canonical) = defaults();
        let breakdown = decompose(m(45), m(60), &catalog, &canonical).unwrap();

        assert_eq!(values(&breakdown.price_part), vec![10, 10, 10, 10, 5]);
        assert_eq!(values(&breakdown.change_part), vec![10, 5]);
        assert_eq!(values(&breakdown.sequence()), vec![10, 10, 10, 10, 5, 10, 5]);
        assert_eq!(breakdown.len(), 7);
    }

    #[test]
    fn test_price_never_uses_notes() {
        let (catalog, canonical) = defaults();
        let breakdown = decompose(m(120), m(1000), &catalog, &canonical).unwrap();

        assert_eq!(values(&breakdown.price_part), vec![50, 50, 10, 10]);
        assert_eq!(values(&breakdown.change_part), vec![500, 100, 100, 100, 50, 10, 10, 10]);
    }

    #[test]
    fn test_solution_uses_full_catalog() {
        let (catalog, _) = defaults();
        assert_eq!(values(&solution(m(120), &catalog).unwrap()), vec![100, 10, 10]);
    }

    #[test]
    fn test_missing_small_unit_reports_phase() {
        let catalog = DenominationCatalog::new(vec![
            Denomination::new(5, DenominationKind::Coin),
            Denomination::new(10, DenominationKind::Coin),
        ])
        .unwrap();
        let canonical = CanonicalSubset::new(&[m(10), m(5)], &catalog).unwrap();

        let err = decompose(m(23), m(23), &catalog, &canonical).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DecompositionIncomplete {
                phase: BreakdownPhase::Price,
                remainder,
                ..
            } if remainder == m(3)
        ));

        let err = decompose(m(20), m(27), &catalog, &canonical).unwrap_err();
        assert!(matches!(
            err,
            CoreError::DecompositionIncomplete {
                phase: BreakdownPhase::Change,
                ..
            }
        ));
    }

    #[test]
    fn test_greedy_is_not_minimal() {
        // Classic counterexample: 6 = 3+3, greedy takes 4+1+1
        let catalog = DenominationCatalog::new(vec![
            Denomination::new(1, DenominationKind::Coin),
            Denomination::new(3, DenominationKind::Coin),
            Denomination::new(4, DenominationKind::Coin),
        ])
        .unwrap();
        assert_eq!(values(&solution(m(6), &catalog).unwrap()), vec![4, 1, 1]);
    }

    proptest! {
        #[test]
        fn breakdown_sums_to_paid(price in 1i64..10_000, extra in 0i64..10_000) {
            let (catalog, canonical) = defaults();
            let breakdown = decompose(m(price), m(price + extra), &catalog, &canonical).unwrap();

            prop_assert_eq!(breakdown.price_total(), m(price));
            prop_assert_eq!(breakdown.change_total(), m(extra));
            prop_assert!(breakdown.price_part.iter().all(|d| canonical.contains(d.value)));
        }

        #[test]
        fn parts_are_non_increasing(price in 1i64..5_000, extra in 0i64..5_000) {
            let (catalog, canonical) = defaults();
            let breakdown = decompose(m(price), m(price + extra), &catalog, &canonical).unwrap();

            for part in [&breakdown.price_part, &breakdown.change_part] {
                prop_assert!(part.windows(2).all(|w| w[0].value >= w[1].value));
            }
        }
    }
}
