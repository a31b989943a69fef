//! # Payment Evaluator
//!
//! Classifies a payment attempt and tracks progress during change practice.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tray total vs price     change mode    outcome                         │
//! │  ───────────────────     ───────────    ─────────────────────────────   │
//! │  total == price          any            Exact                           │
//! │  total <  price          any            Short { diff }                  │
//! │  total >  price          off            OverRejected { excess }         │
//! │  total >  price          on             OverAccepted { snapshot }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! During change practice the tray is refilled with the breakdown and the
//! player takes pieces away. "Paid so far" is what has left the tray:
//!
//! ```text
//! paid_so_far = initial_payment_total − current tray total
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Transaction Snapshot
// =============================================================================

/// Captured once, when an overpayment starts change practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionSnapshot {
    /// Tray total at the moment "pay" was pressed.
    pub initial_payment_total: Money,
}

impl TransactionSnapshot {
    pub fn new(initial_payment_total: Money) -> Self {
        TransactionSnapshot {
            initial_payment_total,
        }
    }

    /// Amount taken off the tray since the snapshot.
    #[inline]
    pub fn paid_so_far(&self, tray_total: Money) -> Money {
        self.initial_payment_total - tray_total
    }
}

// =============================================================================
// Payment Outcome
// =============================================================================

/// Result of pressing "pay" in the BUYING stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Tray matches the price. The round completes after the display delay.
    Exact,

    /// Not enough on the tray.
    Short { diff: Money },

    /// Too much on the tray and change practice is off.
    OverRejected { excess: Money },

    /// Too much on the tray and change practice is on.
    OverAccepted { snapshot: TransactionSnapshot },
}

impl PaymentOutcome {
    /// Returns true if this outcome ends the round.
    pub fn completes_round(&self) -> bool {
        matches!(self, PaymentOutcome::Exact)
    }
}

/// Classifies a payment.
///
/// ## Example
/// ```rust
/// use coinwise_core::payment::{evaluate_payment, PaymentOutcome};
/// use coinwise_core::Money;
///
/// let outcome = evaluate_payment(Money::from_units(25), Money::from_units(30), false);
/// assert_eq!(outcome, PaymentOutcome::Short { diff: Money::from_units(5) });
/// ```
pub fn evaluate_payment(tray_total: Money, price: Money, change_mode: bool) -> PaymentOutcome {
    if tray_total == price {
        PaymentOutcome::Exact
    } else if tray_total < price {
        PaymentOutcome::Short {
            diff: price - tray_total,
        }
    } else if change_mode {
        PaymentOutcome::OverAccepted {
            snapshot: TransactionSnapshot::new(tray_total),
        }
    } else {
        PaymentOutcome::OverRejected {
            excess: tray_total - price,
        }
    }
}

// =============================================================================
// Change Practice Progress
// =============================================================================

/// Where the player stands after taking a piece off the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeStatus {
    /// Exactly the price has been taken; what is left is the change.
    Complete { change: Money },

    /// More than the price has been taken.
    TooMuchTaken { paid: Money },

    /// Less than the price has been taken so far.
    StillTaking { paid: Money, remaining: Money },
}

impl ChangeStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, ChangeStatus::Complete { .. })
    }
}

/// Evaluates change practice after a removal.
pub fn evaluate_change(
    snapshot: &TransactionSnapshot,
    tray_total: Money,
    price: Money,
) -> ChangeStatus {
    let paid = snapshot.paid_so_far(tray_total);

    if paid == price {
        ChangeStatus::Complete { change: tray_total }
    } else if paid > price {
        ChangeStatus::TooMuchTaken { paid }
    } else {
        ChangeStatus::StillTaking {
            paid,
            remaining: price - paid,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
