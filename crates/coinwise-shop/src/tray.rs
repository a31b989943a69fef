//! # Tray State
//!
//! The shared tender ledger plus the exclusive lock the animation holds.
//!
//! ## Locking Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tray Access                                      │
//! │                                                                         │
//! │  Caller                 Entry point               While animating      │
//! │  ──────                 ───────────               ───────────────      │
//! │  Player add/remove ───► try_with_tray_mut() ────► None (no-op)        │
//! │  Player reset ────────► try_with_tray_mut() ────► None (no-op)        │
//! │  UI redraw ───────────► with_tray() ────────────► allowed (read)       │
//! │  Sequencer ───────────► try_lock_exclusive() ───► None (second run)   │
//! │                                                                         │
//! │  The exclusive lock is a one-permit semaphore. Its permit lives in     │
//! │  ExclusiveTray and is released when that guard drops.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The permit check and the write happen under the same ledger mutex, so a
//! player write can never land between the sequencer taking the lock and
//! clearing the tray.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use coinwise_core::ledger::TenderLedger;
use coinwise_core::{Denomination, Money};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Cloneable handle to the tray.
#[derive(Clone)]
pub struct Tray {
    ledger: Arc<Mutex<TenderLedger>>,
    gate: Arc<Semaphore>,
}

impl Tray {
    /// Creates an empty, unlocked tray.
    pub fn new() -> Self {
        Tray {
            ledger: Arc::new(Mutex::new(TenderLedger::new())),
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    fn guard(&self) -> MutexGuard<'_, TenderLedger> {
        // The ledger holds plain data, a panicked writer cannot leave it torn
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the ledger.
    pub fn with_tray<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&TenderLedger) -> R,
    {
        let ledger = self.guard();
        f(&ledger)
    }

    /// Executes a function with write access, unless the animation holds
    /// the tray. Returns `None` without touching the ledger in that case.
    pub fn try_with_tray_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut TenderLedger) -> R,
    {
        let mut ledger = self.guard();
        if self.gate.available_permits() == 0 {
            return None;
        }
        Some(f(&mut ledger))
    }

    /// Takes the exclusive lock, or returns `None` if it is already held.
    pub fn try_lock_exclusive(&self) -> Option<ExclusiveTray> {
        let _ledger = self.guard();
        let permit = Arc::clone(&self.gate).try_acquire_owned().ok()?;
        Some(ExclusiveTray {
            tray: self.clone(),
            _permit: permit,
        })
    }

    /// Returns true while an exclusive guard is alive.
    pub fn is_locked(&self) -> bool {
        self.gate.available_permits() == 0
    }

    /// Snapshot of the pieces and total.
    pub fn contents(&self) -> (Vec<Denomination>, Money) {
        self.with_tray(|ledger| (ledger.items().to_vec(), ledger.total()))
    }

    pub fn total(&self) -> Money {
        self.with_tray(TenderLedger::total)
    }
}

impl Default for Tray {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Exclusive Guard
// =============================================================================

/// Write access reserved for the animation. Dropping it unlocks the tray.
pub struct ExclusiveTray {
    tray: Tray,
    _permit: OwnedSemaphorePermit,
}

impl ExclusiveTray {
    pub fn clear(&self) {
        self.tray.guard().clear();
    }

    /// Appends a piece and returns the new total. The player's piece
    /// limit does not apply.
    pub fn push(&self, denomination: Denomination) -> Money {
        self.tray.guard().place(denomination)
    }

    /// Snapshot of the pieces and total.
    pub fn contents(&self) -> (Vec<Denomination>, Money) {
        self.tray.contents()
    }
}
