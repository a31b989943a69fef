//! # Session Events
//!
//! Hooks a front end implements to redraw when the session changes.
//!
//! ```text
//! ShopSession ──► emit_stage     (SETUP / BUYING / CHANGE_ACTION)
//!             ──► emit_tray      (pieces + total, after every write)
//!             ──► emit_feedback  (the feedback that was spoken)
//! ```

use coinwise_core::voice::Feedback;
use coinwise_core::{Denomination, Money, Stage};

/// Event emitter for UI updates.
pub trait ShopEventEmitter: Send + Sync {
    /// The stage changed.
    fn emit_stage(&self, stage: Stage);

    /// The tray changed.
    fn emit_tray(&self, items: &[Denomination], total: Money);

    /// Feedback was produced, with the text handed to the notifier.
    fn emit_feedback(&self, feedback: &Feedback, text: &str);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl ShopEventEmitter for NoOpEmitter {
    fn emit_stage(&self, _stage: Stage) {}
    fn emit_tray(&self, _items: &[Denomination], _total: Money) {}
    fn emit_feedback(&self, _feedback: &Feedback, _text: &str) {}
}
