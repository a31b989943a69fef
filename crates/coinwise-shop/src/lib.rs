//! # coinwise-shop: Shopping Drill Runtime
//!
//! This crate runs the shopping drill: a learner is shown a product and a
//! price, puts coins and notes on a tray, and pays. Overpaying with change
//! practice on makes the cashier lay out the price and the change piece by
//! piece, and the learner then takes exactly the price off the tray.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   front end ──► ShopSession ──┬──► Tray (ledger + exclusive lock)      │
//! │                     │         │                                         │
//! │                     │         └──► AnimationSequencer (timed replay)   │
//! │                     │                                                   │
//! │                     ├──► Notifier (speech, latest wins)                │
//! │                     └──► ShopEventEmitter (redraws)                    │
//! │                                                                         │
//! │   ShopConfig (defaults → shop.toml → COINWISE_* env → validate)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Shop configuration and validated catalogs
//! - [`error`] - Shop error types
//! - [`events`] - UI event emitter seam
//! - [`notify`] - Speech seam and the latest-utterance notifier
//! - [`sequencer`] - Timed tray replay
//! - [`session`] - The stage machine and player operations
//! - [`tray`] - Shared tray with the exclusive animation lock
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coinwise_shop::{ShopConfig, ShopSession};
//! use coinwise_core::Money;
//!
//! let config = ShopConfig::load_or_default(None);
//! let session = ShopSession::new(config)?;
//!
//! session.start_round("41-50")?;
//! session.add_denomination(Money::from_units(50))?;
//! let outcome = session.pay().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod events;
pub mod notify;
pub mod sequencer;
pub mod session;
pub mod tray;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{Catalogs, ShopConfig};
pub use error::{ShopError, ShopResult};
pub use events::{NoOpEmitter, ShopEventEmitter};
pub use notify::{LatestUtterance, NoOpNotifier, Notifier, UtteranceReceiver};
pub use session::{
    Attempt, Payment, PendingReplay, Rejection, Removal, SessionSnapshot, ShopSession,
    ShopSessionBuilder,
};
