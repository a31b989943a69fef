//! # coinwise-core: Pure Domain Logic for the Shopping Drill
//!
//! This crate is the **heart** of Coinwise. It contains the arithmetic and
//! rules of the shopping drill as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Coinwise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Front end (terminal / web)                   │   │
//! │  │    Wallet ──► Tray ──► Pay button ──► Change practice          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              coinwise-shop (session + sequencer)                │   │
//! │  │    start_round, add_denomination, pay, reveal_solution, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ coinwise-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │  ledger   │  │  payment  │  │ decompose │  │   │
//! │  │   │  coins    │  │  tray     │  │  Exact    │  │  greedy   │  │   │
//! │  │   │  products │  │  total    │  │  Short    │  │  price +  │  │   │
//! │  │   │  ranges   │  │           │  │  Over     │  │  change   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO SPEECH • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Denominations, products, price ranges, rounds, stages
//! - [`money`] - Money type with integer arithmetic
//! - [`catalog`] - Validated denomination/product catalogs and the canonical subset
//! - [`ledger`] - The tender ledger (the tray)
//! - [`payment`] - Payment evaluation and change-practice progress
//! - [`decompose`] - Greedy price/change decomposition
//! - [`round`] - Round generation
//! - [`voice`] - Voice phrase templates
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use coinwise_core::catalog::{CanonicalSubset, DenominationCatalog};
//! use coinwise_core::decompose::decompose;
//! use coinwise_core::money::Money;
//!
//! let catalog = DenominationCatalog::default_catalog();
//! let canonical = CanonicalSubset::default_for(&catalog).unwrap();
//!
//! // A 45 price paid with a 50 coin
//! let breakdown = decompose(Money::from_units(45), Money::from_units(50), &catalog, &canonical).unwrap();
//! assert_eq!(breakdown.price_total().units(), 45);
//! assert_eq!(breakdown.change_total().units(), 5);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod decompose;
pub mod error;
pub mod ledger;
pub mod money;
pub mod payment;
pub mod round;
pub mod types;
pub mod validation;
pub mod voice;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Denomination values the price breakdown draws from, largest first.
///
/// Kept small on purpose: learners see the price rebuilt from the same few
/// coins every time. Configurable, but always validated against the catalog.
pub const DEFAULT_CANONICAL_SUBSET: [i64; 4] = [50, 10, 5, 1];

/// Maximum number of pieces the player can put on the tray.
///
/// Prevents a runaway tray from an auto-clicker or a stuck key. Cashier
/// replays are not bounded by it.
pub const MAX_TRAY_ITEMS: usize = 200;
