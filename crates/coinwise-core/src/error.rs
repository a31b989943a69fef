//! # Error Types
//!
//! Domain-specific error types for coinwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  coinwise-core errors (this file)                                      │
//! │  ├── CoreError        - Domain failures surfaced to the player/admin   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  coinwise-shop errors (separate crate)                                 │
//! │  └── ShopError        - Config + runtime failures                      │
//! │                                                                         │
//! │  Terminal app errors                                                   │
//! │  └── CliError         - What the player sees                           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ShopError → CliError → Screen     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejected player actions (tapping the tray during an animation, etc.) are
//! NOT errors. They are reported as rejections by the session and change
//! nothing.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Which half of a breakdown was being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownPhase {
    /// Rebuilding the product price from the canonical subset.
    Price,
    /// Breaking the overpaid amount into change.
    Change,
}

impl std::fmt::Display for BreakdownPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakdownPhase::Price => write!(f, "price"),
            BreakdownPhase::Change => write!(f, "change"),
        }
    }
}

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The selected price range contains no products.
    ///
    /// ## User Workflow
    /// ```text
    /// Setup screen: range "500-1000"
    ///      │
    ///      ▼
    /// start_round ──► pool is empty
    ///      │
    ///      ▼
    /// NoProductsInRange { min: 500, max: 1000 }
    ///      │
    ///      ▼
    /// Stage stays SETUP, message asks for another range
    /// ```
    #[error("No products priced between {min} and {max}")]
    NoProductsInRange { min: Money, max: Money },

    /// The greedy decomposition left a remainder no denomination can cover.
    ///
    /// Happens when the denominations lack a small enough unit, e.g. no
    /// 1-valued coin and an odd remainder.
    #[error("Cannot break {target} into {phase} pieces: {remainder} left over")]
    DecompositionIncomplete {
        phase: BreakdownPhase,
        target: Money,
        remainder: Money,
    },

    /// A canonical breakdown value is missing from the active catalog.
    #[error("Canonical value {value} is not in the denomination catalog")]
    CanonicalValueUnavailable { value: Money },

    /// No denomination with this value exists in the catalog.
    #[error("Unknown denomination: {value}")]
    UnknownDenomination { value: Money },

    /// A catalog failed its structural checks.
    #[error("Invalid catalog: {reason}")]
    InvalidCatalog { reason: String },

    /// The tray already holds the maximum number of pieces.
    #[error("Tray cannot hold more than {max} pieces")]
    TrayFull { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Lower bound above upper bound.
    #[error("{field}: minimum {min} is greater than maximum {max}")]
    InvertedRange { field: String, min: i64, max: i64 },

    /// Duplicate value (e.g., two coins with the same value).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A template uses a placeholder its phrase does not provide.
    #[error("{field} uses unknown placeholder {{{placeholder}}}")]
    UnknownPlaceholder { field: String, placeholder: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
