//! # Shop Error Types
//!
//! Error types for the shopping runtime.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shop Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Domain       │  │     Session             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Core(..)       │  │  UnknownRange           │ │
//! │  │  ConfigLoad..   │  │  NoProducts..   │  │                         │ │
//! │  │                 │  │  Decomposition..│  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stale player actions are not errors. They come back as
//! [`Rejection`](crate::session::Rejection) values.

use coinwise_core::CoreError;
use thiserror::Error;

/// Result type alias for shop operations.
pub type ShopResult<T> = Result<T, ShopError>;

/// Shop error type.
#[derive(Debug, Error)]
pub enum ShopError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// The configuration failed validation.
    #[error("Invalid shop configuration: {0}")]
    InvalidConfig(String),

    /// The config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// A rule of the drill failed (empty range, incomplete breakdown, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// No configured price range has this id.
    #[error("Unknown price range: {0}")]
    UnknownRange(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for ShopError {
    fn from(err: std::io::Error) -> Self {
        ShopError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ShopError {
    fn from(err: toml::de::Error) -> Self {
        ShopError::ConfigLoadFailed(err.to_string())
    }
}

impl From<coinwise_core::ValidationError> for ShopError {
    fn from(err: coinwise_core::ValidationError) -> Self {
        ShopError::InvalidConfig(err.to_string())
    }
}

impl ShopError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ShopError::InvalidConfig(_)
                | ShopError::ConfigLoadFailed(_)
                | ShopError::Core(CoreError::CanonicalValueUnavailable { .. })
                | ShopError::Core(CoreError::InvalidCatalog { .. })
                | ShopError::Core(CoreError::Validation(_))
        )
    }
}
