//! # CLI Error Type
//!
//! What the player sees when a command fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ShopError / CoreError ──► CliError { code, message } ──► one line     │
//! │                                                                         │
//! │  code:    machine-readable, stable (NO_PRODUCTS, UNKNOWN_COMMAND, ...)  │
//! │  message: human-readable, shown as is                                  │
//! │                                                                         │
//! │  Rejected actions are not errors and never reach this type.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use coinwise_core::CoreError;
use coinwise_shop::ShopError;
use serde::Serialize;

/// Result type for terminal commands.
pub type CliResult<T> = Result<T, CliError>;

/// Error returned from a command.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NO_PRODUCTS",
///   "message": "No products priced between 500 and 1000"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    pub code: ErrorCode,
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The chosen range has no products.
    NoProducts,

    /// No range with that id.
    UnknownRange,

    /// No coin or note with that value.
    UnknownDenomination,

    /// The breakdown could not be built from the configured denominations.
    BreakdownFailed,

    /// Too many pieces on the tray.
    TrayFull,

    /// Bad or unreadable configuration.
    ConfigError,

    /// The input line was not a command.
    UnknownCommand,

    /// Reading input or writing output failed.
    Io,
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates an unknown-command error.
    pub fn unknown_command(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::UnknownCommand, message)
    }
}

/// Converts core errors to CLI errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::NoProductsInRange { .. } => ErrorCode::NoProducts,
            CoreError::DecompositionIncomplete { .. } => {
                tracing::error!("Breakdown failed: {}", err);
                ErrorCode::BreakdownFailed
            }
            CoreError::UnknownDenomination { .. } => ErrorCode::UnknownDenomination,
            CoreError::TrayFull { .. } => ErrorCode::TrayFull,
            CoreError::CanonicalValueUnavailable { .. }
            | CoreError::InvalidCatalog { .. }
            | CoreError::Validation(_) => ErrorCode::ConfigError,
        };
        CliError::new(code, err.to_string())
    }
}

/// Converts shop errors to CLI errors.
impl From<ShopError> for CliError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::Core(core) => core.into(),
            ShopError::UnknownRange(id) => CliError::new(
                ErrorCode::UnknownRange,
                format!("Unknown price range: {} (try `ranges`)", id),
            ),
            other @ (ShopError::InvalidConfig(_) | ShopError::ConfigLoadFailed(_)) => {
                CliError::new(ErrorCode::ConfigError, other.to_string())
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::Io, err.to_string())
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}
