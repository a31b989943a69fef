//! # Validation Module
//!
//! Input validation for catalog entries loaded from configuration.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Config file (TOML)                                           │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - field rules                                    │
//! │  ├── positive prices and face values                                   │
//! │  └── names present and bounded                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: catalog construction                                         │
//! │  ├── unique values / ids                                               │
//! │  └── canonical subset present in the catalog                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use coinwise_core::validation::{validate_price, validate_product_name};
//! use coinwise_core::Money;
//!
//! validate_product_name("漢堡").unwrap();
//! validate_price(Money::from_units(45)).unwrap();
//! assert!(validate_price(Money::zero()).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PriceRange;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest product name accepted.
const MAX_NAME_CHARS: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be blank
/// - At most 100 characters (counted as chars, names are often CJK)
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_CHARS,
        });
    }

    Ok(())
}

/// Validates a catalog identifier (product or range id).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a product price. Prices are always positive.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates a denomination face value.
pub fn validate_face_value(value: Money) -> ValidationResult<()> {
    if !value.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "denomination value".to_string(),
        });
    }
    Ok(())
}

/// Validates a price range.
///
/// ## Rules
/// - Id present
/// - Minimum not negative, minimum ≤ maximum
pub fn validate_price_range(range: &PriceRange) -> ValidationResult<()> {
    validate_id("range id", &range.id)?;

    if range.min.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: format!("range {} minimum", range.id),
        });
    }

    if range.min > range.max {
        return Err(ValidationError::InvertedRange {
            field: format!("range {}", range.id),
            min: range.min.units(),
            max: range.max.units(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
