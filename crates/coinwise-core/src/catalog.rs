//! # Catalogs
//!
//! Validated, read-only views over the externally owned denomination and
//! product lists.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Config / admin screen (external owner)                                 │
//! │        │ Vec<Denomination>, Vec<Product>                                │
//! │        ▼                                                                │
//! │  DenominationCatalog::new / ProductCatalog::new  ← validation here      │
//! │        │                                                                │
//! │        ├──► find(value)      → &Denomination                           │
//! │        ├──► descending()     → NEW Vec, catalog order untouched        │
//! │        └──► pool(range)      → NEW Vec<Product>, catalog untouched     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transformation returns a new sequence. Nothing here mutates the
//! owner's copy.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Denomination, DenominationKind, PriceRange, Product};
use crate::validation::{validate_face_value, validate_id, validate_price, validate_product_name};
use crate::DEFAULT_CANONICAL_SUBSET;

// =============================================================================
// Denomination Catalog
// =============================================================================

/// The active set of denominations, in the owner's order.
///
/// ## Invariants
/// - Non-empty
/// - Every face value positive
/// - Face values unique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenominationCatalog {
    denominations: Vec<Denomination>,
}

impl DenominationCatalog {
    /// Validates and wraps a denomination list.
    pub fn new(denominations: Vec<Denomination>) -> CoreResult<Self> {
        if denominations.is_empty() {
            return Err(CoreError::InvalidCatalog {
                reason: "at least one denomination is required".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for denomination in &denominations {
            validate_face_value(denomination.value)?;
            if !seen.insert(denomination.value) {
                return Err(ValidationError::Duplicate {
                    field: "denomination value".to_string(),
                    value: denomination.value.to_string(),
                }
                .into());
            }
        }

        Ok(DenominationCatalog { denominations })
    }

    /// New Taiwan Dollar coins and notes.
    pub fn default_catalog() -> Self {
        DenominationCatalog {
            denominations: default_denominations(),
        }
    }

    /// Looks up a denomination by face value.
    pub fn find(&self, value: Money) -> Option<&Denomination> {
        self.denominations.iter().find(|d| d.value == value)
    }

    /// Looks up a denomination, failing with `UnknownDenomination`.
    pub fn require(&self, value: Money) -> CoreResult<&Denomination> {
        self.find(value)
            .ok_or(CoreError::UnknownDenomination { value })
    }

    /// All denominations sorted by value, largest first.
    pub fn descending(&self) -> Vec<&Denomination> {
        let mut sorted: Vec<&Denomination> = self.denominations.iter().collect();
        sorted.sort_by(|a, b| b.value.cmp(&a.value));
        sorted
    }

    /// Denominations in the owner's order.
    pub fn iter(&self) -> impl Iterator<Item = &Denomination> {
        self.denominations.iter()
    }

    pub fn len(&self) -> usize {
        self.denominations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.denominations.is_empty()
    }

    /// Smallest face value in the catalog.
    pub fn smallest(&self) -> Money {
        self.denominations
            .iter()
            .map(|d| d.value)
            .min()
            .unwrap_or_default()
    }
}

impl Default for DenominationCatalog {
    fn default() -> Self {
        DenominationCatalog::default_catalog()
    }
}

/// The default denomination list (1, 5, 10, 50 coins; 100, 500, 1000 notes).
pub fn default_denominations() -> Vec<Denomination> {
    vec![
        Denomination::new(1, DenominationKind::Coin).with_color("銅黃色"),
        Denomination::new(5, DenominationKind::Coin).with_color("銀色"),
        Denomination::new(10, DenominationKind::Coin).with_color("銀白色"),
        Denomination::new(50, DenominationKind::Coin).with_color("金色"),
        Denomination::new(100, DenominationKind::Note).with_color("紅色紙鈔"),
        Denomination::new(500, DenominationKind::Note).with_color("咖啡色紙鈔"),
        Denomination::new(1000, DenominationKind::Note).with_color("藍色紙鈔"),
    ]
}

// =============================================================================
// Canonical Subset
// =============================================================================

/// The small, always-present set of values used to rebuild a price.
///
/// Validated against the catalog at construction: a missing value is a
/// configuration error, never a silently short breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSubset {
    /// Resolved catalog entries, largest value first.
    denominations: Vec<Denomination>,
}

impl CanonicalSubset {
    /// Resolves `values` against the catalog.
    ///
    /// ## Errors
    /// - `InvalidCatalog` if `values` is empty or repeats a value
    /// - `CanonicalValueUnavailable` if a value is not in the catalog
    pub fn new(values: &[Money], catalog: &DenominationCatalog) -> CoreResult<Self> {
        if values.is_empty() {
            return Err(CoreError::InvalidCatalog {
                reason: "canonical subset must not be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut denominations = Vec::with_capacity(values.len());
        for &value in values {
            if !seen.insert(value) {
                return Err(CoreError::InvalidCatalog {
                    reason: format!("canonical value {} listed twice", value),
                });
            }
            let denomination = catalog
                .find(value)
                .ok_or(CoreError::CanonicalValueUnavailable { value })?;
            denominations.push(denomination.clone());
        }

        denominations.sort_by(|a, b| b.value.cmp(&a.value));
        Ok(CanonicalSubset { denominations })
    }

    /// The default subset (50, 10, 5, 1) resolved against `catalog`.
    pub fn default_for(catalog: &DenominationCatalog) -> CoreResult<Self> {
        let values: Vec<Money> = DEFAULT_CANONICAL_SUBSET
            .iter()
            .map(|&v| Money::from_units(v))
            .collect();
        CanonicalSubset::new(&values, catalog)
    }

    /// Entries, largest value first.
    pub fn descending(&self) -> Vec<&Denomination> {
        self.denominations.iter().collect()
    }

    /// Face values, largest first.
    pub fn values(&self) -> Vec<Money> {
        self.denominations.iter().map(|d| d.value).collect()
    }

    pub fn contains(&self, value: Money) -> bool {
        self.denominations.iter().any(|d| d.value == value)
    }
}

// =============================================================================
// Product Catalog
// =============================================================================

/// The product list the rounds draw from.
///
/// May be empty: an empty catalog simply makes every range fail with
/// `NoProductsInRange`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    /// Validates and wraps a product list.
    pub fn new(products: Vec<Product>) -> CoreResult<Self> {
        let mut ids = HashSet::new();
        for product in &products {
            validate_id("product id", &product.id)?;
            validate_product_name(&product.name)?;
            validate_price(product.price)?;
            if !ids.insert(product.id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "product id".to_string(),
                    value: product.id.clone(),
                }
                .into());
            }
        }
        Ok(ProductCatalog { products })
    }

    /// The five starter products.
    pub fn default_catalog() -> Self {
        ProductCatalog {
            products: default_products(),
        }
    }

    /// Products whose price lies in `range`, as a new list.
    pub fn pool(&self, range: &PriceRange) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| range.contains(p.price))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// The default product list.
pub fn default_products() -> Vec<Product> {
    vec![
        Product::new("p1", "漢堡", 45),
        Product::new("p2", "牛奶", 32),
        Product::new("p3", "玩具車", 120),
        Product::new("p4", "筆記本", 15),
        Product::new("p5", "彩色筆", 85),
    ]
}

// =============================================================================
// Unit Tests
// =============================================================================
