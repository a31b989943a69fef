//! # Domain Types
//!
//! Core domain types used throughout Coinwise.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  Denomination   │   │     Product     │   │   PriceRange    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  value          │   │  id             │   │  id ("11-20")   │       │
//! │  │  kind coin/note │   │  name           │   │  min / max      │       │
//! │  │  label          │   │  price          │   │  (inclusive)    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │     Round       │   │     Stage       │                              │
//! │  │  ─────────────  │   │  ─────────────  │                              │
//! │  │  id (UUID)      │   │  SETUP          │                              │
//! │  │  product        │   │  BUYING         │                              │
//! │  │  started_at     │   │  CHANGE_ACTION  │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Denominations and products are owned by the external catalogs. The core
//! only copies them into trays and breakdown lists, never edits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Denomination
// =============================================================================

/// Physical form of a denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DenominationKind {
    Coin,
    /// Paper money. Older catalogs call this "bill".
    #[serde(alias = "bill")]
    Note,
}

/// A single coin or note value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Denomination {
    /// Face value in whole units.
    pub value: Money,

    /// Coin or note.
    pub kind: DenominationKind,

    /// Label shown under the wallet piece ("50元").
    #[serde(default)]
    pub label: String,

    /// Colour hint read out to the learner ("金色").
    #[serde(default)]
    pub color_description: Option<String>,
}

impl Denomination {
    /// Creates a denomination with a label derived from its value.
    pub fn new(value: i64, kind: DenominationKind) -> Self {
        Denomination {
            value: Money::from_units(value),
            kind,
            label: format!("{}元", value),
            color_description: None,
        }
    }

    /// Builder-style colour description.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color_description = Some(color.into());
        self
    }

    /// Label to display, falling back to the bare value.
    pub fn display_label(&self) -> String {
        if self.label.trim().is_empty() {
            self.value.to_string()
        } else {
            self.label.clone()
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product the learner can buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Catalog identifier ("p1").
    pub id: String,

    /// Display and spoken name.
    pub name: String,

    /// Price in whole units. Always positive.
    pub price: Money,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: i64) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            price: Money::from_units(price),
        }
    }
}

// =============================================================================
// Price Range
// =============================================================================

/// A selectable price band for the setup screen. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceRange {
    pub id: String,
    pub label: String,
    pub min: Money,
    pub max: Money,
}

impl PriceRange {
    pub fn new(id: impl Into<String>, label: impl Into<String>, min: i64, max: i64) -> Self {
        PriceRange {
            id: id.into(),
            label: label.into(),
            min: Money::from_units(min),
            max: Money::from_units(max),
        }
    }

    /// Returns true if the price lies within the inclusive bounds.
    #[inline]
    pub fn contains(&self, price: Money) -> bool {
        price >= self.min && price <= self.max
    }

    /// The preset bands offered on the setup screen.
    ///
    /// Ten-unit bands up to 100, two wide bands for notes, and "all".
    /// Note that 100 and 500 each sit in two bands.
    pub fn presets() -> Vec<PriceRange> {
        let mut ranges: Vec<PriceRange> = (0..10)
            .map(|i| {
                let min = i * 10 + 1;
                let max = i * 10 + 10;
                PriceRange::new(
                    format!("{}-{}", min, max),
                    format!("{}-{}元", min, max),
                    min,
                    max,
                )
            })
            .collect();
        ranges.push(PriceRange::new("100-500", "100-500元", 100, 500));
        ranges.push(PriceRange::new("500-1000", "500-1000元", 500, 1000));
        ranges.push(PriceRange::new("all", "全部隨機", 0, 10_000));
        ranges
    }

    /// The catch-all band.
    pub fn all() -> PriceRange {
        PriceRange::new("all", "全部隨機", 0, 10_000)
    }
}

// =============================================================================
// Stage
// =============================================================================

/// Stage of the shopping state machine.
///
/// ```text
/// SETUP ──start──► BUYING ──pay (over, change mode)──► CHANGE_ACTION
///                    ▲  │                                    │
///                    │  └──pay (exact)──► next round ◄───────┘
///                    └───────────────────────┘      (paid so far == price)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Configuration only, no active round.
    #[default]
    Setup,
    /// Tray freely editable by the player.
    Buying,
    /// Player removes pieces until exactly the price has been taken.
    ChangeAction,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Setup => write!(f, "SETUP"),
            Stage::Buying => write!(f, "BUYING"),
            Stage::ChangeAction => write!(f, "CHANGE_ACTION"),
        }
    }
}

// =============================================================================
// Round
// =============================================================================

/// One "buy this product at this price" exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Round {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Snapshot of the product for this round.
    pub product: Product,

    /// When the round was generated.
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
}

impl Round {
    /// The target price of this round.
    #[inline]
    pub fn price(&self) -> Money {
        self.product.price
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
