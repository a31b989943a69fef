//! # Shop Configuration
//!
//! Configuration for the shopping drill: game rules, timing, catalogs and
//! voice phrases.
//!
//! ## Configuration Sources (Priority Order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     COINWISE_CHANGE_MODE=on                                            │
//! │     COINWISE_RANGE=11-20                                               │
//! │     COINWISE_VOICE_FEEDBACK=off                                        │
//! │     COINWISE_FLIGHT_MS / COINWISE_PAUSE_MS                             │
//! │     COINWISE_COMPLETION_DELAY_MS                                       │
//! │                                                                         │
//! │  2. Config File (shop.toml)                                            │
//! │     Location: ~/.config/coinwise/shop.toml (Linux)                     │
//! │               ~/Library/Application Support/org.coinwise.shop (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     change_mode = false, range = "all", NT$ denominations              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example shop.toml
//! ```toml
//! [game]
//! change_mode = true
//! range = "11-20"
//!
//! [timing]
//! flight_ms = 600
//! pause_ms = 200
//!
//! [catalog]
//! canonical_subset = [50, 10, 5, 1]
//!
//! [[catalog.products]]
//! id = "p1"
//! name = "漢堡"
//! price = 45
//! ```
//!
//! A config whose canonical subset names a value missing from its own
//! denomination list is rejected at load time.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use coinwise_core::catalog::{
    default_denominations, default_products, CanonicalSubset, DenominationCatalog, ProductCatalog,
};
use coinwise_core::validation::validate_price_range;
use coinwise_core::voice::VoiceTemplates;
use coinwise_core::{Denomination, Money, PriceRange, Product, DEFAULT_CANONICAL_SUBSET};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ShopError, ShopResult};

// =============================================================================
// Game Settings
// =============================================================================

/// Rules the player sees on the setup screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    /// Overpaying starts change practice instead of being rejected.
    #[serde(default)]
    pub change_mode: bool,

    /// Speak the tray total whenever a piece lands.
    #[serde(default = "default_true")]
    pub voice_feedback: bool,

    /// Id of the price range preselected on the setup screen.
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_true() -> bool {
    true
}

fn default_range() -> String {
    "all".to_string()
}

impl Default for GameSettings {
    fn default() -> Self {
        GameSettings {
            change_mode: false,
            voice_feedback: true,
            range: default_range(),
        }
    }
}

// =============================================================================
// Timing Settings
// =============================================================================

/// Animation and delay timings.
///
/// ```text
/// per piece:  ├── flight_ms ──┤├ pause_ms ┤ append
/// round end:  Correct ├──── completion_delay_ms ────┤ next round
/// new round:  round shown ├ welcome_delay_ms ┤ welcome phrase
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    #[serde(default = "default_flight_ms")]
    pub flight_ms: u64,

    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,

    /// How long the success screen stays up before the next round.
    #[serde(default = "default_completion_delay_ms")]
    pub completion_delay_ms: u64,

    #[serde(default = "default_welcome_delay_ms")]
    pub welcome_delay_ms: u64,
}

fn default_flight_ms() -> u64 {
    600
}

fn default_pause_ms() -> u64 {
    200
}

fn default_completion_delay_ms() -> u64 {
    3000
}

fn default_welcome_delay_ms() -> u64 {
    500
}

impl Default for TimingSettings {
    fn default() -> Self {
        TimingSettings {
            flight_ms: default_flight_ms(),
            pause_ms: default_pause_ms(),
            completion_delay_ms: default_completion_delay_ms(),
            welcome_delay_ms: default_welcome_delay_ms(),
        }
    }
}

impl TimingSettings {
    pub fn flight(&self) -> Duration {
        Duration::from_millis(self.flight_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    pub fn welcome_delay(&self) -> Duration {
        Duration::from_millis(self.welcome_delay_ms)
    }
}

// =============================================================================
// Catalog Settings
// =============================================================================

/// Denominations, products and ranges. Read-only once the session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Values the price half of a breakdown is rebuilt from.
    #[serde(default = "default_canonical_subset")]
    pub canonical_subset: Vec<Money>,

    #[serde(default = "default_denominations")]
    pub denominations: Vec<Denomination>,

    #[serde(default = "default_products")]
    pub products: Vec<Product>,

    #[serde(default = "PriceRange::presets")]
    pub ranges: Vec<PriceRange>,
}

fn default_canonical_subset() -> Vec<Money> {
    DEFAULT_CANONICAL_SUBSET
        .iter()
        .map(|&v| Money::from_units(v))
        .collect()
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            canonical_subset: default_canonical_subset(),
            denominations: default_denominations(),
            products: default_products(),
            ranges: PriceRange::presets(),
        }
    }
}

/// The validated catalogs a session runs against.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub denominations: DenominationCatalog,
    pub canonical: CanonicalSubset,
    pub products: ProductCatalog,
    pub ranges: Vec<PriceRange>,
}

impl Catalogs {
    /// Looks up a range by id.
    pub fn range(&self, id: &str) -> ShopResult<&PriceRange> {
        self.ranges
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| ShopError::UnknownRange(id.to_string()))
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete shop configuration.
///
/// ## TOML Format
/// ```toml
/// [game]
/// change_mode = false
/// voice_feedback = true
/// range = "all"
///
/// [timing]
/// flight_ms = 600
/// pause_ms = 200
/// completion_delay_ms = 3000
/// welcome_delay_ms = 500
///
/// [voice]
/// shortage = "還差 {diff} 元"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default)]
    pub game: GameSettings,

    #[serde(default)]
    pub timing: TimingSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub voice: VoiceTemplates,
}

impl ShopConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (shop.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ShopResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading shop config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration, falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load shop config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "coinwise", "shop")
            .map(|dirs| dirs.config_dir().join("shop.toml"))
    }

    /// Validates the whole config, catalogs included.
    pub fn validate(&self) -> ShopResult<()> {
        let catalogs = self.catalogs()?;
        catalogs.range(&self.game.range)?;
        self.voice.validate()?;
        Ok(())
    }

    /// Builds the validated catalogs.
    ///
    /// ## Errors
    /// - `CanonicalValueUnavailable` if the subset names a missing value
    /// - `InvalidCatalog` / `Validation` for malformed entries
    /// - `InvalidConfig` for duplicate or inverted ranges
    pub fn catalogs(&self) -> ShopResult<Catalogs> {
        let denominations = DenominationCatalog::new(self.catalog.denominations.clone())?;
        let canonical = CanonicalSubset::new(&self.catalog.canonical_subset, &denominations)?;
        let products = ProductCatalog::new(self.catalog.products.clone())?;

        let mut ids = HashSet::new();
        for range in &self.catalog.ranges {
            validate_price_range(range)?;
            if !ids.insert(range.id.as_str()) {
                return Err(ShopError::InvalidConfig(format!(
                    "price range {} listed twice",
                    range.id
                )));
            }
        }

        Ok(Catalogs {
            denominations,
            canonical,
            products,
            ranges: self.catalog.ranges.clone(),
        })
    }

    /// Applies `COINWISE_*` environment overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("COINWISE_CHANGE_MODE") {
            match parse_switch(&value) {
                Some(on) => {
                    debug!(change_mode = on, "Overriding change mode from environment");
                    self.game.change_mode = on;
                }
                None => warn!(value = %value, "Unrecognised COINWISE_CHANGE_MODE"),
            }
        }

        if let Some(value) = lookup("COINWISE_VOICE_FEEDBACK") {
            match parse_switch(&value) {
                Some(on) => self.game.voice_feedback = on,
                None => warn!(value = %value, "Unrecognised COINWISE_VOICE_FEEDBACK"),
            }
        }

        if let Some(range) = lookup("COINWISE_RANGE") {
            debug!(range = %range, "Overriding price range from environment");
            self.game.range = range;
        }

        if let Some(ms) = lookup("COINWISE_FLIGHT_MS").and_then(|v| v.parse().ok()) {
            self.timing.flight_ms = ms;
        }

        if let Some(ms) = lookup("COINWISE_PAUSE_MS").and_then(|v| v.parse().ok()) {
            self.timing.pause_ms = ms;
        }

        if let Some(ms) = lookup("COINWISE_COMPLETION_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.timing.completion_delay_ms = ms;
        }
    }
}

/// Parses on/off style switches.
fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
