//! # CLI Configuration
//!
//! Pricing and estimation settings for the `baraa` binary.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BARAA_EXCHANGE_RATE=2.55                                           │
//! │     BARAA_GROUND_RATE=3000   BARAA_AIR_RATE=9000                       │
//! │     BARAA_SHIPPING_MODE=air                                            │
//! │     BARAA_GEMINI_API_KEY / GEMINI_API_KEY                              │
//! │     BARAA_ESTIMATOR_MODEL                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config PATH, or                                                  │
//! │     ~/.config/baraa/pricing.toml (Linux)                               │
//! │     ~/Library/Application Support/mn.baraa.baraa/pricing.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     exchange rate 2.55, no shipping rates, ground                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! [pricing]
//! exchange_rate = 2.55
//! shipping_mode = "ground"   # ground | air
//!
//! [pricing.rates]
//! ground = 3000.0            # won per kg
//! air = 9000.0
//!
//! [estimation]
//! model = "gemini-3-flash-preview"
//! fallback_model = "gemini-1.5-flash"
//! timeout_secs = 30
//! min_kg = 0.01
//! max_kg = 500.0
//!
//! [locale]
//! weight_label = "Жин:"      # any locale table may be replaced
//! ```

use std::path::{Path, PathBuf};

use baraa_core::pricing::{PriceContext, ShippingMode, ShippingRateTable};
use baraa_core::validation::{
    validate_exchange_rate, validate_plausibility_window, validate_required, validate_shipping_rate,
};
use baraa_core::{Locale, PlausibilityWindow, ValidationError, WeightExtractor, DEFAULT_EXCHANGE_RATE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

// =============================================================================
// Config Error
// =============================================================================

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Pricing Settings
// =============================================================================

/// Exchange rate, default shipping mode and per-kilogram rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Tögrög per won.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,

    #[serde(default)]
    pub shipping_mode: ShippingMode,

    /// Won per kilogram, per mode.
    #[serde(default)]
    pub rates: ShippingRateTable,
}

fn default_exchange_rate() -> f64 {
    DEFAULT_EXCHANGE_RATE
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            exchange_rate: default_exchange_rate(),
            shipping_mode: ShippingMode::default(),
            rates: ShippingRateTable::default(),
        }
    }
}

// =============================================================================
// Estimation Settings
// =============================================================================

/// Settings for the HTTP weight estimation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationSettings {
    /// API key; usually supplied through the environment instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Tried when the primary model fails.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: Option<String>,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Plausibility window for every inferred weight (exclusive, kg).
    #[serde(default = "default_min_kg")]
    pub min_kg: f64,

    #[serde(default = "default_max_kg")]
    pub max_kg: f64,
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_fallback_model() -> Option<String> {
    Some("gemini-1.5-flash".to_string())
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_min_kg() -> f64 {
    PlausibilityWindow::default().min_kg
}

fn default_max_kg() -> f64 {
    PlausibilityWindow::default().max_kg
}

impl Default for EstimationSettings {
    fn default() -> Self {
        EstimationSettings {
            api_key: None,
            model: default_model(),
            fallback_model: default_fallback_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
            min_kg: default_min_kg(),
            max_kg: default_max_kg(),
        }
    }
}

impl EstimationSettings {
    pub fn window(&self) -> PlausibilityWindow {
        PlausibilityWindow::new(self.min_kg, self.max_kg)
    }

    /// Primary model first, then the fallback if it differs.
    pub fn models(&self) -> Vec<String> {
        let mut models = vec![self.model.clone()];
        if let Some(fallback) = &self.fallback_model {
            if !fallback.trim().is_empty() && *fallback != self.model {
                models.push(fallback.clone());
            }
        }
        models
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaraaConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub estimation: EstimationSettings,

    /// Locale table overrides; omitted lists keep the bundled values.
    #[serde(default, skip_serializing)]
    pub locale: Locale,
}

impl BaraaConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pricing.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading pricing config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_exchange_rate(self.pricing.exchange_rate)?;
        validate_shipping_rate("rates.ground", self.pricing.rates.ground)?;
        validate_shipping_rate("rates.air", self.pricing.rates.air)?;
        validate_plausibility_window(&self.estimation.window())?;
        validate_required("estimation.model", &self.estimation.model)?;

        if self.estimation.timeout_secs == 0 {
            return Err(ValidationError::MustBePositive {
                field: "estimation.timeout_secs".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Applies `BARAA_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup; unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(rate) = lookup("BARAA_EXCHANGE_RATE") {
            match rate.parse::<f64>() {
                Ok(parsed) => {
                    debug!(exchange_rate = parsed, "Overriding exchange rate from environment");
                    self.pricing.exchange_rate = parsed;
                }
                Err(_) => warn!(value = %rate, "Ignoring invalid BARAA_EXCHANGE_RATE"),
            }
        }

        if let Some(rate) = lookup("BARAA_GROUND_RATE") {
            match rate.parse::<f64>() {
                Ok(parsed) => self.pricing.rates.ground = parsed,
                Err(_) => warn!(value = %rate, "Ignoring invalid BARAA_GROUND_RATE"),
            }
        }

        if let Some(rate) = lookup("BARAA_AIR_RATE") {
            match rate.parse::<f64>() {
                Ok(parsed) => self.pricing.rates.air = parsed,
                Err(_) => warn!(value = %rate, "Ignoring invalid BARAA_AIR_RATE"),
            }
        }

        if let Some(mode) = lookup("BARAA_SHIPPING_MODE") {
            match mode.parse::<ShippingMode>() {
                Ok(parsed) => {
                    debug!(mode = %parsed, "Overriding shipping mode from environment");
                    self.pricing.shipping_mode = parsed;
                }
                Err(err) => warn!(error = %err, "Ignoring BARAA_SHIPPING_MODE"),
            }
        }

        if let Some(key) = lookup("BARAA_GEMINI_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            self.estimation.api_key = Some(key);
        }

        if let Some(model) = lookup("BARAA_ESTIMATOR_MODEL") {
            self.estimation.model = model;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("mn", "baraa", "baraa")
            .map(|dirs| dirs.config_dir().join("pricing.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// A weight extractor using the configured locale and window.
    pub fn extractor(&self) -> WeightExtractor {
        WeightExtractor::new(self.locale.clone(), self.estimation.window())
    }

    /// A price context for `base_price`; `mode` overrides the configured mode.
    pub fn price_context(&self, base_price: f64, mode: Option<ShippingMode>, quantity: u32) -> PriceContext {
        PriceContext::new(base_price, self.pricing.exchange_rate)
            .with_rates(self.pricing.rates)
            .with_mode(mode.unwrap_or(self.pricing.shipping_mode))
            .with_quantity(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BaraaConfig::default();
        assert_eq!(config.pricing.exchange_rate, 2.55);
        assert_eq!(config.pricing.shipping_mode, ShippingMode::Ground);
        assert_eq!(config.pricing.rates, ShippingRateTable::default());
        assert_eq!(config.estimation.window(), PlausibilityWindow::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_file() {
        let config = BaraaConfig::from_toml_str(
            r#"
            [pricing]
            exchange_rate = 2.4
            shipping_mode = "air"

            [pricing.rates]
            ground = 3000.0
            air = 9000.0

            [estimation]
            model = "gemini-1.5-pro"
            max_kg = 100.0

            [locale]
            weight_label = "Weight:"
            "#,
        )
        .unwrap();

        assert_eq!(config.pricing.exchange_rate, 2.4);
        assert_eq!(config.pricing.shipping_mode, ShippingMode::Air);
        assert_eq!(config.pricing.rates.air, 9000.0);
        assert_eq!(config.estimation.model, "gemini-1.5-pro");
        assert_eq!(config.estimation.min_kg, 0.01);
        assert_eq!(config.estimation.max_kg, 100.0);
        assert_eq!(config.locale.weight_label, "Weight:");
        assert_eq!(config.locale.ask_support, Locale::default().ask_support);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = BaraaConfig::from_toml_str("[pricing\nexchange_rate = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BaraaConfig::default();
        config.apply_overrides(lookup(&[
            ("BARAA_EXCHANGE_RATE", "2.7"),
            ("BARAA_GROUND_RATE", "3500"),
            ("BARAA_SHIPPING_MODE", "AIR"),
            ("GEMINI_API_KEY", "secret"),
            ("BARAA_ESTIMATOR_MODEL", "gemini-2.0-flash"),
        ]));

        assert_eq!(config.pricing.exchange_rate, 2.7);
        assert_eq!(config.pricing.rates.ground, 3500.0);
        assert_eq!(config.pricing.shipping_mode, ShippingMode::Air);
        assert_eq!(config.estimation.api_key.as_deref(), Some("secret"));
        assert_eq!(config.estimation.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = BaraaConfig::default();
        config.apply_overrides(lookup(&[
            ("BARAA_EXCHANGE_RATE", "lots"),
            ("BARAA_SHIPPING_MODE", "sea"),
        ]));
        assert_eq!(config.pricing.exchange_rate, 2.55);
        assert_eq!(config.pricing.shipping_mode, ShippingMode::Ground);
    }

    #[test]
    fn test_prefixed_api_key_wins() {
        let mut config = BaraaConfig::default();
        config.apply_overrides(lookup(&[
            ("BARAA_GEMINI_API_KEY", "baraa"),
            ("GEMINI_API_KEY", "generic"),
        ]));
        assert_eq!(config.estimation.api_key.as_deref(), Some("baraa"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = BaraaConfig::default();
        config.pricing.exchange_rate = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = BaraaConfig::default();
        config.pricing.rates.air = -1.0;
        assert!(config.validate().is_err());

        let mut config = BaraaConfig::default();
        config.estimation.min_kg = 600.0;
        assert!(config.validate().is_err());

        let mut config = BaraaConfig::default();
        config.estimation.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_models_skip_duplicate_fallback() {
        let mut settings = EstimationSettings::default();
        assert_eq!(settings.models(), vec!["gemini-3-flash-preview", "gemini-1.5-flash"]);

        settings.fallback_model = Some(settings.model.clone());
        assert_eq!(settings.models().len(), 1);
    }

    #[test]
    fn test_price_context_uses_configured_mode() {
        let mut config = BaraaConfig::default();
        config.pricing.shipping_mode = ShippingMode::Air;

        assert_eq!(config.price_context(1000.0, None, 1).shipping_mode, ShippingMode::Air);
        let ctx = config.price_context(1000.0, Some(ShippingMode::Ground), 2);
        assert_eq!(ctx.shipping_mode, ShippingMode::Ground);
        assert_eq!(ctx.quantity, 2);
        assert_eq!(ctx.exchange_rate, 2.55);
    }

    #[test]
    fn test_toml_serialization() {
        let config = BaraaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[pricing]"));
        assert!(toml_str.contains("[estimation]"));
        assert!(!toml_str.contains("api_key"));
    }
}
