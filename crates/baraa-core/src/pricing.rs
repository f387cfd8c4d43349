//! # Price Calculator
//!
//! Turns a base price in won plus a shipping weight into the tögrög price a
//! customer pays.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  shipping (₩) = weight (kg) × rate[mode] (₩/kg)                         │
//! │  total    (₩) = base + shipping                                         │
//! │  final    (₮) = round(total × exchange rate)                            │
//! │                                                                         │
//! │  Breakdown with quantity q:                                             │
//! │  total weight = unit weight × q,   base = base × q                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fail-Soft Rules
//! - base price 0 (or not a number) → price 0, breakdown `None`
//! - missing rate table or mode → rate 0, so only shipping is lost
//! - unusable exchange rate → 0
//!
//! Nothing here returns an error. Checkout must never be blocked by a
//! pricing problem; it undercharges shipping instead.
//!
//! ## Example
//! ```rust
//! use baraa_core::pricing::{price_for_weight, PriceContext, ShippingMode, ShippingRateTable};
//!
//! let ctx = PriceContext::new(1000.0, 2.5)
//!     .with_rates(ShippingRateTable::new(100.0, 300.0))
//!     .with_mode(ShippingMode::Air);
//!
//! // (1000 + 1kg × 300) × 2.5
//! assert_eq!(price_for_weight(1.0, &ctx), 3250);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{format_amount, format_whole_amount, Currency};
use crate::types::ProductRecord;
use crate::validation::{
    validate_base_price, validate_exchange_rate, validate_quantity, validate_shipping_rate,
};
use crate::weight::WeightExtractor;
use crate::DEFAULT_EXCHANGE_RATE;

// =============================================================================
// Shipping Mode
// =============================================================================

/// How a parcel travels from Korea to Mongolia.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ShippingMode {
    #[default]
    Ground,
    Air,
}

impl ShippingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ShippingMode::Ground => "ground",
            ShippingMode::Air => "air",
        }
    }
}

impl fmt::Display for ShippingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ground" => Ok(ShippingMode::Ground),
            "air" => Ok(ShippingMode::Air),
            _ => Err(CoreError::InvalidShippingMode(s.to_string())),
        }
    }
}

// =============================================================================
// Rate Table
// =============================================================================

/// Shipping rates in won per kilogram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct ShippingRateTable {
    pub ground: f64,
    pub air: f64,
}

impl ShippingRateTable {
    pub const fn new(ground: f64, air: f64) -> Self {
        ShippingRateTable { ground, air }
    }

    /// The rate for `mode`; negative or non-finite rates read as 0.
    pub fn rate(&self, mode: ShippingMode) -> f64 {
        let rate = match mode {
            ShippingMode::Ground => self.ground,
            ShippingMode::Air => self.air,
        };
        if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            0.0
        }
    }
}

// =============================================================================
// Price Context
// =============================================================================

/// Everything besides the product that a price depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceContext {
    /// Base price in won.
    pub base_price: f64,
    /// Absent table means all rates are 0.
    pub rates: Option<ShippingRateTable>,
    /// Tögrög per won.
    pub exchange_rate: f64,
    pub shipping_mode: ShippingMode,
    /// Only used by the breakdown; clamped to at least 1.
    pub quantity: u32,
}

impl PriceContext {
    /// Creates a context with no rates, ground shipping and quantity 1.
    pub fn new(base_price: f64, exchange_rate: f64) -> Self {
        PriceContext {
            base_price,
            rates: None,
            exchange_rate,
            shipping_mode: ShippingMode::default(),
            quantity: 1,
        }
    }

    pub fn with_rates(mut self, rates: ShippingRateTable) -> Self {
        self.rates = Some(rates);
        self
    }

    pub fn with_mode(mut self, mode: ShippingMode) -> Self {
        self.shipping_mode = mode;
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Strict check for hosts that want to refuse bad input up front.
    ///
    /// The price functions never call this; they degrade instead.
    pub fn validate(&self) -> CoreResult<()> {
        validate_base_price(self.base_price)?;
        validate_exchange_rate(self.exchange_rate)?;
        validate_quantity(self.quantity)?;
        if let Some(rates) = &self.rates {
            validate_shipping_rate("rates.ground", rates.ground)?;
            validate_shipping_rate("rates.air", rates.air)?;
        }
        Ok(())
    }

    /// Checks if the base price is a usable positive number.
    pub fn has_price(&self) -> bool {
        self.base_price.is_finite() && self.base_price > 0.0
    }

    /// The rate for the selected mode.
    pub fn rate_per_kg(&self) -> f64 {
        self.rates
            .map_or(0.0, |rates| rates.rate(self.shipping_mode))
    }

    fn effective_exchange_rate(&self) -> f64 {
        if self.exchange_rate.is_finite() && self.exchange_rate > 0.0 {
            self.exchange_rate
        } else {
            0.0
        }
    }

    fn effective_quantity(&self) -> u32 {
        self.quantity.max(1)
    }
}

// =============================================================================
// Breakdown
// =============================================================================

/// Every intermediate number of a price, with display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceBreakdown {
    pub unit_weight_kg: f64,
    pub total_weight_kg: f64,
    pub quantity: u32,
    /// Won per kilogram.
    pub rate_per_kg: f64,
    /// Won.
    pub shipping_cost: f64,
    /// Won, base price × quantity.
    pub base_cost: f64,
    /// Won.
    pub total_cost: f64,
    /// Tögrög.
    pub final_price: i64,

    pub weight_display: String,
    pub rate_display: String,
    pub shipping_display: String,
    pub base_display: String,
    pub total_display: String,
    pub final_display: String,
}

// =============================================================================
// Contracts
// =============================================================================

/// Final tögrög price for a product (Contract A).
pub fn calculate_final_price(product: &ProductRecord, ctx: &PriceContext) -> i64 {
    calculate_final_price_with(WeightExtractor::bundled(), product, ctx)
}

/// Contract A with a caller-supplied extractor.
pub fn calculate_final_price_with(
    extractor: &WeightExtractor,
    product: &ProductRecord,
    ctx: &PriceContext,
) -> i64 {
    if !ctx.has_price() {
        return 0;
    }
    price_for_weight(extractor.estimate(product).kilograms, ctx)
}

/// Final tögrög price for a known unit weight. Ignores quantity.
pub fn price_for_weight(weight_kg: f64, ctx: &PriceContext) -> i64 {
    if !ctx.has_price() {
        return 0;
    }
    let shipping = sanitize_weight(weight_kg) * ctx.rate_per_kg();
    to_final_price(ctx.base_price + shipping, ctx)
}

/// Full price breakdown for a product (Contract B).
pub fn get_price_breakdown(product: &ProductRecord, ctx: &PriceContext) -> Option<PriceBreakdown> {
    get_price_breakdown_with(WeightExtractor::bundled(), product, ctx)
}

/// Contract B with a caller-supplied extractor.
pub fn get_price_breakdown_with(
    extractor: &WeightExtractor,
    product: &ProductRecord,
    ctx: &PriceContext,
) -> Option<PriceBreakdown> {
    if !ctx.has_price() {
        return None;
    }
    breakdown_for_weight(extractor.estimate(product).kilograms, ctx)
}

/// Price breakdown for a known unit weight.
pub fn breakdown_for_weight(unit_weight_kg: f64, ctx: &PriceContext) -> Option<PriceBreakdown> {
    if !ctx.has_price() {
        return None;
    }

    let unit_weight_kg = sanitize_weight(unit_weight_kg);
    let quantity = ctx.effective_quantity();
    let total_weight_kg = unit_weight_kg * f64::from(quantity);
    let rate_per_kg = ctx.rate_per_kg();
    let shipping_cost = total_weight_kg * rate_per_kg;
    let base_cost = ctx.base_price * f64::from(quantity);
    let total_cost = base_cost + shipping_cost;
    let final_price = to_final_price(total_cost, ctx);

    debug!(
        mode = %ctx.shipping_mode,
        total_weight_kg,
        total_cost,
        final_price,
        "price breakdown computed"
    );

    Some(PriceBreakdown {
        unit_weight_kg,
        total_weight_kg,
        quantity,
        rate_per_kg,
        shipping_cost,
        base_cost,
        total_cost,
        final_price,
        weight_display: format!("{total_weight_kg:.1}kg"),
        rate_display: format_amount(rate_per_kg, Currency::Krw),
        shipping_display: format_amount(shipping_cost, Currency::Krw),
        base_display: format_amount(base_cost, Currency::Krw),
        total_display: format_amount(total_cost, Currency::Krw),
        final_display: format_whole_amount(final_price, Currency::Mnt),
    })
}

fn to_final_price(total_won: f64, ctx: &PriceContext) -> i64 {
    (total_won * ctx.effective_exchange_rate()).round() as i64
}

fn sanitize_weight(weight_kg: f64) -> f64 {
    if weight_kg.is_finite() && weight_kg > 0.0 {
        weight_kg
    } else {
        0.0
    }
}

// =============================================================================
// Catalog Prices (no shipping)
// =============================================================================

/// Converts a won price to tögrög without shipping.
///
/// Falls back to `DEFAULT_EXCHANGE_RATE` when the rate is unusable.
pub fn convert_price(price_won: f64, exchange_rate: f64) -> i64 {
    if !(price_won.is_finite() && price_won > 0.0) {
        return 0;
    }
    let rate = if exchange_rate.is_finite() && exchange_rate > 0.0 {
        exchange_rate
    } else {
        DEFAULT_EXCHANGE_RATE
    };
    (price_won * rate).round() as i64
}

/// Formats a tögrög price for a product card; non-positive prices show "0₮".
pub fn format_price(price: i64) -> String {
    format_whole_amount(price.max(0), Currency::Mnt)
}

/// A catalog card price with its strike-through original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogPrice {
    pub price: i64,
    pub original_price: i64,
    /// Whole percent off, 0 without a discount.
    pub discount_percent: u32,
    pub formatted: String,
    /// Empty without a discount.
    pub original_formatted: String,
}

impl CatalogPrice {
    pub fn has_discount(&self) -> bool {
        self.original_price > self.price
    }
}

/// Converts a sale price and an optional original price for display.
pub fn catalog_price(price_won: f64, original_won: Option<f64>, exchange_rate: f64) -> CatalogPrice {
    let price = convert_price(price_won, exchange_rate);
    let original_price = original_won
        .filter(|won| *won > 0.0)
        .map_or(price, |won| convert_price(won, exchange_rate));

    let (discount_percent, original_formatted) = if original_price > price {
        let off = (1.0 - price as f64 / original_price as f64) * 100.0;
        (off.round() as u32, format_price(original_price))
    } else {
        (0, String::new())
    };

    CatalogPrice {
        price,
        original_price,
        discount_percent,
        formatted: format_price(price),
        original_formatted,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::types::ExplicitWeight;

    fn one_kilogram_product() -> ProductRecord {
        ProductRecord::titled("Rice 1kg")
    }

    fn rates() -> ShippingRateTable {
        ShippingRateTable::new(100.0, 300.0)
    }

    #[test]
    fn test_zero_price_short_circuits() {
        let ctx = PriceContext::new(0.0, 2.5).with_rates(rates());
        assert_eq!(calculate_final_price(&one_kilogram_product(), &ctx), 0);
        assert!(get_price_breakdown(&one_kilogram_product(), &ctx).is_none());

        let ctx = PriceContext::new(f64::NAN, 2.5).with_rates(rates());
        assert_eq!(calculate_final_price(&one_kilogram_product(), &ctx), 0);
    }

    #[test]
    fn test_final_price_formula() {
        let ctx = PriceContext::new(1000.0, 2.5).with_rates(rates());
        // (1000 + 1 × 100) × 2.5
        assert_eq!(calculate_final_price(&one_kilogram_product(), &ctx), 2750);
    }

    #[test]
    fn test_breakdown_scales_by_quantity() {
        let ctx = PriceContext::new(1000.0, 2.5)
            .with_rates(ShippingRateTable::new(100.0, 0.0))
            .with_quantity(3);
        let breakdown = get_price_breakdown(&one_kilogram_product(), &ctx).unwrap();

        assert_eq!(breakdown.unit_weight_kg, 1.0);
        assert_eq!(breakdown.total_weight_kg, 3.0);
        assert_eq!(breakdown.shipping_cost, 300.0);
        assert_eq!(breakdown.base_cost, 3000.0);
        assert_eq!(breakdown.total_cost, 3300.0);
        assert_eq!(breakdown.final_price, 8250);

        assert_eq!(breakdown.weight_display, "3.0kg");
        assert_eq!(breakdown.rate_display, "100₩");
        assert_eq!(breakdown.shipping_display, "300₩");
        assert_eq!(breakdown.base_display, "3,000₩");
        assert_eq!(breakdown.total_display, "3,300₩");
        assert_eq!(breakdown.final_display, "8,250₮");
    }

    #[test]
    fn test_mode_sensitivity() {
        let product = ProductRecord::titled("Rice 2kg");
        let ground = PriceContext::new(1000.0, 2.0).with_rates(rates());
        let air = ground.clone().with_mode(ShippingMode::Air);

        let ground_price = calculate_final_price(&product, &ground);
        let air_price = calculate_final_price(&product, &air);
        // 2kg × (300 - 100) ₩ × 2.0
        assert_eq!(air_price - ground_price, 800);
    }

    #[test]
    fn test_unknown_weight_degrades_to_base_price() {
        let product = ProductRecord::titled("Gift card");
        let ctx = PriceContext::new(1000.0, 2.5).with_rates(rates());
        assert_eq!(calculate_final_price(&product, &ctx), 2500);
    }

    #[test]
    fn test_missing_rates_and_bad_exchange_rate() {
        let product = one_kilogram_product();
        assert_eq!(calculate_final_price(&product, &PriceContext::new(1000.0, 2.5)), 2500);
        assert_eq!(calculate_final_price(&product, &PriceContext::new(1000.0, 0.0)), 0);
        assert_eq!(calculate_final_price(&product, &PriceContext::new(1000.0, -3.0)), 0);
    }

    #[test]
    fn test_rate_sanitising() {
        let table = ShippingRateTable::new(-5.0, f64::INFINITY);
        assert_eq!(table.rate(ShippingMode::Ground), 0.0);
        assert_eq!(table.rate(ShippingMode::Air), 0.0);
    }

    #[test]
    fn test_shipping_uses_displayed_grams() {
        // "600g = 600g" ships as 0.6kg, not 600kg
        let product = ProductRecord::titled("Towel 600g");
        let ctx = PriceContext::new(1000.0, 1.0).with_rates(rates());
        assert_eq!(calculate_final_price(&product, &ctx), 1060);
    }

    #[test]
    fn test_explicit_text_weight_is_priced() {
        let product = ProductRecord::default()
            .with_explicit_weight(ExplicitWeight::Text("0.6kg x 24 = 14.4kg".to_string()));
        let ctx = PriceContext::new(10000.0, 1.0).with_rates(rates());
        assert_eq!(calculate_final_price(&product, &ctx), 11440);
    }

    #[test]
    fn test_final_price_rounds_half_up() {
        let ctx = PriceContext::new(1.0, 2.5);
        assert_eq!(price_for_weight(0.0, &ctx), 3);
    }

    #[test]
    fn test_zero_quantity_counts_as_one() {
        let ctx = PriceContext::new(1000.0, 1.0).with_quantity(0);
        assert_eq!(breakdown_for_weight(1.0, &ctx).unwrap().quantity, 1);
    }

    #[test]
    fn test_is_pure() {
        let product = ProductRecord::titled("Cola 1.5L x 6");
        let ctx = PriceContext::new(12000.0, 2.55).with_rates(rates());
        assert_eq!(
            calculate_final_price(&product, &ctx),
            calculate_final_price(&product, &ctx)
        );
    }

    #[test]
    fn test_context_validation() {
        let ctx = PriceContext::new(15_900.0, 2.55).with_rates(rates()).with_quantity(3);
        assert!(ctx.validate().is_ok());

        assert!(matches!(
            PriceContext::new(-1.0, 2.55).validate(),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(PriceContext::new(1000.0, 0.0).validate().is_err());
        assert!(PriceContext::new(1000.0, 2.55).with_quantity(0).validate().is_err());
        assert!(PriceContext::new(1000.0, 2.55)
            .with_rates(ShippingRateTable::new(-5.0, 100.0))
            .validate()
            .is_err());
    }

    #[test]
    fn test_shipping_mode_parsing() {
        assert_eq!("AIR".parse::<ShippingMode>().unwrap(), ShippingMode::Air);
        assert_eq!(" ground ".parse::<ShippingMode>().unwrap(), ShippingMode::Ground);
        assert!(matches!(
            "sea".parse::<ShippingMode>(),
            Err(CoreError::InvalidShippingMode(_))
        ));
        assert_eq!(ShippingMode::default().to_string(), "ground");
    }

    #[test]
    fn test_convert_price_falls_back_to_default_rate() {
        assert_eq!(convert_price(1000.0, 3.0), 3000);
        assert_eq!(convert_price(1000.0, 0.0), 2550);
        assert_eq!(convert_price(0.0, 3.0), 0);
        assert_eq!(format_price(-5), "0₮");
    }

    #[test]
    fn test_catalog_price_discount() {
        let price = catalog_price(8000.0, Some(10000.0), 1.0);
        assert!(price.has_discount());
        assert_eq!(price.discount_percent, 20);
        assert_eq!(price.formatted, "8,000₮");
        assert_eq!(price.original_formatted, "10,000₮");

        let plain = catalog_price(8000.0, None, 1.0);
        assert!(!plain.has_discount());
        assert_eq!(plain.discount_percent, 0);
        assert!(plain.original_formatted.is_empty());
    }
}
