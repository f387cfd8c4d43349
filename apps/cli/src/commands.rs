//! Command handlers. Each one returns the text to print so the handlers
//! stay testable without capturing stdout.

use std::path::Path;

use anyhow::{Context, Result};
use baraa_core::audit::{current_weight_kg, detect_weight_issue_with, needs_correction};
use baraa_core::estimation::{
    estimate_with_fallback, warehouse_price, EstimationRequest, WeightEstimator,
};
use baraa_core::pricing::{
    calculate_final_price_with, catalog_price, get_price_breakdown_with, ShippingMode,
};
use baraa_core::weight::{format_weight, parse_weight_with};
use baraa_core::{ProductRecord, WeightEstimate, WeightExtractor};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::BaraaConfig;

/// Output format selected by `--json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

// =============================================================================
// Input
// =============================================================================

/// Reads a product file holding one record or an array of records.
pub fn read_products(path: &Path) -> Result<Vec<ProductRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_products(&contents).with_context(|| format!("invalid product JSON in {}", path.display()))
}

pub fn parse_products(contents: &str) -> Result<Vec<ProductRecord>> {
    let value: Value = serde_json::from_str(contents)?;
    let products = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(products)
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn product_label(product: &ProductRecord) -> &str {
    product.id.as_deref().unwrap_or_else(|| product.primary_title())
}

// =============================================================================
// Commands
// =============================================================================

/// `baraa parse TEXT`
pub fn parse(config: &BaraaConfig, text: &str, output: Output) -> Result<String> {
    let parsed = parse_weight_with(text, &config.locale);
    match output {
        Output::Json => render(&parsed),
        Output::Text => Ok(match parsed {
            Some(parsed) => format!("{}\t{}", parsed.matched, parsed.display_total()),
            None => "no weight found".to_string(),
        }),
    }
}

/// `baraa weight FILE`
pub fn weight(config: &BaraaConfig, products: &[ProductRecord], output: Output) -> Result<String> {
    let extractor = config.extractor();
    let estimates: Vec<WeightEstimate> = products.iter().map(|p| extractor.estimate(p)).collect();

    match output {
        Output::Json => render(&estimates),
        Output::Text => Ok(products
            .iter()
            .zip(&estimates)
            .map(|(product, estimate)| {
                format!(
                    "{}\t{} {}\t{:?}",
                    product_label(product),
                    estimate.label,
                    estimate.provenance,
                    estimate.source
                )
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Options for `baraa price`.
#[derive(Debug, Clone, Copy)]
pub struct PriceOptions {
    pub base_price: f64,
    pub mode: Option<ShippingMode>,
    pub quantity: u32,
    pub breakdown: bool,
}

/// `baraa price FILE --base N`
pub fn price(
    config: &BaraaConfig,
    products: &[ProductRecord],
    options: PriceOptions,
    output: Output,
) -> Result<String> {
    let extractor = config.extractor();
    let ctx = config.price_context(options.base_price, options.mode, options.quantity);
    ctx.validate()?;

    if options.breakdown {
        let breakdowns: Vec<_> = products
            .iter()
            .map(|p| get_price_breakdown_with(&extractor, p, &ctx))
            .collect();
        return match output {
            Output::Json => render(&breakdowns),
            Output::Text => Ok(products
                .iter()
                .zip(&breakdowns)
                .map(|(product, breakdown)| match breakdown {
                    Some(b) => format!(
                        "{}\n  weight   {} x {} = {}\n  shipping {} = {}\n  base     {}\n  total    {}\n  final    {}",
                        product_label(product),
                        format_weight(b.unit_weight_kg),
                        b.quantity,
                        b.weight_display,
                        b.rate_display,
                        b.shipping_display,
                        b.base_display,
                        b.total_display,
                        b.final_display
                    ),
                    None => format!("{}\tno price", product_label(product)),
                })
                .collect::<Vec<_>>()
                .join("\n")),
        };
    }

    let prices: Vec<i64> = products
        .iter()
        .map(|p| calculate_final_price_with(&extractor, p, &ctx))
        .collect();
    match output {
        Output::Json => render(&prices),
        Output::Text => Ok(products
            .iter()
            .zip(&prices)
            .map(|(product, price)| format!("{}\t{}", product_label(product), price))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Options for `baraa catalog`.
#[derive(Debug, Clone, Copy)]
pub struct CatalogOptions {
    /// Online price in won.
    pub price_won: f64,
    pub original_won: Option<f64>,
    /// Remove the online shipping markup first.
    pub in_store: bool,
    /// Markup in won; the default markup when absent.
    pub markup: Option<f64>,
}

/// `baraa catalog --price N [--original N] [--in-store [--markup N]]`
pub fn catalog(config: &BaraaConfig, options: CatalogOptions, output: Output) -> Result<String> {
    let price_won = if options.in_store {
        warehouse_price(options.price_won, options.markup)
    } else {
        options.price_won
    };
    let price = catalog_price(price_won, options.original_won, config.pricing.exchange_rate);
    match output {
        Output::Json => render(&price),
        Output::Text if price.has_discount() => Ok(format!(
            "{} (was {}, -{}%)",
            price.formatted, price.original_formatted, price.discount_percent
        )),
        Output::Text => Ok(price.formatted),
    }
}

/// The weight the text alone supports, ignoring stored weights.
fn text_weight(extractor: &WeightExtractor, product: &ProductRecord) -> Option<f64> {
    let text_only = ProductRecord {
        explicit_weight: None,
        ai_estimated_weight: None,
        ..product.clone()
    };
    let estimate = extractor.estimate(&text_only);
    (estimate.kilograms > 0.0).then_some(estimate.kilograms)
}

/// `baraa audit FILE`: flags stored weights and proposes a text-derived
/// replacement when it differs enough to be worth writing back.
pub fn audit(config: &BaraaConfig, products: &[ProductRecord], output: Output) -> Result<String> {
    let extractor = config.extractor();
    let rows: Vec<Value> = products
        .iter()
        .map(|product| {
            let current = current_weight_kg(product);
            let issue = detect_weight_issue_with(product, current, &config.locale);
            let proposed = issue
                .and_then(|_| text_weight(&extractor, product))
                .filter(|kg| needs_correction(current, *kg, issue));
            json!({
                "product": product_label(product),
                "currentWeightKg": current,
                "issue": issue,
                "proposedWeightKg": proposed,
            })
        })
        .collect();

    let flagged = rows.iter().filter(|row| !row["issue"].is_null()).count();
    info!(checked = rows.len(), flagged, "audit finished");

    match output {
        Output::Json => render(&rows),
        Output::Text => Ok(rows
            .iter()
            .map(|row| {
                let line = format!(
                    "{}\t{}kg\t{}",
                    row["product"].as_str().unwrap_or_default(),
                    row["currentWeightKg"],
                    row["issue"].as_str().unwrap_or("ok")
                );
                match row["proposedWeightKg"].as_f64() {
                    Some(kg) => format!("{line}\t-> {}", format_weight(kg)),
                    None => line,
                }
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// `baraa estimate FILE`: the deterministic chain, then the collaborator.
pub fn estimate(
    config: &BaraaConfig,
    estimator: &dyn WeightEstimator,
    products: &[ProductRecord],
    output: Output,
) -> Result<String> {
    let extractor = config.extractor();
    let estimates: Vec<WeightEstimate> = products
        .iter()
        .map(|p| estimate_with_fallback(&extractor, estimator, p))
        .collect();

    match output {
        Output::Json => render(&estimates),
        Output::Text => Ok(products
            .iter()
            .zip(&estimates)
            .map(|(product, estimate)| {
                format!("{}\t{}\t{:?}", product_label(product), estimate.provenance, estimate.source)
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// `baraa estimate FILE --dry-run`: the requests that would be sent.
pub fn estimation_requests(config: &BaraaConfig, products: &[ProductRecord], output: Output) -> Result<String> {
    let extractor = config.extractor();
    let requests: Vec<EstimationRequest> = products
        .iter()
        .filter(|p| extractor.estimate(p).is_unknown())
        .map(EstimationRequest::for_product)
        .collect();

    match output {
        Output::Json => render(&requests),
        Output::Text => Ok(requests
            .iter()
            .map(|request| request.context.trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n---\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baraa_core::estimation::{Confidence, EstimationResponse};
    use baraa_core::{EstimationError, ShippingRateTable, WeightSource};

    fn config() -> BaraaConfig {
        let mut config = BaraaConfig::default();
        config.pricing.exchange_rate = 2.5;
        config.pricing.rates = ShippingRateTable::new(1000.0, 4000.0);
        config
    }

    #[test]
    fn test_parse_products_single_and_array() {
        let single = parse_products(r#"{"id": "p-1", "titleCandidates": ["Cola 1.5L x 12"]}"#).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].id.as_deref(), Some("p-1"));

        let many = parse_products(r#"[{"titleCandidates": ["a"]}, {"explicitWeight": 2.5}]"#).unwrap();
        assert_eq!(many.len(), 2);

        assert!(parse_products("not json").is_err());
    }

    #[test]
    fn test_parse_command() {
        let out = parse(&config(), "Coffee Mix 500g x 6", Output::Text).unwrap();
        assert_eq!(out, "500g x 6\t3kg");

        assert_eq!(parse(&config(), "Umbrella", Output::Text).unwrap(), "no weight found");
        assert_eq!(parse(&config(), "Umbrella", Output::Json).unwrap(), "null");
    }

    #[test]
    fn test_weight_command() {
        let products = vec![ProductRecord::titled("Coffee Mix 500g x 6")];
        let out = weight(&config(), &products, Output::Text).unwrap();
        assert!(out.contains("500g x 6 = 3kg"));
        assert!(out.contains("Title"));

        let json: Value = serde_json::from_str(&weight(&config(), &products, Output::Json).unwrap()).unwrap();
        assert_eq!(json[0]["kilograms"], 3.0);
        assert_eq!(json[0]["source"], "title");
    }

    #[test]
    fn test_price_command() {
        let products = vec![ProductRecord::titled("Coffee Mix 500g x 6")];
        let options = PriceOptions {
            base_price: 10_000.0,
            mode: None,
            quantity: 1,
            breakdown: false,
        };
        assert!(price(&config(), &products, options, Output::Text).unwrap().ends_with("\t32500"));

        let air = PriceOptions {
            mode: Some(ShippingMode::Air),
            breakdown: true,
            quantity: 2,
            ..options
        };
        let json: Value = serde_json::from_str(&price(&config(), &products, air, Output::Json).unwrap()).unwrap();
        assert_eq!(json[0]["quantity"], 2);
        assert_eq!(json[0]["ratePerKg"], 4000.0);

        let text = price(&config(), &products, air, Output::Text).unwrap();
        assert!(text.contains("weight   3kg x 2 = 6.0kg"));
    }

    #[test]
    fn test_price_command_rejects_bad_input() {
        let products = vec![ProductRecord::titled("Coffee Mix 500g x 6")];
        let options = PriceOptions {
            base_price: 10_000.0,
            mode: None,
            quantity: 0,
            breakdown: false,
        };
        assert!(price(&config(), &products, options, Output::Text).is_err());

        let negative = PriceOptions {
            base_price: -1.0,
            quantity: 1,
            ..options
        };
        assert!(price(&config(), &products, negative, Output::Text).is_err());
    }

    fn catalog_options(price_won: f64, original_won: Option<f64>) -> CatalogOptions {
        CatalogOptions {
            price_won,
            original_won,
            in_store: false,
            markup: None,
        }
    }

    #[test]
    fn test_catalog_command() {
        let out = catalog(&config(), catalog_options(10_000.0, Some(20_000.0)), Output::Text).unwrap();
        assert!(out.contains("-50%"));
        let plain = catalog(&config(), catalog_options(10_000.0, None), Output::Text).unwrap();
        assert!(!plain.contains("was"));
    }

    #[test]
    fn test_catalog_in_store_removes_markup() {
        let online = CatalogOptions {
            in_store: true,
            ..catalog_options(12_000.0, None)
        };
        // (12,000 - 2,000) × 2.5
        assert_eq!(catalog(&config(), online, Output::Text).unwrap(), "25,000₮");

        let electronics = CatalogOptions {
            markup: Some(0.0),
            ..online
        };
        assert_eq!(catalog(&config(), electronics, Output::Text).unwrap(), "30,000₮");
    }

    #[test]
    fn test_audit_command() {
        let products = vec![ProductRecord::titled("Umbrella 50cm")
            .with_explicit_weight(baraa_core::ExplicitWeight::Kilograms(50.0))];
        let out = audit(&config(), &products, Output::Text).unwrap();
        assert!(out.ends_with("dimension_confusion"));
    }

    #[test]
    fn test_audit_proposes_text_weight() {
        let products = vec![ProductRecord::titled("Ramen 120g x 40EA")
            .with_explicit_weight(baraa_core::ExplicitWeight::Kilograms(0.12))];
        let json: Value = serde_json::from_str(&audit(&config(), &products, Output::Json).unwrap()).unwrap();
        assert_eq!(json[0]["issue"], "multipack_underestimated");
        assert_eq!(json[0]["proposedWeightKg"], 4.8);

        let out = audit(&config(), &products, Output::Text).unwrap();
        assert!(out.ends_with("-> 4.8kg"));

        let fine = vec![ProductRecord::titled("Rice 10kg")
            .with_explicit_weight(baraa_core::ExplicitWeight::Kilograms(10.0))];
        let json: Value = serde_json::from_str(&audit(&config(), &fine, Output::Json).unwrap()).unwrap();
        assert!(json[0]["issue"].is_null());
        assert!(json[0]["proposedWeightKg"].is_null());
    }

    #[test]
    fn test_estimate_command_uses_collaborator_on_miss() {
        let estimator = |_: &EstimationRequest| -> Result<EstimationResponse, EstimationError> {
            Ok(EstimationResponse {
                weight_kilograms: 2.04,
                confidence: Confidence::High,
                reason: "340g x 6".to_string(),
                is_multipack: true,
                estimated_markup: None,
            })
        };
        let products = vec![ProductRecord::titled("Mixed nuts gift box")];
        let json: Value =
            serde_json::from_str(&estimate(&config(), &estimator, &products, Output::Json).unwrap()).unwrap();
        assert_eq!(json[0]["kilograms"], 2.0);
        assert_eq!(json[0]["provenance"], "2kg");
        assert_eq!(json[0]["source"], serde_json::to_value(WeightSource::AiEstimate).unwrap());
    }

    #[test]
    fn test_dry_run_lists_only_misses() {
        let products = vec![
            ProductRecord::titled("Coffee Mix 500g x 6"),
            ProductRecord::titled("Mixed nuts gift box"),
        ];
        let out = estimation_requests(&config(), &products, Output::Text).unwrap();
        assert!(out.contains("Name: Mixed nuts gift box"));
        assert!(!out.contains("Coffee"));
    }
}
