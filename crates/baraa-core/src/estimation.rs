//! # Estimation Contract
//!
//! The boundary to the external weight estimation collaborator, an
//! LLM-backed service consulted only when the deterministic chain finds
//! nothing.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  estimate_with_fallback(extractor, estimator, product)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  extractor.estimate(product) ── known weight ──────────► return it      │
//! │       │ unknown                                                         │
//! │       ▼                                                                 │
//! │  build_estimation_context(product) ──► EstimationRequest                │
//! │       │                                                                 │
//! │       ▼  WeightEstimator::estimate   (transport chosen by the host)     │
//! │  EstimationResponse { weightKg, confidence, reason }                    │
//! │       │                                                                 │
//! │       ▼  accept_estimate: > 0, not "low", inside the window             │
//! │  "1.2kg" (AiEstimate)   or   ask-support sentinel                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This module performs no I/O. The host implements [`WeightEstimator`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EstimationError;
use crate::types::{PlausibilityWindow, ProductRecord, WeightEstimate};
use crate::weight::WeightExtractor;
use crate::DEFAULT_WAREHOUSE_MARKUP;

/// Descriptions are cut to this many characters in the context.
const DESCRIPTION_MAX_CHARS: usize = 500;

// =============================================================================
// Request / Response
// =============================================================================

/// What the collaborator is asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationRequest {
    pub product_id: Option<String>,
    /// Plain-text product description, see [`build_estimation_context`].
    pub context: String,
}

impl EstimationRequest {
    pub fn for_product(product: &ProductRecord) -> Self {
        EstimationRequest {
            product_id: product.id.clone(),
            context: build_estimation_context(product),
        }
    }
}

/// How sure the collaborator is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

/// The collaborator's answer.
///
/// Field names follow the collaborator's JSON; both historical spellings
/// are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResponse {
    #[serde(rename = "weightKg", alias = "weightKilograms", default)]
    pub weight_kilograms: f64,

    #[serde(default)]
    pub confidence: Confidence,

    #[serde(alias = "calculation", default)]
    pub reason: String,

    #[serde(rename = "isMultipack", default)]
    pub is_multipack: bool,

    /// Shipping markup hidden in the online price, in won.
    #[serde(rename = "estimatedMarkupKrw", default, skip_serializing_if = "Option::is_none")]
    pub estimated_markup: Option<f64>,
}

// =============================================================================
// Collaborator Trait
// =============================================================================

/// A weight estimation collaborator.
///
/// Implemented by the host over whatever transport it chooses. Closures
/// implement it too, which keeps tests free of mocks.
pub trait WeightEstimator {
    fn estimate(&self, request: &EstimationRequest) -> Result<EstimationResponse, EstimationError>;
}

impl<F> WeightEstimator for F
where
    F: Fn(&EstimationRequest) -> Result<EstimationResponse, EstimationError>,
{
    fn estimate(&self, request: &EstimationRequest) -> Result<EstimationResponse, EstimationError> {
        self(request)
    }
}

// =============================================================================
// Context
// =============================================================================

/// Builds the plain-text context sent to the collaborator.
///
/// ```text
/// ID: p-1
/// Name: Кока кола 1.5л
/// Name: Coca-Cola 1.5L x 12
/// Brand: Coca-Cola
/// Specifications:
/// - Capacity: 1.5L x 12
/// Description: ...first 500 characters...
/// ```
pub fn build_estimation_context(product: &ProductRecord) -> String {
    let mut context = String::new();

    if let Some(id) = &product.id {
        context.push_str(&format!("ID: {id}\n"));
    }
    for title in product.title_candidates.iter().filter(|t| !t.trim().is_empty()) {
        context.push_str(&format!("Name: {title}\n"));
    }
    context.push_str(&format!("Brand: {}\n", product.brand.as_deref().unwrap_or_default()));

    if !product.specification_entries.is_empty() {
        context.push_str("Specifications:\n");
        for entry in &product.specification_entries {
            context.push_str(&format!("- {}: {}\n", entry.name, entry.value));
        }
    }

    for description in product.descriptions.iter().filter(|d| !d.trim().is_empty()) {
        let cut: String = description.chars().take(DESCRIPTION_MAX_CHARS).collect();
        context.push_str(&format!("Description: {cut}\n"));
    }

    context
}

// =============================================================================
// Response Handling
// =============================================================================

/// Parses collaborator output, tolerating Markdown code fences.
pub fn parse_estimation_response(text: &str) -> Result<EstimationResponse, EstimationError> {
    if let Ok(response) = serde_json::from_str(text.trim()) {
        return Ok(response);
    }
    let unfenced = text.replace("```json", "").replace("```", "");
    Ok(serde_json::from_str(unfenced.trim())?)
}

/// Returns the accepted weight, rounded to 0.01kg, or `None` when the answer
/// is non-positive, low-confidence or implausible.
pub fn accept_estimate(response: &EstimationResponse, window: PlausibilityWindow) -> Option<f64> {
    let kg = response.weight_kilograms;
    if !kg.is_finite() || kg <= 0.0 || response.confidence == Confidence::Low {
        return None;
    }
    let rounded = (kg * 100.0).round() / 100.0;
    window.contains(rounded).then_some(rounded)
}

/// Runs the deterministic chain, then the collaborator on a miss.
///
/// Collaborator errors and rejected answers leave the sentinel in place.
pub fn estimate_with_fallback<E>(
    extractor: &WeightExtractor,
    estimator: &E,
    product: &ProductRecord,
) -> WeightEstimate
where
    E: WeightEstimator + ?Sized,
{
    let estimate = extractor.estimate(product);
    if !estimate.is_unknown() {
        return estimate;
    }

    let request = EstimationRequest::for_product(product);
    let product_id = request.product_id.as_deref().unwrap_or("-");

    match estimator.estimate(&request) {
        Ok(response) => match accept_estimate(&response, extractor.window()) {
            Some(kg) => {
                info!(product_id, kilograms = kg, confidence = ?response.confidence, "collaborator estimate accepted");
                extractor.from_estimated_kilograms(kg)
            }
            None => {
                warn!(
                    product_id,
                    kilograms = response.weight_kilograms,
                    confidence = ?response.confidence,
                    "collaborator estimate rejected"
                );
                estimate
            }
        },
        Err(err) => {
            warn!(product_id, error = %err, "weight estimation failed");
            estimate
        }
    }
}

/// The in-store price once the online shipping markup is removed.
///
/// `None` means the collaborator gave no markup and the default applies;
/// an explicit 0 (electronics, high-value goods) removes nothing.
pub fn warehouse_price(online_price: f64, markup: Option<f64>) -> f64 {
    let markup = markup
        .filter(|m| m.is_finite() && *m >= 0.0)
        .unwrap_or(DEFAULT_WAREHOUSE_MARKUP);
    if online_price > markup {
        online_price - markup
    } else {
        online_price
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeightSource;

    fn response(kg: f64, confidence: Confidence) -> EstimationResponse {
        EstimationResponse {
            weight_kilograms: kg,
            confidence,
            reason: "test".to_string(),
            is_multipack: false,
            estimated_markup: None,
        }
    }

    #[test]
    fn test_parse_plain_and_fenced_json() {
        let plain = r#"{"weightKg": 2.04, "confidence": "high", "reason": "340g x 6"}"#;
        let parsed = parse_estimation_response(plain).unwrap();
        assert_eq!(parsed.weight_kilograms, 2.04);
        assert_eq!(parsed.confidence, Confidence::High);

        let fenced = "```json\n{\"weightKg\": 5.66, \"confidence\": \"medium\", \"calculation\": \"2.83L x 2\", \"isMultipack\": true, \"estimatedMarkupKrw\": 3000}\n```";
        let parsed = parse_estimation_response(fenced).unwrap();
        assert_eq!(parsed.weight_kilograms, 5.66);
        assert_eq!(parsed.reason, "2.83L x 2");
        assert!(parsed.is_multipack);
        assert_eq!(parsed.estimated_markup, Some(3000.0));
    }

    #[test]
    fn test_parse_accepts_long_field_name() {
        let parsed =
            parse_estimation_response(r#"{"weightKilograms": 1.5, "confidence": "high"}"#).unwrap();
        assert_eq!(parsed.weight_kilograms, 1.5);
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_estimation_response("I think about 2kg").unwrap_err();
        assert!(matches!(err, EstimationError::MalformedResponse(_)));
    }

    #[test]
    fn test_accept_estimate_rules() {
        let window = PlausibilityWindow::default();
        assert_eq!(accept_estimate(&response(2.046, Confidence::High), window), Some(2.05));
        assert_eq!(accept_estimate(&response(2.0, Confidence::Low), window), None);
        assert_eq!(accept_estimate(&response(0.0, Confidence::High), window), None);
        assert_eq!(accept_estimate(&response(-1.0, Confidence::High), window), None);
        assert_eq!(accept_estimate(&response(800.0, Confidence::Medium), window), None);
        assert_eq!(accept_estimate(&response(f64::NAN, Confidence::High), window), None);
    }

    #[test]
    fn test_context_contains_every_source() {
        let mut product = ProductRecord::titled("Кока кола")
            .with_title("Coca-Cola 1.5L x 12")
            .with_specification("Capacity", "1.5L x 12");
        product.id = Some("p-1".to_string());
        product.brand = Some("Coca-Cola".to_string());
        product.descriptions = vec!["a".repeat(600)];

        let context = build_estimation_context(&product);
        assert!(context.starts_with("ID: p-1\nName: Кока кола\nName: Coca-Cola 1.5L x 12\n"));
        assert!(context.contains("Brand: Coca-Cola\n"));
        assert!(context.contains("Specifications:\n- Capacity: 1.5L x 12\n"));
        assert!(context.contains(&format!("Description: {}\n", "a".repeat(500))));
        assert!(!context.contains(&"a".repeat(501)));
    }

    #[test]
    fn test_fallback_not_consulted_when_chain_matches() {
        let estimator = |_: &EstimationRequest| -> Result<EstimationResponse, EstimationError> {
            panic!("collaborator must not be called")
        };
        let product = ProductRecord::titled("Rice 10kg");
        let estimate = estimate_with_fallback(WeightExtractor::bundled(), &estimator, &product);
        assert_eq!(estimate.source, WeightSource::Title);
    }

    #[test]
    fn test_fallback_uses_accepted_estimate() {
        let estimator = |request: &EstimationRequest| -> Result<EstimationResponse, EstimationError> {
            assert!(request.context.contains("Towels"));
            Ok(response(1.26, Confidence::Medium))
        };
        let product = ProductRecord::titled("Kirkland Towels");
        let estimate = estimate_with_fallback(WeightExtractor::bundled(), &estimator, &product);
        assert_eq!(estimate.source, WeightSource::AiEstimate);
        assert_eq!(estimate.provenance, "1.3kg");
        assert_eq!(estimate.kilograms, 1.3);
    }

    #[test]
    fn test_fallback_keeps_sentinel_on_low_confidence_or_error() {
        let product = ProductRecord::titled("Kirkland Towels");

        let low = |_: &EstimationRequest| -> Result<EstimationResponse, EstimationError> {
            Ok(response(3.0, Confidence::Low))
        };
        assert!(estimate_with_fallback(WeightExtractor::bundled(), &low, &product).is_unknown());

        let failing = |_: &EstimationRequest| -> Result<EstimationResponse, EstimationError> {
            Err(EstimationError::Transport("timeout".to_string()))
        };
        let estimate = estimate_with_fallback(WeightExtractor::bundled(), &failing, &product);
        assert!(estimate.is_unknown());
        assert_eq!(estimate.kilograms, 0.0);
    }

    #[test]
    fn test_warehouse_price() {
        assert_eq!(warehouse_price(15000.0, None), 13000.0);
        assert_eq!(warehouse_price(15000.0, Some(3000.0)), 12000.0);
        assert_eq!(warehouse_price(1500.0, None), 1500.0);
        assert_eq!(warehouse_price(990000.0, Some(0.0)), 990000.0);
    }
}
