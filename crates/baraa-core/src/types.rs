//! # Domain Types
//!
//! Value types shared by the weight extractor, the price calculator and the
//! storefront (through the generated TypeScript bindings).
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐          ┌──────────────────────┐            │
//! │  │    ProductRecord     │          │    WeightEstimate    │            │
//! │  │  ──────────────────  │  ──────► │  ──────────────────  │            │
//! │  │  explicitWeight      │ extractor│  kilograms           │            │
//! │  │  aiEstimatedWeight   │          │  label ("Жин:")      │            │
//! │  │  specificationEntries│          │  provenance          │            │
//! │  │  titleCandidates     │          │  source              │            │
//! │  └──────────────────────┘          └──────────────────────┘            │
//! │                                                                         │
//! │  ┌──────────────────────┐          ┌──────────────────────┐            │
//! │  │   ExplicitWeight     │          │ PlausibilityWindow   │            │
//! │  │  Kilograms(2.5)      │          │  (0.01kg, 500kg)     │            │
//! │  │  Text("약 2.5kg")    │          │  exclusive bounds    │            │
//! │  └──────────────────────┘          └──────────────────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Product records come straight from the catalog store, so every field is
//! optional on the wire and deserializes with a default.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Product Record
// =============================================================================

/// An operator-set weight: either a number of kilograms or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum ExplicitWeight {
    Kilograms(f64),
    Text(String),
}

impl ExplicitWeight {
    /// Checks if the value carries anything (a positive number or
    /// non-blank text). Zero and "" mean "not set".
    pub fn is_set(&self) -> bool {
        match self {
            ExplicitWeight::Kilograms(kg) => kg.is_finite() && *kg > 0.0,
            ExplicitWeight::Text(text) => !text.trim().is_empty(),
        }
    }
}

/// A structured product attribute such as "Capacity: 500ml x 6".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SpecificationEntry {
    pub name: String,
    pub value: String,
}

impl SpecificationEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        SpecificationEntry {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The fields of a catalog product the weight engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProductRecord {
    /// Catalog document ID, used only to identify estimation requests.
    pub id: Option<String>,

    /// Operator override, highest priority.
    pub explicit_weight: Option<ExplicitWeight>,

    /// Weight stored by an earlier estimation run.
    pub ai_estimated_weight: Option<f64>,

    /// Structured attributes in catalog order.
    pub specification_entries: Vec<SpecificationEntry>,

    /// Localized name, English name, raw name, in priority order.
    pub title_candidates: Vec<String>,

    /// Brand, only used to build estimation context.
    pub brand: Option<String>,

    /// Free-text descriptions, only used to build estimation context.
    pub descriptions: Vec<String>,
}

impl ProductRecord {
    /// Creates a record with a single title candidate.
    pub fn titled(title: impl Into<String>) -> Self {
        ProductRecord {
            title_candidates: vec![title.into()],
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title_candidates.push(title.into());
        self
    }

    pub fn with_specification(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.specification_entries
            .push(SpecificationEntry::new(name, value));
        self
    }

    pub fn with_explicit_weight(mut self, weight: ExplicitWeight) -> Self {
        self.explicit_weight = Some(weight);
        self
    }

    pub fn with_ai_estimate(mut self, kilograms: f64) -> Self {
        self.ai_estimated_weight = Some(kilograms);
        self
    }

    /// The first title candidate, or "" when there is none.
    pub fn primary_title(&self) -> &str {
        self.title_candidates
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

// =============================================================================
// Weight Estimate
// =============================================================================

/// Which resolution tier produced a weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum WeightSource {
    /// Operator override.
    Explicit,
    /// Stored AI estimate or a live collaborator answer.
    AiEstimate,
    /// A parsed specification value.
    Specification,
    /// A short specification value shown as-is, nothing computed.
    SpecificationText,
    /// A parsed title.
    Title,
    /// Nothing matched; provenance is the ask-support sentinel.
    Unknown,
}

/// Result of weight extraction.
///
/// `kilograms` is what the customer sees in `provenance`, rounded the same
/// way, so shipping is charged on the displayed weight. It is `0` for
/// `Unknown` and may be `0` for `SpecificationText`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WeightEstimate {
    pub kilograms: f64,
    pub label: String,
    pub provenance: String,
    pub source: WeightSource,
}

impl WeightEstimate {
    /// Checks if nothing could be determined.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.source == WeightSource::Unknown
    }
}

// =============================================================================
// Plausibility Window
// =============================================================================

/// Exclusive bounds for an inferred single-product shipping weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct PlausibilityWindow {
    pub min_kg: f64,
    pub max_kg: f64,
}

impl PlausibilityWindow {
    pub const fn new(min_kg: f64, max_kg: f64) -> Self {
        PlausibilityWindow { min_kg, max_kg }
    }

    /// Checks if `kilograms` lies strictly inside the window.
    #[inline]
    pub fn contains(&self, kilograms: f64) -> bool {
        kilograms > self.min_kg && kilograms < self.max_kg
    }
}

impl Default for PlausibilityWindow {
    fn default() -> Self {
        PlausibilityWindow::new(0.01, 500.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_record_from_catalog_json() {
        let json = r#"{
            "id": "p-1",
            "explicitWeight": "약 2.5kg",
            "specificationEntries": [{ "name": "Capacity", "value": "500ml" }],
            "titleCandidates": ["Coke 500ml x 6"]
        }"#;
        let record: ProductRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id.as_deref(), Some("p-1"));
        assert_eq!(
            record.explicit_weight,
            Some(ExplicitWeight::Text("약 2.5kg".to_string()))
        );
        assert_eq!(record.ai_estimated_weight, None);
        assert_eq!(record.specification_entries[0].value, "500ml");
        assert!(record.descriptions.is_empty());
    }

    #[test]
    fn test_explicit_weight_number_or_text() {
        let numeric: ExplicitWeight = serde_json::from_str("2.5").unwrap();
        assert_eq!(numeric, ExplicitWeight::Kilograms(2.5));

        let text: ExplicitWeight = serde_json::from_str(r#""2kg""#).unwrap();
        assert_eq!(text, ExplicitWeight::Text("2kg".to_string()));
    }

    #[test]
    fn test_explicit_weight_is_set() {
        assert!(ExplicitWeight::Kilograms(0.3).is_set());
        assert!(!ExplicitWeight::Kilograms(0.0).is_set());
        assert!(!ExplicitWeight::Kilograms(f64::NAN).is_set());
        assert!(ExplicitWeight::Text("2kg".into()).is_set());
        assert!(!ExplicitWeight::Text("  ".into()).is_set());
    }

    #[test]
    fn test_plausibility_window_is_exclusive() {
        let window = PlausibilityWindow::default();
        assert!(window.contains(0.5));
        assert!(!window.contains(0.01));
        assert!(!window.contains(500.0));
        assert!(!window.contains(0.0));
    }

    #[test]
    fn test_weight_source_serializes_snake_case() {
        let json = serde_json::to_string(&WeightSource::SpecificationText).unwrap();
        assert_eq!(json, r#""specification_text""#);
    }
}
