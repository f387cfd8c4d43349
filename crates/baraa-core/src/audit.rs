//! # Weight Audit
//!
//! Flags stored weights that are probably wrong, so an operator (or a batch
//! job calling the estimation collaborator) can correct them.
//!
//! ## Checks (first hit wins)
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │ Issue                        │ Trigger                                  │
//! ├──────────────────────────────┼──────────────────────────────────────────┤
//! │ MultipackUnderestimated      │ "40ea", "x 12pcs" in name, weight < 0.8  │
//! │ DimensionConfusion           │ weight equals "50cm" in name, > 1kg      │
//! │ LiquidUnderestimated         │ "2L" in name, weight < half the liters   │
//! │ MissingWeight                │ weight is 0                              │
//! │ SpecsDataMissing             │ specs mention kg/weight, weight < 0.1    │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::locale::{Locale, Unit};
use crate::types::{ExplicitWeight, ProductRecord};
use crate::weight::{kilograms_from_label, tokenize, Token, TokenKind};

/// A weight under this is suspicious for a multipack.
const MULTIPACK_MIN_KG: f64 = 0.8;

/// Stored weight and a length in the name closer than this are "equal".
const DIMENSION_TOLERANCE: f64 = 0.05;

/// A stored weight under this is treated as absent when specs mention one.
const SPECS_MIN_KG: f64 = 0.1;

/// A correction smaller than this is not worth writing back.
const SIGNIFICANT_CHANGE_KG: f64 = 0.05;

/// A suspected problem with a stored weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum WeightIssue {
    MultipackUnderestimated,
    DimensionConfusion,
    LiquidUnderestimated,
    MissingWeight,
    SpecsDataMissing,
}

impl WeightIssue {
    pub const fn as_str(self) -> &'static str {
        match self {
            WeightIssue::MultipackUnderestimated => "multipack_underestimated",
            WeightIssue::DimensionConfusion => "dimension_confusion",
            WeightIssue::LiquidUnderestimated => "liquid_underestimated",
            WeightIssue::MissingWeight => "missing_weight",
            WeightIssue::SpecsDataMissing => "specs_data_missing",
        }
    }
}

impl fmt::Display for WeightIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The weight stored on the record, in kilograms (0 when unset).
pub fn current_weight_kg(product: &ProductRecord) -> f64 {
    let kg = match &product.explicit_weight {
        Some(ExplicitWeight::Kilograms(kg)) => *kg,
        Some(ExplicitWeight::Text(text)) => kilograms_from_label(text, Locale::bundled())
            .or_else(|| text.trim().parse().ok())
            .unwrap_or(0.0),
        None => 0.0,
    };
    if kg.is_finite() && kg > 0.0 {
        kg
    } else {
        0.0
    }
}

/// Checks `current_weight_kg` against the product's name and specs.
pub fn detect_weight_issue(product: &ProductRecord, current_weight_kg: f64) -> Option<WeightIssue> {
    detect_weight_issue_with(product, current_weight_kg, Locale::bundled())
}

pub fn detect_weight_issue_with(
    product: &ProductRecord,
    current_weight_kg: f64,
    locale: &Locale,
) -> Option<WeightIssue> {
    let name = product.primary_title().to_lowercase();
    let tokens = tokenize(&name, locale);
    let weight = current_weight_kg;

    if has_count_suffix(&tokens, locale) && weight < MULTIPACK_MIN_KG {
        return Some(WeightIssue::MultipackUnderestimated);
    }

    if let Some(length) = first_length(&tokens) {
        if (weight - length).abs() < DIMENSION_TOLERANCE && weight > 1.0 {
            return Some(WeightIssue::DimensionConfusion);
        }
    }

    if let Some(liters) = first_with_unit(&tokens, Unit::Liter) {
        if liters >= 1.0 && weight < liters * 0.5 {
            return Some(WeightIssue::LiquidUnderestimated);
        }
    }

    if weight == 0.0 {
        return Some(WeightIssue::MissingWeight);
    }

    if specs_mention_weight(product) && weight < SPECS_MIN_KG {
        return Some(WeightIssue::SpecsDataMissing);
    }

    None
}

/// Decides whether a proposed weight should replace the stored one.
pub fn needs_correction(current_kg: f64, proposed_kg: f64, issue: Option<WeightIssue>) -> bool {
    (proposed_kg - current_kg).abs() > SIGNIFICANT_CHANGE_KG
        || current_kg == 0.0
        || issue == Some(WeightIssue::DimensionConfusion)
}

/// "40ea", "x 12 pcs", "10개": a 1-3 digit count followed by a count word.
fn has_count_suffix(tokens: &[Token<'_>], locale: &Locale) -> bool {
    tokens.windows(2).any(|pair| {
        let is_count = matches!(
            pair[0].kind,
            TokenKind::Number { value, integral: true } if value < 1000.0
        );
        is_count && pair[1].is_word() && locale.is_count_suffix(pair[1].text)
    })
}

/// The first number followed by a length unit or the word "size".
fn first_length(tokens: &[Token<'_>]) -> Option<f64> {
    tokens.windows(2).find_map(|pair| {
        let follows = pair[1].unit().is_some_and(Unit::is_length)
            || (pair[1].is_word() && pair[1].text == "size");
        pair[0].number().filter(|_| follows)
    })
}

fn first_with_unit(tokens: &[Token<'_>], unit: Unit) -> Option<f64> {
    tokens
        .windows(2)
        .find_map(|pair| pair[0].number().filter(|_| pair[1].unit() == Some(unit)))
}

fn specs_mention_weight(product: &ProductRecord) -> bool {
    let specs = serde_json::to_string(&product.specification_entries)
        .unwrap_or_default()
        .to_lowercase();
    specs.contains("kg") || specs.contains("жин") || specs.contains(" weight")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipack_underestimated() {
        let product = ProductRecord::titled("Ramen 120g x 40EA");
        assert_eq!(
            detect_weight_issue(&product, 0.12),
            Some(WeightIssue::MultipackUnderestimated)
        );
        assert_eq!(detect_weight_issue(&product, 4.8), None);
    }

    #[test]
    fn test_dimension_confusion() {
        let product = ProductRecord::titled("Umbrella 50cm");
        assert_eq!(
            detect_weight_issue(&product, 50.0),
            Some(WeightIssue::DimensionConfusion)
        );
        assert_eq!(detect_weight_issue(&product, 0.9), None);
    }

    #[test]
    fn test_liquid_underestimated() {
        let product = ProductRecord::titled("Water 2L x 6");
        assert_eq!(
            detect_weight_issue(&product, 0.5),
            Some(WeightIssue::LiquidUnderestimated)
        );
        assert_eq!(detect_weight_issue(&product, 12.0), None);
    }

    #[test]
    fn test_missing_weight() {
        let product = ProductRecord::titled("Towel set");
        assert_eq!(detect_weight_issue(&product, 0.0), Some(WeightIssue::MissingWeight));
    }

    #[test]
    fn test_specs_data_missing() {
        let product = ProductRecord::titled("Vitamins").with_specification("Net Weight", "300g");
        assert_eq!(
            detect_weight_issue(&product, 0.05),
            Some(WeightIssue::SpecsDataMissing)
        );
        assert_eq!(detect_weight_issue(&product, 0.3), None);
    }

    #[test]
    fn test_current_weight_from_record() {
        let numeric = ProductRecord::default().with_explicit_weight(ExplicitWeight::Kilograms(2.5));
        assert_eq!(current_weight_kg(&numeric), 2.5);

        let text = ProductRecord::default()
            .with_explicit_weight(ExplicitWeight::Text("500ml x 6 = 3kg".into()));
        assert_eq!(current_weight_kg(&text), 3.0);

        assert_eq!(current_weight_kg(&ProductRecord::default()), 0.0);
    }

    #[test]
    fn test_needs_correction() {
        assert!(needs_correction(1.0, 2.0, None));
        assert!(!needs_correction(1.0, 1.02, None));
        assert!(needs_correction(0.0, 0.02, None));
        assert!(needs_correction(50.0, 50.0, Some(WeightIssue::DimensionConfusion)));
    }

    #[test]
    fn test_issue_codes() {
        assert_eq!(WeightIssue::SpecsDataMissing.to_string(), "specs_data_missing");
        assert_eq!(
            serde_json::to_string(&WeightIssue::DimensionConfusion).unwrap(),
            r#""dimension_confusion""#
        );
    }
}
