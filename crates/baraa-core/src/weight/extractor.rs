//! # Weight Extractor
//!
//! Resolves one shipping weight per product record.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductRecord                                                          │
//! │       │                                                                 │
//! │       ├─ 1. explicitWeight set?        ──► "2.5kg" / verbatim text      │
//! │       ├─ 2. aiEstimatedWeight plausible? ► "1.2kg"                      │
//! │       ├─ 3. specification entries      ──► "500ml x 6 = 3kg"            │
//! │       │      (keyword in name)             or short text as-is          │
//! │       ├─ 4. title candidates           ──► "6 x 500g = 3kg"             │
//! │       └─ 5. nothing                    ──► 0kg + ask-support sentinel   │
//! │                                                                         │
//! │  First satisfied tier wins. Inferred values (2, 3, 4) must fall         │
//! │  inside the plausibility window; operator overrides (1) never do.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The extractor is total: it never fails and never panics on malformed
//! records, it only falls through to the next tier.

use std::sync::OnceLock;

use tracing::debug;

use crate::locale::Locale;
use crate::types::{ExplicitWeight, PlausibilityWindow, ProductRecord, WeightEstimate, WeightSource};
use crate::weight::parser::{
    chain_span, displayed_kilograms, format_weight, kilograms_from_label, parse_weight_with,
    round_to_tenth,
};
use crate::SPEC_PASSTHROUGH_MAX_CHARS;

/// Resolves shipping weights with a fixed locale and plausibility window.
#[derive(Debug, Clone, Default)]
pub struct WeightExtractor {
    locale: Locale,
    window: PlausibilityWindow,
}

impl WeightExtractor {
    pub fn new(locale: Locale, window: PlausibilityWindow) -> Self {
        WeightExtractor { locale, window }
    }

    /// The extractor with bundled tables and the default window, built once.
    pub fn bundled() -> &'static WeightExtractor {
        static BUNDLED: OnceLock<WeightExtractor> = OnceLock::new();
        BUNDLED.get_or_init(WeightExtractor::default)
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn window(&self) -> PlausibilityWindow {
        self.window
    }

    /// Resolves the weight of `product`.
    pub fn estimate(&self, product: &ProductRecord) -> WeightEstimate {
        let estimate = self
            .from_explicit(product)
            .or_else(|| self.from_ai_field(product))
            .or_else(|| self.from_specifications(product))
            .or_else(|| self.from_titles(product))
            .unwrap_or_else(|| self.unknown());

        debug!(
            product_id = product.id.as_deref().unwrap_or("-"),
            source = ?estimate.source,
            kilograms = estimate.kilograms,
            "weight resolved"
        );
        estimate
    }

    /// The no-match sentinel estimate.
    pub fn unknown(&self) -> WeightEstimate {
        self.resolved(0.0, self.locale.ask_support.clone(), WeightSource::Unknown)
    }

    /// Builds an estimate for a collaborator-supplied weight.
    pub fn from_estimated_kilograms(&self, kilograms: f64) -> WeightEstimate {
        let (provenance, kilograms) = field_display(kilograms);
        self.resolved(kilograms, provenance, WeightSource::AiEstimate)
    }

    // -------------------------------------------------------------------------
    // Tiers
    // -------------------------------------------------------------------------

    fn from_explicit(&self, product: &ProductRecord) -> Option<WeightEstimate> {
        let weight = product.explicit_weight.as_ref().filter(|w| w.is_set())?;

        let estimate = match weight {
            ExplicitWeight::Kilograms(kg) => {
                let (provenance, kilograms) = field_display(*kg);
                self.resolved(kilograms, provenance, WeightSource::Explicit)
            }
            ExplicitWeight::Text(text) => {
                let kilograms = kilograms_from_label(text, &self.locale)
                    .or_else(|| text.trim().parse::<f64>().ok())
                    .filter(|kg| kg.is_finite() && *kg >= 0.0)
                    .unwrap_or(0.0);
                self.resolved(kilograms, text.clone(), WeightSource::Explicit)
            }
        };
        Some(estimate)
    }

    fn from_ai_field(&self, product: &ProductRecord) -> Option<WeightEstimate> {
        let kg = product.ai_estimated_weight?;
        if !self.window.contains(kg) {
            debug!(kilograms = kg, "stored AI weight outside plausibility window");
            return None;
        }
        Some(self.from_estimated_kilograms(kg))
    }

    fn from_specifications(&self, product: &ProductRecord) -> Option<WeightEstimate> {
        let entries = product
            .specification_entries
            .iter()
            .filter(|entry| self.locale.names_weight_attribute(&entry.name));

        for entry in entries {
            let cleaned = replace_line_breaks(&entry.value);

            if let Some(parsed) = parse_weight_with(&cleaned, &self.locale) {
                if self.window.contains(parsed.kilograms) {
                    return Some(self.resolved(
                        parsed.displayed_kilograms(),
                        format!("{cleaned} = {}", parsed.display_total()),
                        WeightSource::Specification,
                    ));
                }
                debug!(name = %entry.name, kilograms = parsed.kilograms, "specification weight implausible");
                continue;
            }

            if !cleaned.trim().is_empty() && cleaned.chars().count() < SPEC_PASSTHROUGH_MAX_CHARS {
                return Some(self.resolved(0.0, cleaned, WeightSource::SpecificationText));
            }
        }
        None
    }

    fn from_titles(&self, product: &ProductRecord) -> Option<WeightEstimate> {
        for title in &product.title_candidates {
            let Some(parsed) = parse_weight_with(title, &self.locale) else {
                continue;
            };
            if !self.window.contains(parsed.kilograms) {
                debug!(title = %title, kilograms = parsed.kilograms, "title weight implausible");
                continue;
            }

            let shown = chain_span(title, &self.locale).unwrap_or(parsed.matched.as_str());
            return Some(self.resolved(
                parsed.displayed_kilograms(),
                format!("{} = {}", shown.trim(), parsed.display_total()),
                WeightSource::Title,
            ));
        }
        None
    }

    fn resolved(&self, kilograms: f64, provenance: String, source: WeightSource) -> WeightEstimate {
        WeightEstimate {
            kilograms,
            label: self.locale.weight_label.clone(),
            provenance,
            source,
        }
    }
}

/// Resolves the weight of `product` with the bundled extractor.
pub fn estimate_weight(product: &ProductRecord) -> WeightEstimate {
    WeightExtractor::bundled().estimate(product)
}

/// Numeric record fields show one decimal in kilograms. Values that would
/// round to "0kg" show grams instead.
fn field_display(kilograms: f64) -> (String, f64) {
    let tenth = round_to_tenth(kilograms);
    if tenth > 0.0 {
        (format!("{tenth}kg"), tenth)
    } else {
        (format_weight(kilograms), displayed_kilograms(kilograms))
    }
}

/// Replaces `<br>`, `<br/>` and `<br />` (any case) with ", ".
fn replace_line_breaks(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tag = &rest[open..];
        match line_break_len(tag) {
            Some(len) => {
                out.push_str(", ");
                rest = &tag[len..];
            }
            None => {
                out.push('<');
                rest = &tag[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Length of a `<br\s*/?>` tag at the start of `tag`.
fn line_break_len(tag: &str) -> Option<usize> {
    let bytes = tag.as_bytes();
    if bytes.len() < 4 || !bytes[1..3].eq_ignore_ascii_case(b"br") {
        return None;
    }
    let mut idx = 3;
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    if bytes.get(idx) == Some(&b'/') {
        idx += 1;
    }
    (bytes.get(idx) == Some(&b'>')).then_some(idx + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================
