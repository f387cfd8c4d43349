//! # Text Weight Parser
//!
//! Finds the shipping weight written in free product text and decides which
//! "x N" tokens around it are pack counts and which are dimensions.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "6 x 500g"                                                             │
//! │       │                                                                 │
//! │       ▼  tokenize()                                                     │
//! │  Number(6) Multiplier Number(500) Unit(g)                               │
//! │       │                                                                 │
//! │       ▼  find_primary()     first number + mass/volume unit             │
//! │  500g = 0.5kg                                                           │
//! │       │                                                                 │
//! │       ▼  evaluate_leading() / evaluate_trailing()                       │
//! │  accepted counts: [6]                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  0.5 × 6 = 3kg                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Multiplier Rules
//! A candidate count is rejected when:
//! - it follows another unit ("300g x 2" after the primary weight)
//! - it follows a dimension marker ("L 16 x", "Diameter 32 x")
//! - a unit follows it ("x 52cm", "x 500g")
//! - it is not a whole number ("x 16.5")
//! - it is part of a chain ("74 x 74 x 52"), every member goes
//!
//! The parser reports any total it computes. Deciding whether a total is
//! plausible is the extractor's job.

use serde::Serialize;
use tracing::trace;

use crate::locale::{Locale, Unit};
use crate::weight::token::{tokenize, Token, TokenKind};

// =============================================================================
// Parsed Weight
// =============================================================================

/// Result of parsing a weight out of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedWeight {
    /// The primary weight, converted to kilograms.
    pub base_kilograms: f64,

    /// Accepted pack counts, leading count first.
    pub multipliers: Vec<u32>,

    /// `base_kilograms` times every accepted count.
    pub kilograms: f64,

    /// The literal text of the weight and its adjacent accepted counts.
    pub matched: String,
}

impl ParsedWeight {
    /// The total formatted for display ("3kg", "600g").
    pub fn display_total(&self) -> String {
        format_weight(self.kilograms)
    }

    /// The total as the customer sees it (rounded like `display_total`).
    pub fn displayed_kilograms(&self) -> f64 {
        displayed_kilograms(self.kilograms)
    }
}

/// Why a candidate count was not multiplied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplierRejection {
    /// Preceded by a second, independent unit ("... 300mg x 100").
    FollowsUnit,
    /// Preceded by L/W/H/D or a dimension word.
    FollowsDimensionMarker,
    /// Followed by a unit, so it is a measure, not a count.
    UnitFollows,
    /// Zero or fractional.
    NotWholeCount,
    /// Member of an "a x b x c" chain.
    DimensionChain,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Parses a weight from `text` using the bundled locale.
///
/// ## Example
/// ```rust
/// use baraa_core::weight::parse_weight_from_text;
///
/// let parsed = parse_weight_from_text("Coffee 500g x 6").unwrap();
/// assert_eq!(parsed.kilograms, 3.0);
/// assert_eq!(parsed.multipliers, vec![6]);
/// assert_eq!(parsed.display_total(), "3kg");
///
/// assert!(parse_weight_from_text("Umbrella 74cm").is_none());
/// ```
pub fn parse_weight_from_text(text: &str) -> Option<ParsedWeight> {
    parse_weight_with(text, Locale::bundled())
}

/// Parses a weight from `text` using the given locale tables.
pub fn parse_weight_with(text: &str, locale: &Locale) -> Option<ParsedWeight> {
    let tokens = tokenize(text, locale);
    let (number_idx, base_kilograms) = find_primary(&tokens)?;
    let unit_idx = number_idx + 1;

    let mut multipliers = Vec::new();
    let mut span_start = tokens[number_idx].start;
    let mut span_end = tokens[unit_idx].end;

    if let Some(count_idx) = leading_candidate(&tokens, number_idx) {
        match evaluate_leading(&tokens, count_idx, locale) {
            Ok(count) => {
                multipliers.push(count);
                span_start = tokens[count_idx].start;
            }
            Err(reason) => trace!(?reason, count = tokens[count_idx].text, "leading count rejected"),
        }
    }

    // Accepted counts directly after the unit extend the matched span.
    let mut contiguous = true;
    let mut idx = unit_idx + 1;
    while idx + 1 < tokens.len() {
        if !(tokens[idx].is_multiplier() && tokens[idx + 1].is_number()) {
            contiguous = false;
            idx += 1;
            continue;
        }
        match evaluate_trailing(&tokens, idx, unit_idx, locale) {
            Ok(count) => {
                multipliers.push(count);
                if contiguous {
                    span_end = tokens[idx + 1].end;
                }
            }
            Err(reason) => {
                trace!(?reason, count = tokens[idx + 1].text, "trailing count rejected");
                contiguous = false;
            }
        }
        idx += 2;
    }

    let kilograms = multipliers
        .iter()
        .fold(base_kilograms, |total, count| total * f64::from(*count));

    Some(ParsedWeight {
        base_kilograms,
        multipliers,
        kilograms,
        matched: text[span_start..span_end].to_string(),
    })
}

// =============================================================================
// Primary Weight
// =============================================================================

/// Finds the first number followed by a mass or volume unit.
///
/// Returns the number's token index and its value in kilograms.
fn find_primary(tokens: &[Token<'_>]) -> Option<(usize, f64)> {
    tokens.windows(2).enumerate().find_map(|(idx, pair)| {
        let kilograms = pair[1].unit()?.to_kilograms(pair[0].number()?)?;
        Some((idx, kilograms))
    })
}

/// Index of `N` in "N x <primary>", if present.
fn leading_candidate(tokens: &[Token<'_>], number_idx: usize) -> Option<usize> {
    let count_idx = number_idx.checked_sub(2)?;
    (tokens[count_idx].is_number() && tokens[count_idx + 1].is_multiplier()).then_some(count_idx)
}

// =============================================================================
// Rule Evaluation
// =============================================================================

/// Evaluates "x N" where `mul_idx` points at the multiplier token.
pub(crate) fn evaluate_trailing(
    tokens: &[Token<'_>],
    mul_idx: usize,
    primary_unit_idx: usize,
    locale: &Locale,
) -> Result<u32, MultiplierRejection> {
    let count_idx = mul_idx + 1;

    if follows_unit(tokens, mul_idx, Some(primary_unit_idx)) {
        return Err(MultiplierRejection::FollowsUnit);
    }
    if follows_dimension_marker(tokens, mul_idx, locale) {
        return Err(MultiplierRejection::FollowsDimensionMarker);
    }
    let count = whole_count(&tokens[count_idx])?;
    if chain_continues_right(tokens, count_idx) || chain_continues_left(tokens, mul_idx) {
        return Err(MultiplierRejection::DimensionChain);
    }
    if unit_follows(tokens, count_idx) {
        return Err(MultiplierRejection::UnitFollows);
    }
    Ok(count)
}

/// Evaluates "N x" in front of the primary weight, `count_idx` pointing at N.
pub(crate) fn evaluate_leading(
    tokens: &[Token<'_>],
    count_idx: usize,
    locale: &Locale,
) -> Result<u32, MultiplierRejection> {
    let count = whole_count(&tokens[count_idx])?;
    if follows_unit(tokens, count_idx, None) {
        return Err(MultiplierRejection::FollowsUnit);
    }
    if follows_dimension_marker(tokens, count_idx, locale) {
        return Err(MultiplierRejection::FollowsDimensionMarker);
    }
    Ok(count)
}

/// The token before `idx` is a unit other than the primary weight's.
pub(crate) fn follows_unit(tokens: &[Token<'_>], idx: usize, primary_unit_idx: Option<usize>) -> bool {
    idx.checked_sub(1)
        .is_some_and(|prev| tokens[prev].unit().is_some() && Some(prev) != primary_unit_idx)
}

/// The token before `idx` is L/W/H/D or a dimension word.
pub(crate) fn follows_dimension_marker(tokens: &[Token<'_>], idx: usize, locale: &Locale) -> bool {
    idx.checked_sub(1)
        .map(|prev| &tokens[prev])
        .is_some_and(|prev| prev.is_word() && locale.is_dimension_marker(prev.text))
}

/// The token after the count is any unit.
pub(crate) fn unit_follows(tokens: &[Token<'_>], count_idx: usize) -> bool {
    tokens
        .get(count_idx + 1)
        .is_some_and(|next| next.unit().is_some())
}

/// "x a x b": another multiplier and number come after the count.
pub(crate) fn chain_continues_right(tokens: &[Token<'_>], count_idx: usize) -> bool {
    matches!(
        (tokens.get(count_idx + 1), tokens.get(count_idx + 2)),
        (Some(mul), Some(num)) if mul.is_multiplier() && num.is_number()
    )
}

/// The two tokens before `first_idx` are a multiplier and a number
/// ("x 74 | x 52").
pub(crate) fn chain_continues_left(tokens: &[Token<'_>], first_idx: usize) -> bool {
    if first_idx < 2 {
        return false;
    }
    let (a, b) = (&tokens[first_idx - 2], &tokens[first_idx - 1]);
    a.is_multiplier() && b.is_number()
}

/// A count must be a whole number of at least one.
pub(crate) fn whole_count(token: &Token<'_>) -> Result<u32, MultiplierRejection> {
    match token.kind {
        TokenKind::Number {
            value,
            integral: true,
        } if value >= 1.0 && value <= f64::from(u32::MAX) => Ok(value as u32),
        _ => Err(MultiplierRejection::NotWholeCount),
    }
}

// =============================================================================
// Display Helpers
// =============================================================================

/// Formats a weight: one decimal in kilograms from 1kg, whole grams below.
///
/// ## Example
/// ```rust
/// use baraa_core::weight::format_weight;
///
/// assert_eq!(format_weight(3.0), "3kg");
/// assert_eq!(format_weight(14.44), "14.4kg");
/// assert_eq!(format_weight(0.6), "600g");
/// ```
pub fn format_weight(kilograms: f64) -> String {
    if kilograms >= 1.0 {
        format!("{}kg", round_to_tenth(kilograms))
    } else {
        format!("{}g", (kilograms * 1000.0).round())
    }
}

/// The kilogram value `format_weight` displays.
pub fn displayed_kilograms(kilograms: f64) -> f64 {
    if kilograms >= 1.0 {
        round_to_tenth(kilograms)
    } else {
        (kilograms * 1000.0).round() / 1000.0
    }
}

/// Rounds half away from zero to one decimal place.
pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The syntactic weight span "N x ... <weight> x N ..." of `text`.
///
/// Used to show the full multiplier chain of a title next to its total,
/// whether or not every count was accepted.
pub fn chain_span<'a>(text: &'a str, locale: &Locale) -> Option<&'a str> {
    let tokens = tokenize(text, locale);
    let (number_idx, _) = find_primary(&tokens)?;

    let mut first = number_idx;
    while first >= 2 && tokens[first - 1].is_multiplier() && is_integral(&tokens[first - 2]) {
        first -= 2;
    }

    let mut last = number_idx + 1;
    while last + 2 < tokens.len() && tokens[last + 1].is_multiplier() && is_integral(&tokens[last + 2]) {
        last += 2;
    }

    Some(&text[tokens[first].start..tokens[last].end])
}

fn is_integral(token: &Token<'_>) -> bool {
    matches!(token.kind, TokenKind::Number { integral: true, .. })
}

/// Reads a kilogram value back from a weight label.
///
/// Looks for "= N kg" first, then the first "N kg", then the first "N g".
/// Used for free-form operator weights ("약 2.5kg") and pass-through
/// specification text.
pub fn kilograms_from_label(text: &str, locale: &Locale) -> Option<f64> {
    let tokens = tokenize(text, locale);
    let unit_at = |idx: usize| tokens.get(idx).and_then(Token::unit);

    let after_equals = tokens.windows(3).find_map(|w| {
        if w[0].text == "=" && unit_at_pair(&w[1..], Unit::Kilogram) {
            w[1].number()
        } else {
            None
        }
    });
    if after_equals.is_some() {
        return after_equals;
    }

    let first_with = |unit: Unit| {
        tokens.iter().enumerate().find_map(|(idx, token)| {
            token.number().filter(|_| unit_at(idx + 1) == Some(unit))
        })
    };

    first_with(Unit::Kilogram).or_else(|| first_with(Unit::Gram).map(|grams| grams / 1000.0))
}

fn unit_at_pair(pair: &[Token<'_>], unit: Unit) -> bool {
    pair[0].is_number() && pair[1].unit() == Some(unit)
}

// =============================================================================
// Unit Tests
// =============================================================================
