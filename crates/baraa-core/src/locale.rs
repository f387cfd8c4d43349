//! # Locale Tables
//!
//! Every language-specific string the weight engine knows about lives here:
//! unit spellings, specification-name keywords, dimension words, multiplier
//! symbols and the two user-facing strings (weight label, ask-support
//! sentinel).
//!
//! ## Why A Table?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product text mixes four scripts in one line:                           │
//! │                                                                         │
//! │    "코카콜라 Coca-Cola 1.5ℓ x 12 / Кока кола 1.5л"                       │
//! │                                                                         │
//! │  The tokenizer and rule evaluator only ever ask the Locale:             │
//! │    • is this a unit?            match_unit("ℓ x 12 ...")                │
//! │    • is this a dimension word?  is_dimension_marker("өргөн")            │
//! │    • is this a multiplier?      is_multiplier_symbol('х')               │
//! │                                                                         │
//! │  Adding a language = adding rows here. Parsing code never changes.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Locale` deserializes with `#[serde(default)]`, so a host can replace any
//! single list from configuration and keep the bundled rest.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

// =============================================================================
// Units
// =============================================================================

/// Physical dimension of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitDimension {
    Mass,
    Volume,
    Length,
}

/// A unit the tokenizer can recognise directly after a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Kilogram,
    Gram,
    Milligram,
    Liter,
    Milliliter,
    Centimeter,
    Millimeter,
    Meter,
    Inch,
}

impl Unit {
    /// Returns the physical dimension of the unit.
    pub const fn dimension(self) -> UnitDimension {
        match self {
            Unit::Kilogram | Unit::Gram | Unit::Milligram => UnitDimension::Mass,
            Unit::Liter | Unit::Milliliter => UnitDimension::Volume,
            Unit::Centimeter | Unit::Millimeter | Unit::Meter | Unit::Inch => UnitDimension::Length,
        }
    }

    /// Conversion factor to shipping kilograms.
    ///
    /// Volumes ship at 1 L = 1 kg. Milligrams are recognised so they can
    /// block a multiplier ("100mg x 60"), but never count as a shipping
    /// weight, and lengths are never weights.
    pub const fn kilograms_per_unit(self) -> Option<f64> {
        match self {
            Unit::Kilogram | Unit::Liter => Some(1.0),
            Unit::Gram | Unit::Milliliter => Some(0.001),
            Unit::Milligram
            | Unit::Centimeter
            | Unit::Millimeter
            | Unit::Meter
            | Unit::Inch => None,
        }
    }

    /// Converts a value in this unit to shipping kilograms.
    ///
    /// Sub-units divide by 1000 so "190ml" is exactly 0.19.
    pub fn to_kilograms(self, value: f64) -> Option<f64> {
        match self.kilograms_per_unit()? {
            factor if factor == 1.0 => Some(value),
            _ => Some(value / 1000.0),
        }
    }

    /// Checks if this is a length unit (cm, mm, m, inch).
    #[inline]
    pub const fn is_length(self) -> bool {
        matches!(self.dimension(), UnitDimension::Length)
    }
}

/// One written form of a unit ("kg", "кг", "킬로그램" are three rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpelling {
    pub spelling: String,
    pub unit: Unit,
}

impl UnitSpelling {
    fn new(spelling: &str, unit: Unit) -> Self {
        UnitSpelling {
            spelling: spelling.to_string(),
            unit,
        }
    }
}

// =============================================================================
// Locale
// =============================================================================

/// Language tables consulted by the tokenizer, the rule evaluator and the
/// extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locale {
    /// Unit spellings, matched case-insensitively, longest first.
    pub units: Vec<UnitSpelling>,

    /// Specification names containing one of these (case-sensitive
    /// substring) are searched for a weight.
    pub specification_keywords: Vec<String>,

    /// Words that turn a following "x N" into a dimension (suffix match).
    pub dimension_words: Vec<String>,

    /// Single-letter dimension abbreviations (L 16 x 20).
    pub dimension_letters: Vec<char>,

    /// Characters that read as "times".
    pub multiplier_symbols: Vec<char>,

    /// Count words that mark a multipack ("12ea", "24pcs", "10개").
    pub count_suffixes: Vec<String>,

    /// Label shown next to every weight value.
    pub weight_label: String,

    /// Shown instead of a weight when nothing could be determined.
    /// UI strings match on this verbatim.
    pub ask_support: String,
}

impl Default for Locale {
    fn default() -> Self {
        use Unit::*;

        let units = vec![
            UnitSpelling::new("kg", Kilogram),
            UnitSpelling::new("кг", Kilogram),
            UnitSpelling::new("㎏", Kilogram),
            UnitSpelling::new("킬로그램", Kilogram),
            UnitSpelling::new("g", Gram),
            UnitSpelling::new("gr", Gram),
            UnitSpelling::new("г", Gram),
            UnitSpelling::new("гр", Gram),
            UnitSpelling::new("грамм", Gram),
            UnitSpelling::new("그램", Gram),
            UnitSpelling::new("mg", Milligram),
            UnitSpelling::new("мг", Milligram),
            UnitSpelling::new("㎎", Milligram),
            UnitSpelling::new("l", Liter),
            UnitSpelling::new("ℓ", Liter),
            UnitSpelling::new("л", Liter),
            UnitSpelling::new("литр", Liter),
            UnitSpelling::new("liter", Liter),
            UnitSpelling::new("litre", Liter),
            UnitSpelling::new("리터", Liter),
            UnitSpelling::new("ml", Milliliter),
            UnitSpelling::new("мл", Milliliter),
            UnitSpelling::new("㎖", Milliliter),
            UnitSpelling::new("미리리터", Milliliter),
            UnitSpelling::new("밀리리터", Milliliter),
            UnitSpelling::new("cm", Centimeter),
            UnitSpelling::new("см", Centimeter),
            UnitSpelling::new("㎝", Centimeter),
            UnitSpelling::new("센티", Centimeter),
            UnitSpelling::new("mm", Millimeter),
            UnitSpelling::new("мм", Millimeter),
            UnitSpelling::new("㎜", Millimeter),
            UnitSpelling::new("m", Meter),
            UnitSpelling::new("м", Meter),
            UnitSpelling::new("미터", Meter),
            UnitSpelling::new("in", Inch),
            UnitSpelling::new("inch", Inch),
            UnitSpelling::new("inches", Inch),
            UnitSpelling::new("инч", Inch),
            UnitSpelling::new("인치", Inch),
        ];

        Locale {
            units,
            specification_keywords: strings(&[
                "Capacity", "Weight", "Size", "Quantity", "Volume", "용량", "중량", "크기", "수량",
            ]),
            dimension_words: strings(&[
                "diameter", "radius", "width", "height", "depth", "long", "length", "size",
                "диаметр", "радиус", "өндөр", "өргөн", "гүн", "урт", "хэмжээ", "지름", "너비",
                "높이", "깊이", "길이", "크기", "사이즈",
            ]),
            dimension_letters: vec!['L', 'W', 'H', 'D'],
            multiplier_symbols: vec!['x', 'X', '*', 'х', 'Х', '×'],
            count_suffixes: strings(&[
                "ea", "ш", "шт", "개", "pack", "packs", "bags", "pcs", "pk", "p",
            ]),
            weight_label: "Жин:".to_string(),
            ask_support: "Жингийн мэдээллийг та чатаар асууна уу".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Locale {
    /// The bundled Korean/Mongolian/English/Cyrillic tables, built once.
    pub fn bundled() -> &'static Locale {
        static BUNDLED: OnceLock<Locale> = OnceLock::new();
        BUNDLED.get_or_init(Locale::default)
    }

    /// Matches a unit at the very start of `rest`.
    ///
    /// Returns the unit and the matched byte length. The longest spelling
    /// wins ("ml" over "m", "грамм" over "г"), and a spelling only matches
    /// when the next character does not continue a word in the same script:
    /// "500gr" is grams, "500 golf" is not.
    pub fn match_unit(&self, rest: &str) -> Option<(Unit, usize)> {
        let mut best: Option<(Unit, usize)> = None;

        for entry in &self.units {
            let Some(len) = prefix_len_ignore_case(rest, &entry.spelling) else {
                continue;
            };
            if continues_word(&entry.spelling, &rest[len..]) {
                continue;
            }
            if best.map_or(true, |(_, best_len)| len > best_len) {
                best = Some((entry.unit, len));
            }
        }

        best
    }

    /// Checks if a specification name marks a weight-bearing attribute.
    pub fn names_weight_attribute(&self, name: &str) -> bool {
        self.specification_keywords
            .iter()
            .any(|keyword| name.contains(keyword.as_str()))
    }

    /// Checks if a word is a dimension marker: a lone L/W/H/D letter or a
    /// word ending in a dimension word ("Diameter", "өргөн").
    pub fn is_dimension_marker(&self, word: &str) -> bool {
        let mut chars = word.chars();
        if let (Some(only), None) = (chars.next(), chars.next()) {
            if self
                .dimension_letters
                .iter()
                .any(|letter| chars_eq_ignore_case(*letter, only))
            {
                return true;
            }
        }

        let lower = word.to_lowercase();
        self.dimension_words
            .iter()
            .any(|dimension| lower.ends_with(&dimension.to_lowercase()))
    }

    /// Checks if a character reads as "times".
    #[inline]
    pub fn is_multiplier_symbol(&self, c: char) -> bool {
        self.multiplier_symbols.contains(&c)
    }

    /// Checks if a word is a count suffix ("ea", "pcs", "개").
    pub fn is_count_suffix(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.count_suffixes
            .iter()
            .any(|suffix| suffix.to_lowercase() == lower)
    }
}

// =============================================================================
// Matching Helpers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Latin,
    Cyrillic,
    Hangul,
    Other,
}

fn script_of(c: char) -> Script {
    match c {
        c if c.is_ascii_alphanumeric() || c == '_' => Script::Latin,
        '\u{0400}'..='\u{04FF}' => Script::Cyrillic,
        '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}' => {
            Script::Hangul
        }
        _ => Script::Other,
    }
}

/// True when `after` starts with a character that would extend `spelling`
/// into a longer word of the same script.
fn continues_word(spelling: &str, after: &str) -> bool {
    let (Some(last), Some(next)) = (spelling.chars().last(), after.chars().next()) else {
        return false;
    };
    let script = script_of(last);
    script != Script::Other && script == script_of(next)
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Byte length of `prefix` at the start of `text`, compared case-insensitively.
fn prefix_len_ignore_case(text: &str, prefix: &str) -> Option<usize> {
    let mut text_chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = text_chars.next()?;
        if !chars_eq_ignore_case(actual, expected) {
            return None;
        }
    }
    Some(text_chars.next().map_or(text.len(), |(idx, _)| idx))
}

// =============================================================================
// Unit Tests
// =============================================================================
