//! # Money Module
//!
//! Currency display for the two currencies a price passes through.
//!
//! ## Currency Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Base price (KRW, ₩)  + weight × rate (KRW, ₩)                          │
//! │            │                                                            │
//! │            ▼  × exchange rate (MNT per KRW)                             │
//! │  Final price (MNT, ₮)  rounded to a whole tögrög                        │
//! │                                                                         │
//! │  Intermediate KRW amounts stay fractional (a 0.6kg parcel at 2.5₩/kg    │
//! │  costs 1.5₩), only the final MNT amount is an integer.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use baraa_core::money::{format_amount, Currency};
//!
//! assert_eq!(format_amount(3300.0, Currency::Krw), "3,300₩");
//! assert_eq!(format_amount(1.5, Currency::Krw), "1.5₩");
//! assert_eq!(format_amount(8250.0, Currency::Mnt), "8,250₮");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Fraction digits shown at most, like the storefront's number formatting.
const MAX_FRACTION_DIGITS: u32 = 3;

// =============================================================================
// Currency
// =============================================================================

/// A currency shown in price breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Currency {
    /// Korean won, the source currency of every base price.
    Krw,
    /// Mongolian tögrög, the currency customers pay in.
    Mnt,
}

impl Currency {
    /// The symbol appended to amounts.
    pub const fn symbol(self) -> char {
        match self {
            Currency::Krw => '₩',
            Currency::Mnt => '₮',
        }
    }

    /// ISO 4217 code.
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Krw => "KRW",
            Currency::Mnt => "MNT",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats an amount with thousands separators, at most three fraction
/// digits (trailing zeros dropped) and the currency symbol.
///
/// Non-finite amounts format as zero.
pub fn format_amount(value: f64, currency: Currency) -> String {
    format!("{}{}", group_thousands(value), currency.symbol())
}

/// Formats a whole amount, e.g. a final MNT price.
pub fn format_whole_amount(value: i64, currency: Currency) -> String {
    let digits = group_digits(&value.unsigned_abs().to_string());
    let sign = if value < 0 { "-" } else { "" };
    format!("{sign}{digits}{}", currency.symbol())
}

fn group_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let scale = 10u64.pow(MAX_FRACTION_DIGITS);
    let scaled = (value.abs() * scale as f64).round() as u64;
    let (whole, fraction) = (scaled / scale, scaled % scale);

    let mut out = String::new();
    if value < 0.0 && scaled > 0 {
        out.push('-');
    }
    out.push_str(&group_digits(&whole.to_string()));
    if fraction > 0 {
        let digits = format!("{fraction:0width$}", width = MAX_FRACTION_DIGITS as usize);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Inserts a comma every three digits from the right.
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
