//! # Weight Engine
//!
//! Shipping weight inference from multilingual product text.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  token      text ──► Number / Unit / Multiplier / Word / Punct spans    │
//! │  parser     spans ──► primary weight × accepted pack counts            │
//! │  extractor  ProductRecord ──► WeightEstimate (priority chain)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod extractor;
pub mod parser;
pub mod token;

pub use extractor::{estimate_weight, WeightExtractor};
pub use parser::{
    chain_span, displayed_kilograms, format_weight, kilograms_from_label, parse_weight_from_text,
    parse_weight_with, MultiplierRejection, ParsedWeight,
};
pub use token::{tokenize, Token, TokenKind};
