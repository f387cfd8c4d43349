//! # baraa-core: Shipping Weight & Price Logic for Baraa
//!
//! This crate is the **heart** of the Baraa storefront's pricing. It infers a
//! shipping weight from multilingual (Korean/Mongolian/English/Cyrillic)
//! product text and turns won prices into tögrög prices, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Baraa Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Storefront UI / Cart / Admin bulk tools               │   │
//! │  │     product cards ──► cart totals ──► weight corrections        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ TypeScript bindings / CLI             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ baraa-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  weight   │  │  pricing  │  │ estimation│  │   audit   │  │   │
//! │  │   │ tokenizer │  │ Contract A│  │ contract  │  │  issue    │  │   │
//! │  │   │ parser    │  │ Contract B│  │ fallback  │  │ detection │  │   │
//! │  │   │ extractor │  │ catalog   │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │        locale tables • money display • validation              │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ WeightEstimator trait                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            Host-provided estimation collaborator (HTTP)         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`weight`] - Tokenizer, rule evaluator and resolution chain
//! - [`pricing`] - Final price and price breakdown
//! - [`estimation`] - Contract with the external estimation collaborator
//! - [`audit`] - Suspicious stored weights
//! - [`locale`] - Unit spellings, keywords and user-facing strings
//! - [`money`] - Currency display
//! - [`types`] - Product record and weight estimate
//! - [`error`] - Domain error types
//! - [`validation`] - Configuration validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Fail Soft**: Weight and price functions never fail; bad input degrades to 0
//! 4. **Charge What You Show**: shipping uses the weight the customer sees
//!
//! ## Example Usage
//!
//! ```rust
//! use baraa_core::pricing::{calculate_final_price, PriceContext, ShippingRateTable};
//! use baraa_core::{estimate_weight, ProductRecord};
//!
//! let product = ProductRecord::titled("Coffee Mix 500g x 6");
//!
//! let weight = estimate_weight(&product);
//! assert_eq!(weight.provenance, "500g x 6 = 3kg");
//!
//! // (10,000₩ + 3kg × 1,000₩) × 2.5
//! let ctx = PriceContext::new(10_000.0, 2.5).with_rates(ShippingRateTable::new(1000.0, 4000.0));
//! assert_eq!(calculate_final_price(&product, &ctx), 32_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod error;
pub mod estimation;
pub mod locale;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod weight;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use baraa_core::estimate_weight` instead of
// `use baraa_core::weight::extractor::estimate_weight`

pub use error::{CoreError, CoreResult, EstimationError, ValidationError};
pub use locale::Locale;
pub use pricing::{PriceBreakdown, PriceContext, ShippingMode, ShippingRateTable};
pub use types::*;
pub use weight::{estimate_weight, parse_weight_from_text, WeightExtractor};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Exchange rate used when none is configured (tögrög per won).
pub const DEFAULT_EXCHANGE_RATE: f64 = 2.55;

/// Maximum quantity of a single item in a cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Specification values shorter than this (in characters) are shown as-is
/// when no weight can be computed from them.
pub const SPEC_PASSTHROUGH_MAX_CHARS: usize = 50;

/// Shipping markup assumed in online prices when the estimator gives none (won).
pub const DEFAULT_WAREHOUSE_MARKUP: f64 = 2000.0;
