//! # Validation Module
//!
//! Input validation for pricing configuration and CLI arguments.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Host (CLI config loader, admin tools)                        │
//! │  ├── pricing.toml / env values                                         │
//! │  └── THIS MODULE: reject bad configuration up front                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Weight / price functions                                     │
//! │  ├── Never fail                                                        │
//! │  └── Degrade bad numbers to 0 (fail-soft)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The price functions tolerate anything; these checks exist so a host can
//! refuse to *start* with a misconfigured exchange rate instead of silently
//! pricing everything at 0.
//!
//! ## Usage
//! ```rust
//! use baraa_core::validation::{validate_exchange_rate, validate_quantity};
//!
//! assert!(validate_exchange_rate(2.55).is_ok());
//! assert!(validate_exchange_rate(0.0).is_err());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::PlausibilityWindow;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Pricing Validators
// =============================================================================

/// Validates an exchange rate (tögrög per won).
///
/// ## Rules
/// - Must be a finite number
/// - Must be greater than zero
pub fn validate_exchange_rate(rate: f64) -> ValidationResult<()> {
    require_finite("exchange_rate", rate)?;
    if rate <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "exchange_rate".to_string(),
        });
    }
    Ok(())
}

/// Validates a shipping rate in won per kilogram.
///
/// ## Rules
/// - Must be a finite number
/// - Must not be negative (0 means "free shipping for this mode")
pub fn validate_shipping_rate(field: &str, rate: f64) -> ValidationResult<()> {
    require_finite(field, rate)?;
    if rate < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: f64::MAX,
        });
    }
    Ok(())
}

/// Validates a base price in won.
///
/// ## Rules
/// - Must be a finite number
/// - Must not be negative (0 is allowed and means "price unknown")
pub fn validate_base_price(price: f64) -> ValidationResult<()> {
    require_finite("base_price", price)?;
    if price < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "base_price".to_string(),
            min: 0.0,
            max: f64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Example
/// ```rust
/// use baraa_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 || qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1.0,
            max: f64::from(MAX_ITEM_QUANTITY),
        });
    }
    Ok(())
}

// =============================================================================
// Estimation Validators
// =============================================================================

/// Validates a plausibility window.
///
/// ## Rules
/// - Bounds must be finite
/// - min_kg must not be negative
/// - min_kg must be below max_kg
pub fn validate_plausibility_window(window: &PlausibilityWindow) -> ValidationResult<()> {
    require_finite("min_kg", window.min_kg)?;
    require_finite("max_kg", window.max_kg)?;

    if window.min_kg < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "min_kg".to_string(),
            min: 0.0,
            max: window.max_kg,
        });
    }
    if window.min_kg >= window.max_kg {
        return Err(ValidationError::InvalidFormat {
            field: "plausibility_window".to_string(),
            reason: format!(
                "min_kg ({}) must be below max_kg ({})",
                window.min_kg, window.max_kg
            ),
        });
    }
    Ok(())
}

/// Validates a required text setting such as a model name.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn require_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
