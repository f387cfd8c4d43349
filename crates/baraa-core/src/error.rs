//! # Error Types
//!
//! Domain-specific error types for baraa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  baraa-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Pricing configuration / input failures         │
//! │  └── EstimationError  - Weight estimation collaborator failures        │
//! │                                                                         │
//! │  CLI errors (apps/cli)                                                 │
//! │  └── ConfigError      - pricing.toml / environment problems            │
//! │                                                                         │
//! │  NOT errors: unparseable text, rejected multipliers, missing rates.    │
//! │  Those degrade to numbers (weight 0, rate 0), they never propagate.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, value, model)
//! 3. Errors are enum variants, never String
//! 4. The weight and price contracts themselves never return these

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
///
/// Raised only at the configuration and collaborator boundaries; the
/// weight/price functions absorb malformed input instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A shipping mode string did not name a known mode.
    #[error("Unknown shipping mode: '{0}'. Valid options: ground, air")]
    InvalidShippingMode(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Estimation collaborator error (wraps EstimationError).
    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for pricing configuration and CLI input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Invalid format (e.g. NaN, inverted window).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Estimation Error
// =============================================================================

/// Failures of the external weight estimation collaborator.
///
/// ## Handling
/// ```text
/// estimator.estimate(request)
///      │
///      ├── Ok(response) ──► accept_estimate() ──► weight or sentinel
///      │
///      └── Err(EstimationError) ──► logged, sentinel returned
/// ```
#[derive(Debug, Error)]
pub enum EstimationError {
    /// The transport failed (connection, HTTP status, timeout).
    #[error("Estimation transport failed: {0}")]
    Transport(String),

    /// The collaborator answered with something that is not the agreed JSON.
    #[error("Malformed estimation response: {0}")]
    MalformedResponse(String),

    /// No collaborator is configured (e.g. missing API key).
    #[error("Estimation collaborator unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for EstimationError {
    fn from(err: serde_json::Error) -> Self {
        EstimationError::MalformedResponse(err.to_string())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
