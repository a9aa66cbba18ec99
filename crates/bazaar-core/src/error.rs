//! # Error Types
//!
//! Pricing error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── PricingError     - Rule resolution and payload failures           │
//! │  └── ValidationError  - Field-level input checks                       │
//! │                                                                         │
//! │  bazaar-engine errors (separate crate)                                 │
//! │  └── EngineError      - Transport, storage, config failures            │
//! │                                                                         │
//! │  Flow: PricingError → EngineError → log / fallback                     │
//! │        ValidationError → CartChange::Rejected                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these errors ever reach a shopper: the engine degrades to
//! defaults and keeps producing totals.

use thiserror::Error;

use crate::types::ConfigKind;

// =============================================================================
// Pricing Error
// =============================================================================

/// Pricing rule errors.
#[derive(Debug, Error)]
pub enum PricingError {
    /// No active delivery tier covers the cart weight.
    ///
    /// ## When This Occurs
    /// Only under [`UnmatchedWeightPolicy::Reject`](crate::UnmatchedWeightPolicy);
    /// the permissive policy charges nothing instead.
    #[error("No active delivery tier covers {weight} g")]
    NoDeliveryTier { weight: f64 },

    /// A remote rule payload did not have the expected shape.
    ///
    /// ## When This Occurs
    /// - Top-level value is neither an array nor a wrapping object
    /// - A required field is missing or not numeric
    /// - A number is negative where only non-negative values make sense
    #[error("Malformed {kind} payload: {reason}")]
    Malformed { kind: ConfigKind, reason: String },
}

impl PricingError {
    /// Shorthand for a malformed payload error.
    pub fn malformed(kind: ConfigKind, reason: impl Into<String>) -> Self {
        PricingError::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Value would push the cart past what it can price.
    #[error("{field} is too large")]
    TooLarge { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with PricingError.
pub type PricingResult<T> = Result<T, PricingError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PricingError::NoDeliveryTier { weight: 12_500.0 };
        assert_eq!(err.to_string(), "No active delivery tier covers 12500 g");

        let err = PricingError::malformed(ConfigKind::Tax, "gstRate is missing");
        assert_eq!(err.to_string(), "Malformed tax payload: gstRate is missing");
    }

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::Required {
            field: "id".to_string(),
        };
        assert_eq!(err.to_string(), "id is required");

        let err = ValidationError::TooLarge {
            field: "quantity".to_string(),
        };
        assert_eq!(err.clone().to_string(), "quantity is too large");
    }
}
