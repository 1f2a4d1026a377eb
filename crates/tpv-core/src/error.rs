//! # Error Types
//!
//! Domain-specific error types for tpv-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tpv-core errors (this file)                                           │
//! │  ├── CoreError        - Cart/domain rule violations                    │
//! │  └── ValidationError  - Checkout input validation failures             │
//! │                                                                         │
//! │  tpv-engine errors (separate crate)                                    │
//! │  ├── StoreError       - Collaborator store failures                    │
//! │  └── EngineError      - Settlement failures, incl. partial completion  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (label, quantities, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations during cart
/// composition. They are reported to the session but never abort it:
/// the cashier (or shopper) corrects the line and continues.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart mutation would exceed the availability snapshot taken
    /// when the line was created.
    ///
    /// ## When This Occurs
    /// - Adding a candidate whose line already sits at `max_stock`
    /// - Adding a candidate that resolved to zero availability
    ///
    /// Note the snapshot semantics: availability is captured at add
    /// time and NOT re-checked until settlement (reservation-free).
    #[error("Insufficient stock for {label}: available {available}, requested {requested}")]
    InsufficientStock {
        label: String,
        available: i64,
        requested: i64,
    },

    /// The referenced line is not in the cart.
    #[error("Line {0} not in cart")]
    LineNotInCart(String),

    /// Cart has exceeded maximum allowed distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Checkout input validation errors.
///
/// These block submission of a settlement; nothing has been persisted
/// when one is raised.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Checkout attempted with no lines in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A required field is missing or empty.
    ///
    /// Raised for a physical checkout without a selected store, and
    /// an online checkout without the customer name.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value carries an unusable value.
    #[error("{field} has invalid value: {reason}")]
    Invalid { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            label: "Camiseta (rojo / M)".to_string(),
            available: 3,
            requested: 4,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Camiseta (rojo / M): available 3, requested 4"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "store".to_string(),
        };
        assert_eq!(err.to_string(), "store is required");

        assert_eq!(ValidationError::EmptyCart.to_string(), "Cart is empty");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptyCart;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
