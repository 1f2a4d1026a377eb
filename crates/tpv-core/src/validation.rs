//! # Validation Module
//!
//! Checkout rule validation for TPV.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Host UI                                                      │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - checkout rule validation                       │
//! │  ├── Channel requirements (store pinned, customer named)               │
//! │  └── Blocks submission; nothing persisted when it fails                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Settlement engine                                            │
//! │  └── Store-collaborator failures (typed, propagated)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::cart::Cart;
use crate::error::ValidationError;
use crate::types::Channel;
use crate::MAX_DISCOUNT_BPS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Checkout Validators
// =============================================================================

/// Validates everything a checkout submission requires.
///
/// ## Rules
/// - The cart must have at least one line
/// - Physical channel: a store must be pinned
/// - Online channel: a customer name must be given (the only customer
///   data that channel records)
pub fn validate_checkout(
    cart: &Cart,
    channel: Channel,
    store_id: Option<&str>,
    customer_name: Option<&str>,
) -> ValidationResult<()> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    match channel {
        Channel::Physical => {
            if store_id.map_or(true, |s| s.trim().is_empty()) {
                return Err(ValidationError::Required {
                    field: "store".to_string(),
                });
            }
        }
        Channel::Online => {
            if customer_name.map_or(true, |n| n.trim().is_empty()) {
                return Err(ValidationError::Required {
                    field: "customer name".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Validates a cart-level discount rate.
///
/// ## Rules
/// - Must be between 0 and 10000 basis points (0% to 100%)
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > MAX_DISCOUNT_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: MAX_DISCOUNT_BPS as i64,
        });
    }

    Ok(())
}

/// Validates an IVA rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
/// - Typical values are 0-2100 (exempt to general rate)
pub fn validate_iva_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "iva_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
