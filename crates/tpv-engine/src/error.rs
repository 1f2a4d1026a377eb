//! # Engine Error Types
//!
//! Error types for the settlement layer.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Store backend failure (StoreError)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  before any write committed?                                           │
//! │   ├── yes → EngineError::Persistence    "nothing happened"             │
//! │   └── no  → EngineError::PartialCompletion                             │
//! │              "something happened but settlement did not finish"        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller reconciles (the engine never retries or rolls back)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use thiserror::Error;

use tpv_core::error::ValidationError;

use crate::repository::StoreError;

// =============================================================================
// Settlement Step
// =============================================================================

/// Which step of the settlement sequence an error refers to.
///
/// Order matters: every step before the failed one has already
/// committed to its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStep {
    /// Writing the Sale record.
    PersistSale,
    /// Depleting stock and writing the updated product.
    DepleteStock,
    /// Updating the linked customer's aggregates.
    UpdateCustomer,
    /// Writing the projected invoice.
    PersistInvoice,
}

impl fmt::Display for SettlementStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettlementStep::PersistSale => "persist sale",
            SettlementStep::DepleteStock => "deplete stock",
            SettlementStep::UpdateCustomer => "update customer",
            SettlementStep::PersistInvoice => "persist invoice",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Settlement layer errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Checkout validation failed. Nothing was persisted; submission
    /// is blocked until the input is corrected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A collaborator store failed before anything committed.
    /// "Nothing happened" - the caller may simply retry.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The settlement sequence failed AFTER at least one persistence
    /// side effect already committed (e.g. stock depleted but invoice
    /// not yet written). There is no automatic compensating rollback;
    /// the caller must reconcile using the committed sale id.
    #[error("Settlement of sale {sale_id} incomplete: failed at step '{step}': {source}")]
    PartialCompletion {
        /// The sale record that already committed.
        sale_id: String,
        /// The step that failed.
        step: SettlementStep,
        #[source]
        source: StoreError,
    },
}

impl EngineError {
    /// Wraps a store failure that happened after the sale committed.
    pub(crate) fn partial(sale_id: &str, step: SettlementStep, source: StoreError) -> Self {
        EngineError::PartialCompletion {
            sale_id: sale_id.to_string(),
            step,
            source,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_completion_message_names_step() {
        let err = EngineError::partial(
            "s1",
            SettlementStep::PersistInvoice,
            StoreError::Backend("disk full".to_string()),
        );
        let msg = err.to_string();
        assert!(msg.contains("s1"));
        assert!(msg.contains("persist invoice"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_validation_converts() {
        let err: EngineError = ValidationError::EmptyCart.into();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
