//! # tpv-engine: Settlement Layer for TPV
//!
//! Converts a cart into a persisted sale, stock mutation, invoice,
//! and customer aggregate update - one logical operation spread over
//! independent store calls.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Settlement Sequence                                 │
//! │                                                                         │
//! │  Cart snapshot                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. validate + recompute totals          (pure, tpv-core)              │
//! │  2. persist Sale                         (SaleStore)                   │
//! │  3. deplete stock per line, persist      (ProductStore)                │
//! │  4. update customer aggregates           (CustomerStore, physical)     │
//! │  5. project + persist Invoice            (InvoiceStore)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Sale returned to the caller                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Contract
//! Each step is an independent persistence call; there is NO rollback
//! across steps. A failure after the sale is persisted surfaces as
//! [`error::EngineError::PartialCompletion`], telling the caller
//! exactly how far the sequence got, so "nothing happened" is always
//! distinguishable from "something happened but settlement did not
//! finish".
//!
//! ## Known Race (Preserved)
//! The stock model is reservation-free: availability is checked when
//! a line enters the cart and mutated only at settlement, with no
//! hold in between and no locking across sessions. Two concurrent
//! settlements against the same product can both observe
//! pre-depletion stock and oversell (lost update). This is an
//! explicit characteristic of the design, kept as-is; a storage
//! backend may layer optimistic concurrency (a version column with
//! conditional update) behind the store traits, but the engine does
//! not require it.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod repository;
pub mod settlement;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{EngineError, EngineResult, SettlementStep};
pub use memory::MemoryStores;
pub use repository::{
    CustomerStore, InvoiceStore, ProductStore, SaleStore, StoreError, StoreRegistry, StoreResult,
};
pub use settlement::{SettlementEngine, SettlementRequest};
