//! # tpv-core: Pure Business Logic for TPV
//!
//! This crate is the **heart** of TPV. It contains the inventory
//! resolution and sale math for a multi-channel retail operation
//! (staffed physical point of sale + unattended online ordering) as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         TPV Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Host application (POS screen / storefront)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ tpv-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  stock   │ │ catalog  │ │   cart   │ │    allocator     │  │   │
//! │  │   │ resolve  │ │ expand   │ │  totals  │ │ deplete buckets  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  tpv-engine (Settlement Layer)                  │   │
//! │  │        Repository traits, settlement sequence, numbering        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Variant, Sale, Invoice, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Stock representations and the availability resolver
//! - [`catalog`] - Variant expansion into sellable candidates
//! - [`cart`] - Cart lines, quantity clamping, tax/discount totals
//! - [`allocator`] - Targeted and proportional stock depletion
//! - [`invoice`] - One-way Sale → Invoice projection
//! - [`validation`] - Checkout rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Sum Types Over Flags**: The three stock representations are one
//!    exhaustively-matched enum, never co-resident optional fields
//! 5. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tpv_core::money::{Money, Rate};
//! use tpv_core::stock::StockLevels;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(1050); // 10.50
//!
//! // IVA at 21%
//! let iva = price.apply_rate(Rate::from_bps(2100));
//! assert_eq!(iva.cents(), 221); // 2.205 rounds to 2.21
//!
//! // A single undivided stock pool
//! let stock = StockLevels::Unique { on_hand: 12 };
//! assert_eq!(stock.resolve_total(), 12);
//! assert_eq!(stock.resolve_for_store("any-store"), 12);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod invoice;
pub mod money;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tpv_core::Money` instead of
// `use tpv_core::money::Money`

pub use allocator::{deplete, DepletionOutcome, DepletionPolicy};
pub use cart::{Cart, CartLine, CartTotals};
pub use catalog::{expand_catalog, expand_product, Candidate, SellContext};
pub use error::{CoreError, ValidationError};
pub use invoice::invoice_from_sale;
pub use money::{Money, Rate};
pub use stock::{StockLevels, StoreBucket, StoreGroup};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Name used on invoices when no customer is identified.
///
/// ## Why a constant?
/// The online channel records only a free-text customer name, and the
/// physical channel may settle without any customer at all. Fiscal
/// documents still need an addressee, so the anonymous walk-in
/// placeholder is applied at invoice projection time.
pub const FINAL_CONSUMER_NAME: &str = "Consumidor final";

/// Maximum distinct lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
/// Can be made configurable per-tenant in future versions.
pub const MAX_CART_LINES: usize = 100;

/// Maximum discount in basis points (100.00%)
///
/// ## Business Reason
/// A discount over 100% would produce negative settlement totals.
pub const MAX_DISCOUNT_BPS: u32 = 10_000;
