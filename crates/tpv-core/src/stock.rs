//! # Stock Representations & Resolver
//!
//! A product (or one of its variants) partitions its available
//! quantity under exactly one of three strategies:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Stock Representation Strategies                     │
//! │                                                                         │
//! │  Unique     one undivided pool         on_hand: 12                     │
//! │                                                                         │
//! │  ByStore    one bucket per store       [tienda-1: 5] [tienda-2: 3]     │
//! │                                                                         │
//! │  ByGroup    named store groupings      [norte {t1,t2}: 8]              │
//! │                                        [sur   {t3}:    4]              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The strategies are mutually exclusive, so they are modeled as one
//! sum type with exhaustive matching. The aggregate stock figure is
//! `total()`, computed from the active representation — it cannot
//! drift from the sum of its buckets because it is never stored.
//!
//! ## Channel Semantics
//! The two resolver operations exist because the two sale channels
//! need different answers from the same stored shape:
//! - Physical sales are pinned to one store → [`StockLevels::resolve_for_store`]
//! - Online sales draw from the whole ledger → [`StockLevels::resolve_total`]

use serde::{Deserialize, Serialize};

// =============================================================================
// Buckets
// =============================================================================

/// One stock entry within a [`StockLevels::ByStore`] representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreBucket {
    /// Store this bucket belongs to.
    pub store_id: String,

    /// Units available in that store.
    pub on_hand: i64,
}

/// One stock entry within a [`StockLevels::ByGroup`] representation.
///
/// A group pools stock for a named set of stores (e.g. a region whose
/// stores replenish from the same warehouse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreGroup {
    /// Display name of the group (e.g. "norte").
    pub name: String,

    /// Stores that sell from this group's pool.
    pub store_ids: Vec<String>,

    /// Units available across the group.
    pub on_hand: i64,
}

// =============================================================================
// Stock Levels
// =============================================================================

/// How a product's or variant's available quantity is partitioned.
///
/// ## Invariants
/// - Exactly one representation is active (enforced by the type).
/// - Bucket/group order is stable and meaningful: proportional
///   depletion consumes buckets in stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StockLevels {
    /// A single undivided pool shared by every store.
    Unique {
        on_hand: i64,
    },

    /// Independent per-store buckets.
    ByStore {
        buckets: Vec<StoreBucket>,
    },

    /// Pools shared by named groups of stores.
    ByGroup {
        groups: Vec<StoreGroup>,
    },
}

impl StockLevels {
    /// Resolves the quantity available to one specific store.
    ///
    /// Used by the physical channel, where a sale is pinned to the
    /// store the cashier is operating.
    ///
    /// ## Rules
    /// - `Unique` → the single pool
    /// - `ByStore` → the bucket whose store matches, else 0
    /// - `ByGroup` → the first group containing the store, else 0
    ///
    /// Never returns a negative quantity.
    pub fn resolve_for_store(&self, store_id: &str) -> i64 {
        let available = match self {
            StockLevels::Unique { on_hand } => *on_hand,
            StockLevels::ByStore { buckets } => buckets
                .iter()
                .find(|b| b.store_id == store_id)
                .map(|b| b.on_hand)
                .unwrap_or(0),
            StockLevels::ByGroup { groups } => groups
                .iter()
                .find(|g| g.store_ids.iter().any(|s| s == store_id))
                .map(|g| g.on_hand)
                .unwrap_or(0),
        };

        available.max(0)
    }

    /// Resolves the quantity available across all stores.
    ///
    /// Used by the online channel, which is not pinned to a store and
    /// draws from the whole ledger.
    ///
    /// Never returns a negative quantity.
    pub fn resolve_total(&self) -> i64 {
        let total = match self {
            StockLevels::Unique { on_hand } => *on_hand,
            StockLevels::ByStore { buckets } => buckets.iter().map(|b| b.on_hand).sum(),
            StockLevels::ByGroup { groups } => groups.iter().map(|g| g.on_hand).sum(),
        };

        total.max(0)
    }

    /// The aggregate stock figure.
    ///
    /// Same as [`resolve_total`](Self::resolve_total); kept as a named
    /// alias because callers reading reports ask for "total stock",
    /// not channel semantics.
    #[inline]
    pub fn total(&self) -> i64 {
        self.resolve_total()
    }

    /// An empty single pool. Useful as a starting point for new items.
    pub const fn empty() -> Self {
        StockLevels::Unique { on_hand: 0 }
    }
}

impl Default for StockLevels {
    fn default() -> Self {
        StockLevels::empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
