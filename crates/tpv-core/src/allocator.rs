//! # Stock Depletion
//!
//! The deduction algorithms applied when a settled sale reduces stock.
//! Two policies share the same stock shapes but differ by channel:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Depletion Policies                               │
//! │                                                                         │
//! │  TARGETED (physical channel, pinned store)                              │
//! │    by_store [t1: 5] [t2: 3], sell 2 at t2                              │
//! │       → [t1: 5] [t2: 1]          (only the pinned bucket, no spread)   │
//! │                                                                         │
//! │  PROPORTIONAL (online channel, no pinned store)                         │
//! │    by_store [t1: 5] [t2: 3], sell 6                                    │
//! │       → [t1: 0] [t2: 2]          (greedy, stored bucket order)         │
//! │    by_store [t1: 5] [t2: 3], sell 10                                   │
//! │       → [t1: 0] [t2: 0], remaining 2   (silent under-deduction)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! The proportional policy never fails and never drives a bucket
//! below zero: when the requested quantity exceeds what is available
//! it silently leaves `remaining > 0`, under-depleting relative to
//! the request. The targeted policy is the opposite: it subtracts
//! unguarded from the pinned bucket, relying on the cart-time
//! availability check as the only guard. Both behaviors are observed
//! characteristics of this design and are preserved as-is; callers
//! inspect [`DepletionOutcome::remaining`] and log or reconcile.

use serde::{Deserialize, Serialize};

use crate::stock::StockLevels;

// =============================================================================
// Policy & Outcome
// =============================================================================

/// Which depletion algorithm a settlement applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepletionPolicy {
    /// Subtract only from the bucket matching the pinned store
    /// (physical channel). Unguarded: the bucket may go negative.
    Targeted { store_id: String },

    /// Spread the deduction over buckets in stored order, clamping
    /// each at zero (online channel).
    Proportional,
}

/// What a depletion actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepletionOutcome {
    /// Units actually subtracted.
    pub taken: i64,

    /// Units requested but not subtracted. Non-zero means the ledger
    /// was oversold (proportional) or the pinned store had no bucket
    /// (targeted).
    pub remaining: i64,
}

impl DepletionOutcome {
    /// True when the full requested quantity was subtracted.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

// =============================================================================
// Depletion
// =============================================================================

/// Subtracts `quantity` units from a stock representation under the
/// given policy.
///
/// The aggregate figure needs no separate recomputation: it is
/// [`StockLevels::total`], always derived from the buckets.
pub fn deplete(
    levels: &mut StockLevels,
    policy: &DepletionPolicy,
    quantity: i64,
) -> DepletionOutcome {
    match policy {
        DepletionPolicy::Targeted { store_id } => deplete_targeted(levels, store_id, quantity),
        DepletionPolicy::Proportional => deplete_proportional(levels, quantity),
    }
}

/// Physical-channel depletion: the pinned store's bucket, unguarded.
fn deplete_targeted(levels: &mut StockLevels, store_id: &str, quantity: i64) -> DepletionOutcome {
    match levels {
        StockLevels::Unique { on_hand } => {
            *on_hand -= quantity;
            DepletionOutcome {
                taken: quantity,
                remaining: 0,
            }
        }
        StockLevels::ByStore { buckets } => {
            match buckets.iter_mut().find(|b| b.store_id == store_id) {
                Some(bucket) => {
                    bucket.on_hand -= quantity;
                    DepletionOutcome {
                        taken: quantity,
                        remaining: 0,
                    }
                }
                // No bucket for the pinned store: nothing to subtract from
                None => DepletionOutcome {
                    taken: 0,
                    remaining: quantity,
                },
            }
        }
        StockLevels::ByGroup { groups } => {
            match groups
                .iter_mut()
                .find(|g| g.store_ids.iter().any(|s| s == store_id))
            {
                Some(group) => {
                    group.on_hand -= quantity;
                    DepletionOutcome {
                        taken: quantity,
                        remaining: 0,
                    }
                }
                None => DepletionOutcome {
                    taken: 0,
                    remaining: quantity,
                },
            }
        }
    }
}

/// Online-channel depletion: greedy over buckets in stored order,
/// clamped at zero per bucket.
fn deplete_proportional(levels: &mut StockLevels, quantity: i64) -> DepletionOutcome {
    let mut remaining = quantity;

    match levels {
        StockLevels::Unique { on_hand } => {
            let take = (*on_hand).max(0).min(remaining);
            *on_hand -= take;
            remaining -= take;
        }
        StockLevels::ByStore { buckets } => {
            for bucket in buckets.iter_mut() {
                if remaining == 0 {
                    break;
                }
                let take = bucket.on_hand.max(0).min(remaining);
                bucket.on_hand -= take;
                remaining -= take;
            }
        }
        StockLevels::ByGroup { groups } => {
            for group in groups.iter_mut() {
                if remaining == 0 {
                    break;
                }
                let take = group.on_hand.max(0).min(remaining);
                group.on_hand -= take;
                remaining -= take;
            }
        }
    }

    DepletionOutcome {
        taken: quantity - remaining,
        remaining,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
