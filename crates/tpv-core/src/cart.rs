//! # Cart
//!
//! Holds the in-progress selection of sellable candidates for one
//! session, and owns quantity clamping plus tax/discount total
//! computation.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Session Action           Cart Operation          State Change          │
//! │  ──────────────           ──────────────          ────────────          │
//! │                                                                         │
//! │  Pick candidate ─────────► add(candidate) ──────► qty+1 (≤ max_stock)  │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ───► clamp(0..=max)       │
//! │                                                    (0 removes line)     │
//! │  Remove line ────────────► remove() ────────────► line dropped         │
//! │                                                                         │
//! │  Checkout ───────────────► totals(discount) ────► pro-rata discount    │
//! │                                                    + per-line IVA       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reservation-Free By Design
//! Adding to the cart checks availability against a SNAPSHOT taken
//! when the line was created and never mutates stock; only settlement
//! mutates stock. Two sessions can therefore both pass the cart-time
//! check and oversell - this is a deliberate trade-off of the design,
//! preserved here, not a defect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Candidate;
use crate::error::{CoreError, CoreResult};
use crate::money::{allocate_share, Money, Rate};
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// ## Design Notes
/// Everything is frozen from the candidate at add time: price, IVA
/// rate, label, and - critically - `max_stock`, the availability
/// snapshot that caps this line's quantity until settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Composite identity: product id, or `{product_id}_variant_{i}`.
    pub cart_id: String,

    pub product_id: String,

    /// Index into the product's variant list, if any.
    pub variant_index: Option<usize>,

    /// Display label at add time (frozen).
    pub label: String,

    /// Unit price in cents at add time (frozen).
    pub unit_price_cents: i64,

    /// IVA rate in basis points at add time (frozen).
    pub iva_bps: u32,

    /// Quantity in cart. Always 1..=max_stock.
    pub quantity: i64,

    /// Availability snapshot captured when the line was created.
    /// Not re-checked until settlement.
    pub max_stock: i64,

    /// When this line was added to the cart.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a quantity-1 line from a candidate.
    fn from_candidate(candidate: &Candidate, at: DateTime<Utc>) -> Self {
        CartLine {
            cart_id: candidate.cart_id.clone(),
            product_id: candidate.product_id.clone(),
            variant_index: candidate.variant_index,
            label: candidate.label.clone(),
            unit_price_cents: candidate.unit_price_cents,
            iva_bps: candidate.iva_bps,
            quantity: 1,
            max_stock: candidate.available,
            added_at: at,
        }
    }

    /// Line subtotal (unit price × quantity), before discount and IVA.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Per-line breakdown produced by [`Cart::totals`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineShare {
    pub cart_id: String,

    /// This line's share of the discounted subtotal.
    pub net_cents: i64,

    /// IVA computed on the discounted share.
    pub iva_cents: i64,
}

/// Cart totals summary.
///
/// Figures follow the settlement algorithm exactly: the cart-level
/// discount is spread pro-rata over the lines, and each line's IVA is
/// computed on its discounted share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub discount_bps: u32,
    pub discount_cents: i64,
    pub subtotal_after_discount_cents: i64,
    pub iva_cents: i64,
    pub total_cents: i64,

    /// Per-line shares, in line order. Settlement copies these onto
    /// the sale items.
    pub lines: Vec<LineShare>,
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress selection for one session.
///
/// ## Invariants
/// - Lines are unique by `cart_id` (adding the same candidate bumps quantity)
/// - `1 <= quantity <= max_stock` for every line (0 removes the line)
/// - Cart operations never mutate stock (settlement's job, exclusively)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a candidate to the cart.
    ///
    /// ## Behavior
    /// - Line with the same `cart_id` present: quantity +1, clamped to
    ///   `max_stock`. Already at max → `InsufficientStock`, cart
    ///   untouched.
    /// - Otherwise: new quantity-1 line whose `max_stock` snapshots
    ///   the candidate's availability at this instant.
    pub fn add(&mut self, candidate: &Candidate) -> CoreResult<()> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.cart_id == candidate.cart_id) {
            if line.quantity >= line.max_stock {
                return Err(CoreError::InsufficientStock {
                    label: line.label.clone(),
                    available: line.max_stock,
                    requested: line.quantity + 1,
                });
            }
            line.quantity += 1;
            return Ok(());
        }

        if candidate.available < 1 {
            return Err(CoreError::InsufficientStock {
                label: candidate.label.clone(),
                available: candidate.available,
                requested: 1,
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_candidate(candidate, Utc::now()));
        Ok(())
    }

    /// Adjusts a line's quantity by a delta, clamped to
    /// `0..=max_stock`. A resulting quantity of 0 removes the line
    /// without error.
    ///
    /// Returns the new quantity (0 when the line was removed).
    pub fn update_quantity(&mut self, cart_id: &str, delta: i64) -> CoreResult<i64> {
        let index = self
            .lines
            .iter()
            .position(|l| l.cart_id == cart_id)
            .ok_or_else(|| CoreError::LineNotInCart(cart_id.to_string()))?;

        let line = &mut self.lines[index];
        let new_quantity = (line.quantity + delta).clamp(0, line.max_stock);

        if new_quantity == 0 {
            self.lines.remove(index);
            return Ok(0);
        }

        line.quantity = new_quantity;
        Ok(new_quantity)
    }

    /// Removes a line unconditionally. Unknown ids are a no-op.
    pub fn remove(&mut self, cart_id: &str) {
        self.lines.retain(|l| l.cart_id != cart_id);
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Computes cart totals under a cart-level percentage discount.
    ///
    /// ## Algorithm
    /// ```text
    /// subtotal       = Σ line.subtotal
    /// discount       = subtotal × discount
    /// after_discount = subtotal - discount
    /// per line:
    ///   share    = line.subtotal / subtotal × after_discount   (0 if subtotal = 0)
    ///   line_iva = share × line.iva_rate
    /// iva   = Σ line_iva
    /// total = after_discount + iva
    /// ```
    ///
    /// The online channel never applies a discount - callers on that
    /// channel pass [`Rate::zero`]. This asymmetry between channels is
    /// intentional.
    pub fn totals(&self, discount: Rate) -> CartTotals {
        let subtotal: Money = self
            .lines
            .iter()
            .fold(Money::zero(), |acc, l| acc + l.subtotal());

        let discount_amount = subtotal.apply_rate(discount);
        let after_discount = subtotal - discount_amount;

        let mut iva_total = Money::zero();
        let mut lines = Vec::with_capacity(self.lines.len());

        for line in &self.lines {
            let share = allocate_share(line.subtotal(), subtotal, after_discount);
            let line_iva = share.apply_rate(Rate::from_bps(line.iva_bps));
            iva_total += line_iva;
            lines.push(LineShare {
                cart_id: line.cart_id.clone(),
                net_cents: share.cents(),
                iva_cents: line_iva.cents(),
            });
        }

        CartTotals {
            subtotal_cents: subtotal.cents(),
            discount_bps: discount.bps(),
            discount_cents: discount_amount.cents(),
            subtotal_after_discount_cents: after_discount.cents(),
            iva_cents: iva_total.cents(),
            total_cents: (after_discount + iva_total).cents(),
            lines,
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
