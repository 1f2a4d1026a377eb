//! # Domain Types
//!
//! Core domain types used throughout TPV.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  sale_number    │   │  invoice_number │       │
//! │  │  stock (enum)   │   │  channel        │   │  base_imponible │       │
//! │  │  variants       │   │  items          │   │  lines (mirror) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Channel      │   │    Customer     │   │     Store       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Physical       │   │  purchase_count │   │  kind           │       │
//! │  │  Online         │   │  total_purch.   │   │  is_active      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for store relations
//! - Business ID: (sku, sale_number, invoice_number) - human-readable
//!
//! ## Mutation Authority
//! Product and variant **stock fields are mutated exclusively by the
//! settlement engine**, never by cart operations. The cart checks
//! availability at add time but holds nothing (reservation-free).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};
use crate::stock::StockLevels;

// =============================================================================
// Channel
// =============================================================================

/// The sale channel a transaction goes through.
///
/// The two channels intentionally differ:
/// - Physical sales are pinned to one store, may carry a cart-level
///   discount, and may link a registered customer.
/// - Online sales aggregate stock across stores, never apply a
///   discount, and record only a free-text customer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Staffed physical point of sale.
    Physical,
    /// Unattended online ordering.
    Online,
}

// =============================================================================
// Store
// =============================================================================

/// What kind of selling location a store is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Physical,
    Online,
}

/// A selling location: a staffed till or an online storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub kind: StoreKind,
    /// Whether the store is open for business (soft delete).
    pub is_active: bool,
}

// =============================================================================
// Variant
// =============================================================================

/// One attribute of a variant, e.g. color=rojo or talla=M.
///
/// Stored as an ordered list (not a map) so labels render in the
/// order the catalog defined the attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAttribute {
    pub name: String,
    pub value: String,
}

/// A sellable variation of a product (e.g. a color/size combination).
///
/// A variant owns its own stock representation, independent of the
/// product's. Identification fields are optional overrides that fall
/// back to the product-level value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    /// Ordered attribute list, e.g. [color=rojo, talla=M].
    pub attributes: Vec<VariantAttribute>,

    /// Added to the product's base price (may be negative).
    pub price_adjustment_cents: i64,

    /// The variant's own stock representation.
    pub stock: StockLevels,

    /// Overrides the product SKU when present.
    pub sku: Option<String>,

    /// Overrides the product barcode when present.
    pub barcode: Option<String>,

    /// Overrides the product image when present.
    pub image: Option<String>,
}

impl Variant {
    /// Renders the attribute values as a display suffix, e.g. "rojo / M".
    pub fn attribute_label(&self) -> String {
        self.attributes
            .iter()
            .map(|a| a.value.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// Products without variants sell directly; products with variants
/// sell through their variants (each with its own stock and price
/// adjustment). Visibility sets control which stores may sell the
/// product per channel - an empty set means "all stores of that kind".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown on tickets and storefronts.
    pub name: String,

    /// Product image reference.
    pub image: Option<String>,

    /// Base price in cents, excluding IVA.
    pub price_cents: i64,

    /// IVA rate in basis points (2100 = 21%).
    pub iva_bps: u32,

    /// Replenishment threshold: total stock at or below this is "low".
    pub min_stock: i64,

    /// Whether the product is sellable at all (soft delete).
    pub is_active: bool,

    /// Stock representation for the product itself.
    /// Ignored for availability when `variants` is non-empty - each
    /// variant then carries its own levels.
    pub stock: StockLevels,

    /// Sellable variations. Empty = the product sells directly.
    pub variants: Vec<Variant>,

    /// Physical stores allowed to sell this product (empty = all).
    pub physical_store_ids: Vec<String>,

    /// Online storefronts allowed to sell this product (empty = all).
    pub online_store_ids: Vec<String>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the base price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the IVA rate.
    #[inline]
    pub fn iva_rate(&self) -> Rate {
        Rate::from_bps(self.iva_bps)
    }

    /// Whether this product sells through variants.
    #[inline]
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Aggregate stock across the active representation.
    ///
    /// For variant products this sums every variant's total.
    pub fn total_stock(&self) -> i64 {
        if self.has_variants() {
            self.variants.iter().map(|v| v.stock.total()).sum()
        } else {
            self.stock.total()
        }
    }

    /// Whether the product needs replenishment.
    pub fn is_low_stock(&self) -> bool {
        self.total_stock() <= self.min_stock
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer.
///
/// The aggregate fields (`total_purchases_cents`, `purchase_count`)
/// are updated only by settlement of a physical-channel sale with a
/// linked customer - the online channel records a free-text name only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Fiscal identification (NIF/CIF/cedula).
    pub identification: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Lifetime spend in cents.
    pub total_purchases_cents: i64,
    /// Number of settled purchases.
    pub purchase_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Folds a settled sale total into the customer aggregates.
    pub fn record_purchase(&mut self, total: Money, at: DateTime<Utc>) {
        self.total_purchases_cents += total.cents();
        self.purchase_count += 1;
        self.updated_at = at;
    }
}

// =============================================================================
// Payment Method & Sale Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Bank transfer (online orders).
    Transfer,
}

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been settled.
    Completed,
    /// Sale was cancelled after settlement.
    Cancelled,
}

// =============================================================================
// Sale
// =============================================================================

/// A line item in a settled sale.
/// Uses snapshot pattern to freeze catalog data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: String,

    /// Which variant sold, if the product sells through variants.
    pub variant_index: Option<usize>,

    /// Display label at time of sale (frozen).
    pub name_snapshot: String,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// IVA rate in basis points at time of sale (frozen).
    pub iva_bps: u32,

    /// Quantity sold.
    pub quantity: i64,

    /// Line total before discount and tax (unit_price × quantity).
    pub subtotal_cents: i64,

    /// This line's share of the discounted subtotal.
    pub net_cents: i64,

    /// IVA for this line, computed on the discounted share.
    pub iva_cents: i64,
}

/// A settled sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,

    /// Time-derived business number (see engine numbering caveats).
    pub sale_number: String,

    pub channel: Channel,

    /// The pinned store. Required for the physical channel; optional
    /// for online (set when the order is fulfilled by one store).
    pub store_id: Option<String>,

    /// Registered customer, physical channel only.
    pub customer_id: Option<String>,

    /// Free-text customer name (the only customer data online keeps).
    pub customer_name: Option<String>,

    /// Ordered line items mirroring the cart.
    pub items: Vec<SaleItem>,

    pub subtotal_cents: i64,

    /// Cart-level discount, physical channel only. Always 0 online.
    pub discount_bps: u32,
    pub discount_cents: i64,

    pub iva_cents: i64,
    pub total_cents: i64,

    pub payment_method: PaymentMethod,
    pub status: SaleStatus,

    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A line on an invoice, mirroring one sale item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub iva_bps: u32,
    pub subtotal_cents: i64,
    pub iva_cents: i64,
}

/// The fiscal document derived from a sale.
///
/// An invoice is a strict one-to-one projection of its sale, produced
/// by [`crate::invoice::invoice_from_sale`]. It is never edited
/// independently - regeneration from the sale must yield the same
/// figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,

    /// Time-derived business number (same caveat as sale numbers).
    pub invoice_number: String,

    /// The sale this invoice projects.
    pub sale_id: String,

    /// Taxable base in cents (= the sale's subtotal).
    pub base_imponible_cents: i64,

    pub iva_cents: i64,
    pub total_cents: i64,

    /// Mirrored line items.
    pub lines: Vec<InvoiceLine>,

    /// Invoice addressee; anonymous walk-ins get the final-consumer
    /// placeholder.
    pub customer_name: String,
    pub customer_identification: Option<String>,

    pub issued_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
