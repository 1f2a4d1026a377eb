//! # Variant Expansion
//!
//! Flattens a product's variant matrix into independently sellable
//! line candidates for a given selling context.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Variant Expansion                                 │
//! │                                                                         │
//! │  Product "Camiseta" (base 15.00)                                        │
//! │  ├── variant 0: rojo/M  (+0.00, stock t1:5)                             │
//! │  ├── variant 1: rojo/L  (+1.00, stock t1:0)   ← excluded (no stock)     │
//! │  └── variant 2: azul/M  (+0.50, stock t1:2)                             │
//! │          │                                                              │
//! │          ▼  expand_product(ctx = Physical { store: t1 })                │
//! │                                                                         │
//! │  Candidate { cart_id: "p1_variant_0", label: "Camiseta (rojo / M)",     │
//! │              price: 15.00, available: 5 }                               │
//! │  Candidate { cart_id: "p1_variant_2", label: "Camiseta (azul / M)",     │
//! │              price: 15.50, available: 2 }                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Inclusion Rule (all must hold)
//! 1. `product.is_active`
//! 2. The visibility set for the context's channel is empty OR
//!    contains the context's store
//! 3. Resolved stock for the context is > 0
//!
//! ## Ordering
//! Candidates preserve product iteration order, then variant index
//! order. This order is stable and reproducible: proportional
//! depletion and allocation tie-breaks depend on it.

use serde::{Deserialize, Serialize};

use crate::types::Product;

// =============================================================================
// Selling Context
// =============================================================================

/// Where a candidate would be sold from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum SellContext {
    /// A staffed till at one specific store. Availability is that
    /// store's view of stock.
    Physical { store_id: String },

    /// Online ordering. Availability aggregates the whole ledger.
    /// `store_id` narrows to one storefront's catalog; `None` is the
    /// cross-storefront aggregate view.
    Online { store_id: Option<String> },
}

impl SellContext {
    /// Resolves availability from a stock representation under this
    /// context's channel semantics.
    pub fn resolve(&self, levels: &crate::stock::StockLevels) -> i64 {
        match self {
            SellContext::Physical { store_id } => levels.resolve_for_store(store_id),
            SellContext::Online { .. } => levels.resolve_total(),
        }
    }

    /// Whether a product's visibility sets admit this context.
    ///
    /// An empty set means "all stores of that kind".
    fn admits(&self, product: &Product) -> bool {
        match self {
            SellContext::Physical { store_id } => {
                product.physical_store_ids.is_empty()
                    || product.physical_store_ids.iter().any(|s| s == store_id)
            }
            SellContext::Online { store_id } => match store_id {
                Some(id) => {
                    product.online_store_ids.is_empty()
                        || product.online_store_ids.iter().any(|s| s == id)
                }
                // Aggregate view: every online-visible product qualifies
                None => true,
            },
        }
    }
}

// =============================================================================
// Candidate
// =============================================================================

/// An independently sellable line: one variant, or the product itself
/// when it has no variants.
///
/// A candidate freezes everything the cart needs at expansion time:
/// effective price, availability snapshot, display label, and the
/// identification fields with variant-over-product fallback applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Composite cart identity: `{product_id}` for plain products,
    /// `{product_id}_variant_{index}` for variants.
    pub cart_id: String,

    pub product_id: String,

    /// Index into the product's variant list, if any.
    pub variant_index: Option<usize>,

    /// Combined display label, e.g. "Camiseta (rojo / M)".
    pub label: String,

    /// Base price plus the variant's adjustment, in cents.
    pub unit_price_cents: i64,

    /// IVA rate in basis points (always the product's).
    pub iva_bps: u32,

    /// Availability resolved for the expansion context. The cart
    /// snapshots this as `max_stock` when the candidate is added.
    pub available: i64,

    /// SKU with variant override falling back to the product's.
    pub sku: String,

    /// Barcode with variant override falling back to the product's.
    pub barcode: Option<String>,

    /// Image with variant override falling back to the product's.
    pub image: Option<String>,
}

// =============================================================================
// Expansion
// =============================================================================

/// Expands one product into its sellable candidates for a context.
///
/// Returns an empty vector when the product is inactive, not visible
/// in the context, or nothing is in stock. Candidate order follows
/// variant index order.
pub fn expand_product(product: &Product, ctx: &SellContext) -> Vec<Candidate> {
    if !product.is_active || !ctx.admits(product) {
        return Vec::new();
    }

    if !product.has_variants() {
        let available = ctx.resolve(&product.stock);
        if available <= 0 {
            return Vec::new();
        }
        return vec![Candidate {
            cart_id: product.id.clone(),
            product_id: product.id.clone(),
            variant_index: None,
            label: product.name.clone(),
            unit_price_cents: product.price_cents,
            iva_bps: product.iva_bps,
            available,
            sku: product.sku.clone(),
            barcode: product.barcode.clone(),
            image: product.image.clone(),
        }];
    }

    product
        .variants
        .iter()
        .enumerate()
        .filter_map(|(index, variant)| {
            // Each variant resolves against its OWN stock levels
            let available = ctx.resolve(&variant.stock);
            if available <= 0 {
                return None;
            }

            let attribute_label = variant.attribute_label();
            let label = if attribute_label.is_empty() {
                product.name.clone()
            } else {
                format!("{} ({})", product.name, attribute_label)
            };

            Some(Candidate {
                cart_id: format!("{}_variant_{}", product.id, index),
                product_id: product.id.clone(),
                variant_index: Some(index),
                label,
                unit_price_cents: product.price_cents + variant.price_adjustment_cents,
                iva_bps: product.iva_bps,
                available,
                sku: variant.sku.clone().unwrap_or_else(|| product.sku.clone()),
                barcode: variant.barcode.clone().or_else(|| product.barcode.clone()),
                image: variant.image.clone().or_else(|| product.image.clone()),
            })
        })
        .collect()
}

/// Expands a catalog slice, preserving product order.
pub fn expand_catalog(products: &[Product], ctx: &SellContext) -> Vec<Candidate> {
    products
        .iter()
        .flat_map(|p| expand_product(p, ctx))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::{StockLevels, StoreBucket};
    use crate::types::{Variant, VariantAttribute};
    use chrono::Utc;

    fn plain_product(id: &str, stock: StockLevels) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            barcode: Some(format!("84000{}", id)),
            name: format!("Producto {}", id),
            image: None,
            price_cents: 1500,
            iva_bps: 2100,
            min_stock: 0,
            is_active: true,
            stock,
            variants: vec![],
            physical_store_ids: vec![],
            online_store_ids: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn variant(adjustment: i64, stock: StockLevels, value: &str) -> Variant {
        Variant {
            attributes: vec![VariantAttribute {
                name: "color".to_string(),
                value: value.to_string(),
            }],
            price_adjustment_cents: adjustment,
            stock,
            sku: None,
            barcode: None,
            image: None,
        }
    }

    fn physical(store: &str) -> SellContext {
        SellContext::Physical {
            store_id: store.to_string(),
        }
    }

    #[test]
    fn test_plain_product_yields_one_candidate() {
        let product = plain_product("p1", StockLevels::Unique { on_hand: 4 });
        let candidates = expand_product(&product, &physical("t1"));

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.cart_id, "p1");
        assert_eq!(c.variant_index, None);
        assert_eq!(c.unit_price_cents, 1500);
        assert_eq!(c.available, 4);
        assert_eq!(c.label, "Producto p1");
    }

    #[test]
    fn test_inactive_product_excluded() {
        let mut product = plain_product("p1", StockLevels::Unique { on_hand: 4 });
        product.is_active = false;
        assert!(expand_product(&product, &physical("t1")).is_empty());
    }

    #[test]
    fn test_zero_stock_excluded() {
        let product = plain_product("p1", StockLevels::Unique { on_hand: 0 });
        assert!(expand_product(&product, &physical("t1")).is_empty());
        assert!(expand_product(&product, &SellContext::Online { store_id: None }).is_empty());
    }

    #[test]
    fn test_visibility_set_filters_physical() {
        let mut product = plain_product("p1", StockLevels::Unique { on_hand: 4 });
        product.physical_store_ids = vec!["t1".to_string()];

        assert_eq!(expand_product(&product, &physical("t1")).len(), 1);
        assert!(expand_product(&product, &physical("t2")).is_empty());
    }

    #[test]
    fn test_empty_visibility_set_means_everywhere() {
        let product = plain_product("p1", StockLevels::Unique { on_hand: 4 });

        // Empty sets admit any store and any channel context
        assert_eq!(expand_product(&product, &physical("t9")).len(), 1);
        assert_eq!(
            expand_product(
                &product,
                &SellContext::Online {
                    store_id: Some("web-1".to_string())
                }
            )
            .len(),
            1
        );
    }

    #[test]
    fn test_variants_expand_with_own_stock_and_price() {
        let mut product = plain_product("p1", StockLevels::Unique { on_hand: 99 });
        product.variants = vec![
            variant(0, StockLevels::Unique { on_hand: 5 }, "rojo"),
            variant(100, StockLevels::Unique { on_hand: 0 }, "azul"), // out of stock
            variant(50, StockLevels::Unique { on_hand: 2 }, "verde"),
        ];

        let candidates = expand_product(&product, &physical("t1"));

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].cart_id, "p1_variant_0");
        assert_eq!(candidates[0].label, "Producto p1 (rojo)");
        assert_eq!(candidates[0].unit_price_cents, 1500);
        assert_eq!(candidates[1].cart_id, "p1_variant_2");
        assert_eq!(candidates[1].unit_price_cents, 1550);
        assert_eq!(candidates[1].available, 2);
    }

    #[test]
    fn test_channel_stock_semantics_differ() {
        let mut product = plain_product("p1", StockLevels::empty());
        product.stock = StockLevels::ByStore {
            buckets: vec![
                StoreBucket {
                    store_id: "t1".to_string(),
                    on_hand: 5,
                },
                StoreBucket {
                    store_id: "t2".to_string(),
                    on_hand: 3,
                },
            ],
        };

        let at_t2 = expand_product(&product, &physical("t2"));
        assert_eq!(at_t2[0].available, 3);

        let online = expand_product(&product, &SellContext::Online { store_id: None });
        assert_eq!(online[0].available, 8);
    }

    #[test]
    fn test_variant_fallback_to_product_identity() {
        let mut product = plain_product("p1", StockLevels::empty());
        let mut v = variant(0, StockLevels::Unique { on_hand: 1 }, "rojo");
        v.sku = Some("V-SKU".to_string());
        product.variants = vec![v, variant(0, StockLevels::Unique { on_hand: 1 }, "azul")];

        let candidates = expand_product(&product, &physical("t1"));
        assert_eq!(candidates[0].sku, "V-SKU");
        // No override: fall back to the product's identity
        assert_eq!(candidates[1].sku, "SKU-p1");
        assert_eq!(candidates[1].barcode, Some("84000p1".to_string()));
    }

    #[test]
    fn test_catalog_order_is_preserved() {
        let a = plain_product("a", StockLevels::Unique { on_hand: 1 });
        let b = plain_product("b", StockLevels::Unique { on_hand: 1 });
        let catalog = vec![a, b];

        let candidates = expand_catalog(&catalog, &physical("t1"));
        let ids: Vec<_> = candidates.iter().map(|c| c.cart_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
