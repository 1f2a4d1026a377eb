//! # Settlement Engine
//!
//! Orchestrates cart → persisted sale → stock mutation → invoice
//! emission → customer aggregate update as one logical (non-atomic)
//! operation.
//!
//! ## Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    complete_sale()                                      │
//! │                                                                         │
//! │  0. validate checkout, pin store, load linked customer   (reads only)  │
//! │  1. recompute totals from the cart snapshot              (pure)        │
//! │  ──────────────────── first write below this line ────────────────────  │
//! │  2. persist Sale                                                       │
//! │  3. per line: load product → deplete → persist product                 │
//! │  4. physical + linked customer: fold total into aggregates             │
//! │  5. project invoice from the sale, persist it                          │
//! │                                                                         │
//! │  Any failure below the line → PartialCompletionError                   │
//! │  Any failure above the line → Validation/Persistence ("nothing         │
//! │  happened")                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Numbering
//! Sale and invoice numbers are time-derived. Uniqueness is NOT
//! structurally guaranteed: two settlements in the same second with
//! the same sub-second suffix would collide. Whether strict
//! uniqueness is a business requirement is an open product question;
//! the window is documented here rather than silently hardened.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tpv_core::allocator::{deplete, DepletionPolicy};
use tpv_core::cart::Cart;
use tpv_core::error::ValidationError;
use tpv_core::invoice::invoice_from_sale;
use tpv_core::money::Rate;
use tpv_core::types::{
    Channel, Customer, PaymentMethod, Sale, SaleItem, SaleStatus, StoreKind,
};
use tpv_core::validation::{validate_checkout, validate_discount_bps};

use crate::error::{EngineError, EngineResult, SettlementStep};
use crate::repository::{
    CustomerStore, InvoiceStore, ProductStore, SaleStore, StoreError, StoreRegistry,
};

// =============================================================================
// Settlement Request
// =============================================================================

/// Everything a checkout submission carries besides the cart.
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub channel: Channel,

    /// Pinned store. Required for physical; optional for online.
    pub store_id: Option<String>,

    pub payment_method: PaymentMethod,

    /// Cart-level discount in basis points. Ignored (forced to zero)
    /// on the online channel.
    pub discount_bps: u32,

    /// Registered customer to link (physical channel only).
    pub customer_id: Option<String>,

    /// Free-text customer name (required for online checkout).
    pub customer_name: Option<String>,
}

// =============================================================================
// Settlement Engine
// =============================================================================

/// Sequences the settlement steps over the collaborator stores.
///
/// Holds stores as trait objects so any backend satisfying
/// read-your-writes can plug in.
pub struct SettlementEngine {
    products: Arc<dyn ProductStore>,
    stores: Arc<dyn StoreRegistry>,
    customers: Arc<dyn CustomerStore>,
    sales: Arc<dyn SaleStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl SettlementEngine {
    pub fn new(
        products: Arc<dyn ProductStore>,
        stores: Arc<dyn StoreRegistry>,
        customers: Arc<dyn CustomerStore>,
        sales: Arc<dyn SaleStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        SettlementEngine {
            products,
            stores,
            customers,
            sales,
            invoices,
        }
    }

    /// Settles a cart: validates, persists the sale, depletes stock,
    /// updates customer aggregates, emits the invoice.
    ///
    /// ## Consistency
    /// Each step is an independent store call with no rollback. After
    /// the sale record commits, any failure surfaces as
    /// [`EngineError::PartialCompletion`] carrying the committed sale
    /// id and the failed step.
    ///
    /// ## Returns
    /// The persisted [`Sale`].
    pub async fn complete_sale(
        &self,
        cart: &Cart,
        request: SettlementRequest,
    ) -> EngineResult<Sale> {
        debug!(channel = ?request.channel, lines = cart.line_count(), "complete_sale");

        // ---- Step 0: validation + context reads (nothing written) ----

        validate_discount_bps(request.discount_bps)?;
        validate_checkout(
            cart,
            request.channel,
            request.store_id.as_deref(),
            request.customer_name.as_deref(),
        )?;

        if request.channel == Channel::Physical {
            self.check_physical_store(request.store_id.as_deref().unwrap_or_default())
                .await?;
        }

        // Load the linked customer up front so the sale and invoice
        // carry its name; aggregates are folded in at step 4.
        let linked_customer = self.load_linked_customer(&request).await?;

        // The online channel never applies a discount
        let discount = match request.channel {
            Channel::Physical => Rate::from_bps(request.discount_bps),
            Channel::Online => Rate::zero(),
        };

        // ---- Step 1: recompute totals from the cart snapshot ----

        let totals = cart.totals(discount);
        let now = Utc::now();

        let items: Vec<SaleItem> = cart
            .lines
            .iter()
            .zip(totals.lines.iter())
            .map(|(line, share)| SaleItem {
                product_id: line.product_id.clone(),
                variant_index: line.variant_index,
                name_snapshot: line.label.clone(),
                unit_price_cents: line.unit_price_cents,
                iva_bps: line.iva_bps,
                quantity: line.quantity,
                subtotal_cents: line.subtotal().cents(),
                net_cents: share.net_cents,
                iva_cents: share.iva_cents,
            })
            .collect();

        let customer_name = request
            .customer_name
            .clone()
            .or_else(|| linked_customer.as_ref().map(|c| c.name.clone()));

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            sale_number: generate_sale_number(),
            channel: request.channel,
            store_id: request.store_id.clone(),
            customer_id: request.customer_id.clone(),
            customer_name,
            items,
            subtotal_cents: totals.subtotal_cents,
            discount_bps: totals.discount_bps,
            discount_cents: totals.discount_cents,
            iva_cents: totals.iva_cents,
            total_cents: totals.total_cents,
            payment_method: request.payment_method,
            status: SaleStatus::Completed,
            created_at: now,
        };

        // ---- Step 2: persist the sale (first write) ----

        self.sales.save(&sale).await?;
        debug!(sale_id = %sale.id, sale_number = %sale.sale_number, "Sale persisted");

        // ---- Step 3: deplete stock per line, persist products ----

        let policy = match request.channel {
            Channel::Physical => DepletionPolicy::Targeted {
                // Validated above for the physical channel
                store_id: request.store_id.clone().unwrap_or_default(),
            },
            Channel::Online => DepletionPolicy::Proportional,
        };

        for item in &sale.items {
            self.deplete_line(&sale.id, item, &policy).await?;
        }

        // ---- Step 4: customer aggregates (physical + linked only) ----

        if request.channel == Channel::Physical {
            if let Some(mut customer) = linked_customer.clone() {
                customer.record_purchase(sale.total(), now);
                self.customers
                    .save(&customer)
                    .await
                    .map_err(|e| EngineError::partial(&sale.id, SettlementStep::UpdateCustomer, e))?;
                debug!(customer_id = %customer.id, count = customer.purchase_count, "Customer aggregates updated");
            }
        }

        // ---- Step 5: project and persist the invoice ----

        let invoice = invoice_from_sale(
            &sale,
            &generate_invoice_number(),
            linked_customer.and_then(|c| c.identification),
            now,
        );
        self.invoices
            .save(&invoice)
            .await
            .map_err(|e| EngineError::partial(&sale.id, SettlementStep::PersistInvoice, e))?;

        info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            invoice_number = %invoice.invoice_number,
            total = %sale.total(),
            items = sale.items.len(),
            "Sale settled"
        );

        Ok(sale)
    }

    /// Loads one line's product, applies the depletion policy to the
    /// owning stock levels, and saves the product back.
    async fn deplete_line(
        &self,
        sale_id: &str,
        item: &SaleItem,
        policy: &DepletionPolicy,
    ) -> EngineResult<()> {
        let partial =
            |e: StoreError| EngineError::partial(sale_id, SettlementStep::DepleteStock, e);

        let mut product = self
            .products
            .get(&item.product_id)
            .await
            .map_err(partial)?
            .ok_or_else(|| partial(StoreError::not_found("Product", &item.product_id)))?;

        let levels = match item.variant_index {
            Some(index) => {
                let product_id = product.id.clone();
                &mut product
                    .variants
                    .get_mut(index)
                    .ok_or_else(|| {
                        partial(StoreError::not_found(
                            "Variant",
                            format!("{}_variant_{}", product_id, index),
                        ))
                    })?
                    .stock
            }
            None => &mut product.stock,
        };

        let outcome = deplete(levels, policy, item.quantity);
        if !outcome.is_complete() {
            // Oversold (online) or no bucket for the pinned store.
            // Preserved behavior: settlement proceeds, the shortfall
            // is surfaced for reconciliation, never an error.
            warn!(
                sale_id = %sale_id,
                product_id = %item.product_id,
                requested = item.quantity,
                taken = outcome.taken,
                remaining = outcome.remaining,
                "Depletion fell short of requested quantity"
            );
        }

        product.updated_at = Utc::now();
        self.products.save(&product).await.map_err(partial)?;

        debug!(
            sale_id = %sale_id,
            product_id = %item.product_id,
            quantity = item.quantity,
            "Stock depleted"
        );
        Ok(())
    }

    /// Verifies the pinned store exists, is active, and is physical.
    async fn check_physical_store(&self, store_id: &str) -> EngineResult<()> {
        let store = self
            .stores
            .get(store_id)
            .await?
            .ok_or_else(|| EngineError::Persistence(StoreError::not_found("Store", store_id)))?;

        if !store.is_active || store.kind != StoreKind::Physical {
            return Err(ValidationError::Invalid {
                field: "store".to_string(),
                reason: format!("'{}' is not an active physical store", store.name),
            }
            .into());
        }

        Ok(())
    }

    /// Loads the customer named by the request, if any (physical
    /// channel only - online carries a free-text name, not a link).
    async fn load_linked_customer(
        &self,
        request: &SettlementRequest,
    ) -> EngineResult<Option<Customer>> {
        if request.channel != Channel::Physical {
            return Ok(None);
        }
        let Some(customer_id) = request.customer_id.as_deref() else {
            return Ok(None);
        };

        let customer = self
            .customers
            .get(customer_id)
            .await?
            .ok_or_else(|| {
                EngineError::Persistence(StoreError::not_found("Customer", customer_id))
            })?;
        Ok(Some(customer))
    }
}

// =============================================================================
// Numbering
// =============================================================================

/// Generates a time-derived sale number, e.g. `V-260831-114512-0042`.
///
/// The suffix is the sub-second nanos modulo 10000 - NOT a uniqueness
/// guarantee. See the module docs for the open question on strict
/// uniqueness.
pub fn generate_sale_number() -> String {
    generate_number("V")
}

/// Generates a time-derived invoice number, e.g. `F-260831-114512-0042`.
pub fn generate_invoice_number() -> String {
    generate_number("F")
}

fn generate_number(prefix: &str) -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("{}-{}-{:04}", prefix, now.format("%y%m%d-%H%M%S"), nanos % 10000)
}

// =============================================================================
// Unit Tests
// =============================================================================
