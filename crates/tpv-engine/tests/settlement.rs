//! End-to-end settlement tests against the in-memory stores.
//!
//! These exercise the full sequence: expansion → cart → settlement →
//! persisted sale/invoice/product/customer, including the
//! partial-completion distinction ("nothing happened" vs "something
//! happened but settlement did not finish").

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use tpv_core::catalog::{expand_product, SellContext};
use tpv_core::cart::Cart;
use tpv_core::stock::{StockLevels, StoreBucket};
use tpv_core::types::{
    Channel, Customer, Invoice, PaymentMethod, Product, Store, StoreKind, Variant,
    VariantAttribute,
};
use tpv_engine::{
    EngineError, InvoiceStore, MemoryStores, SettlementEngine, SettlementRequest, SettlementStep,
    StoreError, StoreResult,
};

// =============================================================================
// Fixtures
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn physical_store(id: &str, name: &str) -> Store {
    Store {
        id: id.to_string(),
        name: name.to_string(),
        kind: StoreKind::Physical,
        is_active: true,
    }
}

fn product(id: &str, name: &str, price_cents: i64, stock: StockLevels) -> Product {
    let now = Utc::now();
    Product {
        id: id.to_string(),
        sku: format!("SKU-{}", id),
        barcode: None,
        name: name.to_string(),
        image: None,
        price_cents,
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

fn customer(id: &str, name: &str) -> Customer {
    let now = Utc::now();
    Customer {
        id: id.to_string(),
        name: name.to_string(),
        identification: Some("12345678Z".to_string()),
        email: None,
        phone: None,
        total_purchases_cents: 0,
        purchase_count: 0,
        created_at: now,
        updated_at: now,
    }
}

fn engine_over(stores: &MemoryStores) -> SettlementEngine {
    let shared = Arc::new(stores.clone());
    SettlementEngine::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared,
    )
}

/// Builds a cart holding `quantity` of the product's sole candidate.
fn cart_with(product: &Product, ctx: &SellContext, quantity: i64) -> Cart {
    let candidates = expand_product(product, ctx);
    assert_eq!(candidates.len(), 1, "fixture expects a single candidate");

    let mut cart = Cart::new();
    for _ in 0..quantity {
        cart.add(&candidates[0]).unwrap();
    }
    cart
}

fn physical_request(store_id: &str) -> SettlementRequest {
    SettlementRequest {
        channel: Channel::Physical,
        store_id: Some(store_id.to_string()),
        payment_method: PaymentMethod::Cash,
        discount_bps: 0,
        customer_id: None,
        customer_name: None,
    }
}

fn online_request(customer_name: &str) -> SettlementRequest {
    SettlementRequest {
        channel: Channel::Online,
        store_id: None,
        payment_method: PaymentMethod::Transfer,
        discount_bps: 0,
        customer_id: None,
        customer_name: Some(customer_name.to_string()),
    }
}

// =============================================================================
// End-to-End Settlement
// =============================================================================

/// The full happy path: a physical sale of quantity 2
/// against a by_store product present only in the targeted store with
/// stock 5 yields bucket 3, aggregate 3, one sale and one invoice
/// with matching totals, and purchase_count incremented by 1.
#[tokio::test]
async fn physical_by_store_settlement_end_to_end() {
    init_tracing();
    let stores = MemoryStores::new();
    stores.seed_store(physical_store("t1", "Tienda Centro")).await;
    stores.seed_customer(customer("c1", "Ana García")).await;

    let p = product(
        "p1",
        "Agua 1L",
        10000, // 100.00
        StockLevels::ByStore {
            buckets: vec![StoreBucket {
                store_id: "t1".to_string(),
                on_hand: 5,
            }],
        },
    );
    stores.seed_product(p.clone()).await;

    let ctx = SellContext::Physical {
        store_id: "t1".to_string(),
    };
    let cart = cart_with(&p, &ctx, 2);

    let engine = engine_over(&stores);
    let mut request = physical_request("t1");
    request.customer_id = Some("c1".to_string());

    let sale = engine.complete_sale(&cart, request).await.unwrap();

    // Sale figures: 200.00 + 21% IVA
    assert_eq!(sale.subtotal_cents, 20000);
    assert_eq!(sale.iva_cents, 4200);
    assert_eq!(sale.total_cents, 24200);
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].quantity, 2);

    // Stock: targeted bucket 5 → 3, aggregate 3
    let updated = tpv_engine::ProductStore::get(&stores, "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.stock.resolve_for_store("t1"), 3);
    assert_eq!(updated.stock.total(), 3);

    // Exactly one sale and one invoice, with matching totals
    assert_eq!(stores.sale_count().await, 1);
    assert_eq!(stores.invoice_count().await, 1);
    let invoices = tpv_engine::InvoiceStore::list(&stores).await.unwrap();
    assert_eq!(invoices[0].sale_id, sale.id);
    assert_eq!(invoices[0].total_cents, sale.total_cents);
    assert_eq!(invoices[0].base_imponible_cents, sale.subtotal_cents);
    assert_eq!(invoices[0].customer_name, "Ana García");

    // Customer aggregates
    let ana = tpv_engine::CustomerStore::get(&stores, "c1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ana.purchase_count, 1);
    assert_eq!(ana.total_purchases_cents, 24200);
}

#[tokio::test]
async fn online_settlement_spreads_proportionally() {
    init_tracing();
    let stores = MemoryStores::new();

    let p = product(
        "p1",
        "Camiseta",
        1500,
        StockLevels::ByStore {
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
        },
    );
    stores.seed_product(p.clone()).await;

    let ctx = SellContext::Online { store_id: None };
    let cart = cart_with(&p, &ctx, 6); // online sees aggregate 8

    let engine = engine_over(&stores);
    let sale = engine
        .complete_sale(&cart, online_request("Cliente Web"))
        .await
        .unwrap();

    assert_eq!(sale.channel, Channel::Online);
    assert_eq!(sale.customer_name.as_deref(), Some("Cliente Web"));

    // Greedy in stored order: [5, 3] - 6 = [0, 2]
    let updated = tpv_engine::ProductStore::get(&stores, "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.stock.resolve_for_store("t1"), 0);
    assert_eq!(updated.stock.resolve_for_store("t2"), 2);
    assert_eq!(updated.stock.total(), 2);
}

#[tokio::test]
async fn online_discount_is_forced_to_zero() {
    init_tracing();
    let stores = MemoryStores::new();
    let p = product("p1", "Camiseta", 10000, StockLevels::Unique { on_hand: 10 });
    stores.seed_product(p.clone()).await;

    let cart = cart_with(&p, &SellContext::Online { store_id: None }, 1);

    let engine = engine_over(&stores);
    let mut request = online_request("Cliente Web");
    request.discount_bps = 2500; // must be ignored on this channel

    let sale = engine.complete_sale(&cart, request).await.unwrap();

    assert_eq!(sale.discount_bps, 0);
    assert_eq!(sale.discount_cents, 0);
    assert_eq!(sale.total_cents, 12100);
}

#[tokio::test]
async fn physical_discount_spreads_pro_rata() {
    init_tracing();
    let stores = MemoryStores::new();
    stores.seed_store(physical_store("t1", "Tienda Centro")).await;

    let a = product("a", "Articulo A", 10000, StockLevels::Unique { on_hand: 10 });
    let mut b = product("b", "Articulo B", 5000, StockLevels::Unique { on_hand: 10 });
    b.iva_bps = 1000;
    stores.seed_product(a.clone()).await;
    stores.seed_product(b.clone()).await;

    let ctx = SellContext::Physical {
        store_id: "t1".to_string(),
    };
    let mut cart = Cart::new();
    cart.add(&expand_product(&a, &ctx)[0]).unwrap();
    cart.add(&expand_product(&b, &ctx)[0]).unwrap();

    let engine = engine_over(&stores);
    let mut request = physical_request("t1");
    request.discount_bps = 1000; // 10%

    let sale = engine.complete_sale(&cart, request).await.unwrap();

    // 150.00 - 15.00 discount = 135.00; IVA 18.90 + 4.50 = 23.40
    assert_eq!(sale.subtotal_cents, 15000);
    assert_eq!(sale.discount_cents, 1500);
    assert_eq!(sale.iva_cents, 2340);
    assert_eq!(sale.total_cents, 15840);
    assert_eq!(sale.items[0].net_cents, 9000);
    assert_eq!(sale.items[1].iva_cents, 450);
}

#[tokio::test]
async fn variant_line_depletes_the_variants_own_stock() {
    init_tracing();
    let stores = MemoryStores::new();
    stores.seed_store(physical_store("t1", "Tienda Centro")).await;

    let mut p = product("p1", "Camiseta", 1500, StockLevels::Unique { on_hand: 99 });
    p.variants = vec![
        Variant {
            attributes: vec![VariantAttribute {
                name: "color".to_string(),
                value: "rojo".to_string(),
            }],
            price_adjustment_cents: 100,
            stock: StockLevels::Unique { on_hand: 4 },
            sku: None,
            barcode: None,
            image: None,
        },
        Variant {
            attributes: vec![VariantAttribute {
                name: "color".to_string(),
                value: "azul".to_string(),
            }],
            price_adjustment_cents: 0,
            stock: StockLevels::Unique { on_hand: 7 },
            sku: None,
            barcode: None,
            image: None,
        },
    ];
    stores.seed_product(p.clone()).await;

    let ctx = SellContext::Physical {
        store_id: "t1".to_string(),
    };
    let candidates = expand_product(&p, &ctx);
    assert_eq!(candidates.len(), 2);

    // Sell 3 of the red variant
    let mut cart = Cart::new();
    for _ in 0..3 {
        cart.add(&candidates[0]).unwrap();
    }

    let engine = engine_over(&stores);
    let sale = engine
        .complete_sale(&cart, physical_request("t1"))
        .await
        .unwrap();

    // Price carried the adjustment: 16.00 × 3 = 48.00
    assert_eq!(sale.items[0].subtotal_cents, 4800);
    assert_eq!(sale.items[0].variant_index, Some(0));

    let updated = tpv_engine::ProductStore::get(&stores, "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.variants[0].stock.total(), 1); // 4 - 3
    assert_eq!(updated.variants[1].stock.total(), 7); // untouched
    assert_eq!(updated.stock.total(), 99); // product-level pool untouched
}

// =============================================================================
// Validation ("nothing happened")
// =============================================================================

#[tokio::test]
async fn empty_cart_blocks_settlement() {
    init_tracing();
    let stores = MemoryStores::new();
    stores.seed_store(physical_store("t1", "Tienda Centro")).await;
    let engine = engine_over(&stores);

    let err = engine
        .complete_sale(&Cart::new(), physical_request("t1"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(stores.sale_count().await, 0);
}

#[tokio::test]
async fn physical_without_store_blocks_settlement() {
    init_tracing();
    let stores = MemoryStores::new();
    let p = product("p1", "Agua", 1000, StockLevels::Unique { on_hand: 5 });
    stores.seed_product(p.clone()).await;
    let cart = cart_with(
        &p,
        &SellContext::Physical {
            store_id: "t1".to_string(),
        },
        1,
    );

    let engine = engine_over(&stores);
    let mut request = physical_request("t1");
    request.store_id = None;

    let err = engine.complete_sale(&cart, request).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(stores.sale_count().await, 0);
}

#[tokio::test]
async fn online_without_customer_name_blocks_settlement() {
    init_tracing();
    let stores = MemoryStores::new();
    let p = product("p1", "Agua", 1000, StockLevels::Unique { on_hand: 5 });
    stores.seed_product(p.clone()).await;
    let cart = cart_with(&p, &SellContext::Online { store_id: None }, 1);

    let engine = engine_over(&stores);
    let mut request = online_request("x");
    request.customer_name = None;

    let err = engine.complete_sale(&cart, request).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(stores.sale_count().await, 0);
}

#[tokio::test]
async fn unknown_linked_customer_fails_before_any_write() {
    init_tracing();
    let stores = MemoryStores::new();
    stores.seed_store(physical_store("t1", "Tienda Centro")).await;
    let p = product("p1", "Agua", 1000, StockLevels::Unique { on_hand: 5 });
    stores.seed_product(p.clone()).await;
    let cart = cart_with(
        &p,
        &SellContext::Physical {
            store_id: "t1".to_string(),
        },
        1,
    );

    let engine = engine_over(&stores);
    let mut request = physical_request("t1");
    request.customer_id = Some("ghost".to_string());

    let err = engine.complete_sale(&cart, request).await.unwrap_err();

    // "Nothing happened": no sale, no stock mutation
    assert!(matches!(err, EngineError::Persistence(_)));
    assert_eq!(stores.sale_count().await, 0);
    let untouched = tpv_engine::ProductStore::get(&stores, "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.stock.total(), 5);
}

// =============================================================================
// Partial Completion ("something happened")
// =============================================================================

/// Invoice store that always fails, forcing the sequence to die after
/// the sale and stock writes committed.
struct BrokenInvoiceStore;

#[async_trait]
impl InvoiceStore for BrokenInvoiceStore {
    async fn get(&self, _id: &str) -> StoreResult<Option<Invoice>> {
        Err(StoreError::Backend("invoice backend offline".to_string()))
    }

    async fn list(&self) -> StoreResult<Vec<Invoice>> {
        Err(StoreError::Backend("invoice backend offline".to_string()))
    }

    async fn save(&self, _invoice: &Invoice) -> StoreResult<()> {
        Err(StoreError::Backend("invoice backend offline".to_string()))
    }
}

#[tokio::test]
async fn invoice_failure_reports_partial_completion() {
    init_tracing();
    let stores = MemoryStores::new();
    stores.seed_store(physical_store("t1", "Tienda Centro")).await;
    let p = product("p1", "Agua", 1000, StockLevels::Unique { on_hand: 5 });
    stores.seed_product(p.clone()).await;
    let cart = cart_with(
        &p,
        &SellContext::Physical {
            store_id: "t1".to_string(),
        },
        2,
    );

    let shared = Arc::new(stores.clone());
    let engine = SettlementEngine::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared,
        Arc::new(BrokenInvoiceStore),
    );

    let err = engine
        .complete_sale(&cart, physical_request("t1"))
        .await
        .unwrap_err();

    // The failure names the step and the committed sale
    let EngineError::PartialCompletion { sale_id, step, .. } = err else {
        panic!("expected partial completion, got {err}");
    };
    assert_eq!(step, SettlementStep::PersistInvoice);

    // Prior steps stand: sale persisted, stock depleted, no invoice
    assert_eq!(stores.sale_count().await, 1);
    let sale = tpv_engine::SaleStore::get(&stores, &sale_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sale.total_cents, 2420);
    let depleted = tpv_engine::ProductStore::get(&stores, "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(depleted.stock.total(), 3);
}

// =============================================================================
// Oversell (preserved behavior)
// =============================================================================

#[tokio::test]
async fn oversold_online_sale_settles_with_under_depletion() {
    init_tracing();
    let stores = MemoryStores::new();

    let p = product(
        "p1",
        "Camiseta",
        1500,
        StockLevels::ByStore {
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
        },
    );
    stores.seed_product(p.clone()).await;

    // Another session already bought: simulate a stale snapshot by
    // building the cart, then draining stock behind its back.
    let ctx = SellContext::Online { store_id: None };
    let cart = cart_with(&p, &ctx, 8);

    let mut drained = p.clone();
    drained.stock = StockLevels::ByStore {
        buckets: vec![
            StoreBucket {
                store_id: "t1".to_string(),
                on_hand: 2,
            },
            StoreBucket {
                store_id: "t2".to_string(),
                on_hand: 1,
            },
        ],
    };
    tpv_engine::ProductStore::save(&stores, &drained)
        .await
        .unwrap();

    let engine = engine_over(&stores);
    let sale = engine
        .complete_sale(&cart, online_request("Cliente Web"))
        .await
        .unwrap();

    // Settlement completed; buckets floor at zero, 5 units unmet
    assert_eq!(sale.items[0].quantity, 8);
    let after = tpv_engine::ProductStore::get(&stores, "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.stock.total(), 0);
    assert_eq!(stores.sale_count().await, 1);
}
