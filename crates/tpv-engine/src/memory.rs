//! # In-Memory Stores
//!
//! A single [`MemoryStores`] value implements all five store traits
//! over `tokio::sync::RwLock<HashMap>` maps.
//!
//! ## Where This Is Used
//! - Integration tests: the settlement sequence runs end-to-end
//!   against real trait implementations with no external backend.
//! - Embedded runtimes: a single-till deployment can run entirely in
//!   memory and persist through its own export mechanism.
//!
//! ## Consistency
//! Every write acquires the map's write lock, so read-your-writes
//! holds trivially. Nothing stronger is provided: two settlements
//! interleaving their read-modify-write cycles on the same product
//! will still lose updates, exactly as the consistency contract
//! documents.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tpv_core::types::{Customer, Invoice, Product, Sale, Store, StoreKind};

use crate::repository::{
    CustomerStore, InvoiceStore, ProductStore, SaleStore, StoreRegistry, StoreResult,
};

// =============================================================================
// Memory Stores
// =============================================================================

/// In-memory implementation of all five collaborator stores.
///
/// Cheap to clone: clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStores {
    products: Arc<RwLock<HashMap<String, Product>>>,
    stores: Arc<RwLock<HashMap<String, Store>>>,
    customers: Arc<RwLock<HashMap<String, Customer>>>,
    sales: Arc<RwLock<HashMap<String, Sale>>>,
    invoices: Arc<RwLock<HashMap<String, Invoice>>>,
}

impl MemoryStores {
    /// Creates empty stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a product (test/bootstrap convenience).
    pub async fn seed_product(&self, product: Product) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }

    /// Seeds a store (test/bootstrap convenience).
    pub async fn seed_store(&self, store: Store) {
        self.stores.write().await.insert(store.id.clone(), store);
    }

    /// Seeds a customer (test/bootstrap convenience).
    pub async fn seed_customer(&self, customer: Customer) {
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer);
    }

    /// Number of persisted sales.
    pub async fn sale_count(&self) -> usize {
        self.sales.read().await.len()
    }

    /// Number of persisted invoices.
    pub async fn invoice_count(&self) -> usize {
        self.invoices.read().await.len()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

#[async_trait]
impl ProductStore for MemoryStores {
    async fn get(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn save(&self, product: &Product) -> StoreResult<()> {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product.clone());
        Ok(())
    }
}

#[async_trait]
impl StoreRegistry for MemoryStores {
    async fn get(&self, id: &str) -> StoreResult<Option<Store>> {
        Ok(self.stores.read().await.get(id).cloned())
    }

    async fn list_active(&self, kind: StoreKind) -> StoreResult<Vec<Store>> {
        let mut stores: Vec<Store> = self
            .stores
            .read()
            .await
            .values()
            .filter(|s| s.is_active && s.kind == kind)
            .cloned()
            .collect();
        stores.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stores)
    }

    async fn save(&self, store: &Store) -> StoreResult<()> {
        self.stores
            .write()
            .await
            .insert(store.id.clone(), store.clone());
        Ok(())
    }
}

#[async_trait]
impl CustomerStore for MemoryStores {
    async fn get(&self, id: &str) -> StoreResult<Option<Customer>> {
        Ok(self.customers.read().await.get(id).cloned())
    }

    async fn save(&self, customer: &Customer) -> StoreResult<()> {
        self.customers
            .write()
            .await
            .insert(customer.id.clone(), customer.clone());
        Ok(())
    }
}

#[async_trait]
impl SaleStore for MemoryStores {
    async fn get(&self, id: &str) -> StoreResult<Option<Sale>> {
        Ok(self.sales.read().await.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Sale>> {
        let mut sales: Vec<Sale> = self.sales.read().await.values().cloned().collect();
        sales.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sales)
    }

    async fn save(&self, sale: &Sale) -> StoreResult<()> {
        self.sales.write().await.insert(sale.id.clone(), sale.clone());
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for MemoryStores {
    async fn get(&self, id: &str) -> StoreResult<Option<Invoice>> {
        Ok(self.invoices.read().await.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Invoice>> {
        let mut invoices: Vec<Invoice> = self.invoices.read().await.values().cloned().collect();
        invoices.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(invoices)
    }

    async fn save(&self, invoice: &Invoice) -> StoreResult<()> {
        self.invoices
            .write()
            .await
            .insert(invoice.id.clone(), invoice.clone());
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
