//! # Store Interfaces
//!
//! The settlement core consumes five collaborator stores as opaque
//! trait objects with CRUD-by-id and list operations. It does not
//! depend on any transport or persistence technology; the only
//! consistency it requires is that each write is visible to the next
//! read within the same settlement sequence (read-your-writes).
//!
//! ## No Hidden Caches
//! The engine operates on explicitly loaded snapshots. A store
//! implementation must not serve a stale cached collection behind
//! these methods - whatever a `get` returns is what the settlement
//! sequence will mutate and save back.

use async_trait::async_trait;
use thiserror::Error;

use tpv_core::types::{Customer, Invoice, Product, Sale, Store, StoreKind};

// =============================================================================
// Store Error
// =============================================================================

/// Failures raised by collaborator stores.
///
/// The engine never retries these; they propagate for the caller to
/// decide (wrapped as partial completion when something already
/// committed).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Entity not found in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Backend I/O failure (connection, disk, serialization, ...).
    #[error("Store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store Traits
// =============================================================================

/// The product catalog store.
///
/// Settlement loads a product, depletes its (or its variant's) stock
/// levels, and saves it back. `save` upserts.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<Product>>;

    /// Lists products sorted by name. Catalog expansion iterates this
    /// order, which makes candidate order reproducible.
    async fn list(&self) -> StoreResult<Vec<Product>>;

    async fn save(&self, product: &Product) -> StoreResult<()>;
}

/// The store/location registry.
#[async_trait]
pub trait StoreRegistry: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<Store>>;

    /// Lists active stores of one kind, sorted by name.
    async fn list_active(&self, kind: StoreKind) -> StoreResult<Vec<Store>>;

    async fn save(&self, store: &Store) -> StoreResult<()>;
}

/// The registered customer store.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<Customer>>;

    async fn save(&self, customer: &Customer) -> StoreResult<()>;
}

/// The sale ledger.
#[async_trait]
pub trait SaleStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<Sale>>;

    /// Lists sales, newest first.
    async fn list(&self) -> StoreResult<Vec<Sale>>;

    async fn save(&self, sale: &Sale) -> StoreResult<()>;
}

/// The invoice ledger.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<Invoice>>;

    /// Lists invoices, newest first.
    async fn list(&self) -> StoreResult<Vec<Invoice>>;

    async fn save(&self, invoice: &Invoice) -> StoreResult<()>;
}
