//! Store traits and the stock mutation outcome types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use domain::{Order, Product, ProductStatus};
use serde::Serialize;

use crate::error::Result;
use crate::query::{OrderFilter, OrderSort, PageRequest, ProductFilter, ProductSort};

/// Inventory count and status after a stock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub inventory: u32,
    pub status: ProductStatus,
}

/// Outcome of an atomic conditional decrement.
///
/// The rejection variants report what the store observed; translating
/// them into the error taxonomy is the stock ledger's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was subtracted; carries the updated level. A level that
    /// reached zero has already been flipped to `out_of_stock`.
    Applied(StockLevel),
    /// No product with this id.
    NotFound,
    /// Product exists but its status is not `available`.
    NotSellable(ProductStatus),
    /// Not enough inventory for the requested quantity.
    Insufficient { available: u32 },
}

/// Persistent product state.
///
/// `decrement_stock` and `increment_stock` are the only inventory
/// mutation paths in the system; both must be a single atomic
/// read-modify-write so concurrent checkouts of the same product
/// cannot lose updates.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<()>;

    async fn product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Replaces a product's catalog fields (name, price, description,
    /// image, variants, status). Returns false if the id is unknown.
    /// The inventory count is never written through this path; it
    /// only moves through the stock operations below.
    async fn update_product(&self, product: &Product) -> Result<bool>;

    async fn find_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64)>;

    /// Atomically subtracts `qty` if the product is available with
    /// sufficient inventory; derives `out_of_stock` when the count
    /// reaches zero.
    async fn decrement_stock(&self, id: ProductId, qty: u32) -> Result<StockDecrement>;

    /// Atomically adds `qty`. Flips `out_of_stock` back to
    /// `available` when the resulting count is positive; never
    /// resurrects an `unavailable` product. Returns `None` if the id
    /// is unknown.
    async fn increment_stock(&self, id: ProductId, qty: u32) -> Result<Option<StockLevel>>;
}

/// Persistent order state.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Issues the next value of the atomic order-number sequence.
    async fn next_order_number(&self) -> Result<u64>;

    async fn insert_order(&self, order: &Order) -> Result<()>;

    async fn order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Persists an updated order under optimistic concurrency: fails
    /// with [`StoreError::VersionConflict`] if the stored version does
    /// not match, and bumps the order's version on success.
    ///
    /// [`StoreError::VersionConflict`]: crate::StoreError::VersionConflict
    async fn update_order(&self, order: &mut Order) -> Result<()>;

    async fn find_orders(
        &self,
        filter: &OrderFilter,
        sort: OrderSort,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64)>;

    /// All orders created at or after `since`, for the reporting
    /// window aggregate.
    async fn orders_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>>;
}
