use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use domain::{Order, Product, ProductStatus};
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::query::{OrderFilter, OrderSort, PageRequest, ProductFilter, ProductSort};
use crate::store::{OrderStore, ProductStore, StockDecrement, StockLevel};

/// In-memory store for tests and local development.
///
/// Provides the same contract as the PostgreSQL implementation. Stock
/// mutations run under a single write lock, which makes the
/// check-and-mutate step atomic with respect to concurrent callers.
#[derive(Clone, Default)]
pub struct MemoryStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    order_seq: Arc<AtomicU64>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all products and orders.
    pub async fn clear(&self) {
        self.products.write().await.clear();
        self.orders.write().await.clear();
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(existing) => {
                // Catalog fields only; the stored inventory count
                // stays authoritative.
                existing.name = product.name.clone();
                existing.price = product.price;
                existing.description = product.description.clone();
                existing.image = product.image.clone();
                existing.status = product.status;
                existing.variants = product.variants.clone();
                existing.updated_at = product.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<(Vec<Product>, u64)> {
        let products = self.products.read().await;
        let mut matched: Vec<Product> = products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        sort.apply(&mut matched);

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((items, total))
    }

    async fn decrement_stock(&self, id: ProductId, qty: u32) -> Result<StockDecrement> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(StockDecrement::NotFound);
        };
        if product.status == ProductStatus::Unavailable {
            return Ok(StockDecrement::NotSellable(product.status));
        }
        // out_of_stock means inventory already reached zero via a
        // sale, so it falls through to the insufficient check below.
        if product.inventory < qty {
            return Ok(StockDecrement::Insufficient {
                available: product.inventory,
            });
        }

        product.inventory -= qty;
        if product.inventory == 0 {
            product.status = ProductStatus::OutOfStock;
        }
        product.updated_at = Utc::now();

        Ok(StockDecrement::Applied(StockLevel {
            inventory: product.inventory,
            status: product.status,
        }))
    }

    async fn increment_stock(&self, id: ProductId, qty: u32) -> Result<Option<StockLevel>> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };

        product.inventory += qty;
        if product.status == ProductStatus::OutOfStock && product.inventory > 0 {
            product.status = ProductStatus::Available;
        }
        product.updated_at = Utc::now();

        Ok(Some(StockLevel {
            inventory: product.inventory,
            status: product.status,
        }))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn next_order_number(&self) -> Result<u64> {
        Ok(self.order_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.insert(order.id(), order.clone());
        Ok(())
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_order(&self, order: &mut Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id())
            .ok_or(StoreError::OrderNotFound(order.id()))?;

        if stored.version() != order.version() {
            return Err(StoreError::VersionConflict {
                order_id: order.id(),
                expected: order.version(),
                actual: stored.version(),
            });
        }

        order.mark_persisted();
        *stored = order.clone();
        Ok(())
    }

    async fn find_orders(
        &self,
        filter: &OrderFilter,
        sort: OrderSort,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64)> {
        let orders = self.orders.read().await;
        let mut matched: Vec<Order> = orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        sort.apply(&mut matched);

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok((items, total))
    }

    async fn orders_created_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.created_at() >= since)
            .cloned()
            .collect())
    }
}
