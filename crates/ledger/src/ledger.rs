//! The ledger service over a [`ProductStore`].

use common::ProductId;
use domain::ProductStatus;
use serde::{Deserialize, Serialize};
use store::{ProductStore, StockDecrement, StockLevel};

use crate::error::{LedgerError, Result};

/// One line of a batch stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StockRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Read-only availability probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    /// Whether the requested quantity could be purchased right now.
    /// Advisory only: stock may move between this check and a
    /// decrement.
    pub available: bool,
    pub current_inventory: u32,
    pub status: ProductStatus,
}

/// A batch line that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchItemOutcome {
    pub product_id: ProductId,
    pub inventory: u32,
    pub status: ProductStatus,
}

/// A batch line that was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub product_id: ProductId,
    pub reason: String,
}

/// Partitioned outcome of a batch adjustment. Lines are independent;
/// a failed line never rolls back the ones before it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<BatchItemOutcome>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The single authority over inventory mutation.
#[derive(Debug, Clone)]
pub struct StockLedger<S> {
    store: S,
}

impl<S: ProductStore> StockLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Atomically reserves `quantity` units of a product.
    ///
    /// Succeeds only if the product is available with sufficient
    /// inventory; the check and the subtraction are one atomic store
    /// operation, so concurrent callers cannot oversell.
    #[tracing::instrument(skip(self))]
    pub async fn decrement(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel> {
        require_positive(quantity)?;

        match self.store.decrement_stock(product_id, quantity).await? {
            StockDecrement::Applied(level) => {
                metrics::counter!("stock_decrements_total").increment(1);
                if level.status == ProductStatus::OutOfStock {
                    tracing::info!(%product_id, "product drained to out_of_stock");
                }
                Ok(level)
            }
            StockDecrement::NotFound => Err(LedgerError::NotFound(product_id)),
            StockDecrement::NotSellable(status) => {
                metrics::counter!("stock_decrement_rejections_total").increment(1);
                Err(LedgerError::Unavailable { product_id, status })
            }
            StockDecrement::Insufficient { available } => {
                metrics::counter!("stock_decrement_rejections_total").increment(1);
                Err(LedgerError::InsufficientStock {
                    product_id,
                    available,
                    requested: quantity,
                })
            }
        }
    }

    /// Atomically restores `quantity` units, flipping `out_of_stock`
    /// back to `available`. Withdrawn products keep their status.
    #[tracing::instrument(skip(self))]
    pub async fn increment(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel> {
        require_positive(quantity)?;

        match self.store.increment_stock(product_id, quantity).await? {
            Some(level) => {
                metrics::counter!("stock_increments_total").increment(1);
                Ok(level)
            }
            None => Err(LedgerError::NotFound(product_id)),
        }
    }

    /// Reports whether `quantity` units could be purchased right now.
    /// Advisory: the answer can be stale by the time a decrement runs.
    #[tracing::instrument(skip(self))]
    pub async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Availability> {
        require_positive(quantity)?;

        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or(LedgerError::NotFound(product_id))?;

        Ok(Availability {
            available: product.can_fulfill(quantity),
            current_inventory: product.inventory,
            status: product.status,
        })
    }

    /// Decrements each line independently; rejections land in
    /// `failed` while earlier successes stand.
    #[tracing::instrument(skip(self, requests), fields(lines = requests.len()))]
    pub async fn bulk_decrement(&self, requests: &[StockRequest]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for request in requests {
            match self.decrement(request.product_id, request.quantity).await {
                Ok(level) => outcome.succeeded.push(BatchItemOutcome {
                    product_id: request.product_id,
                    inventory: level.inventory,
                    status: level.status,
                }),
                Err(LedgerError::Store(err)) => return Err(LedgerError::Store(err)),
                Err(err) => outcome.failed.push(BatchFailure {
                    product_id: request.product_id,
                    reason: err.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    /// Increments each line independently, mirroring
    /// [`bulk_decrement`](Self::bulk_decrement).
    #[tracing::instrument(skip(self, requests), fields(lines = requests.len()))]
    pub async fn bulk_increment(&self, requests: &[StockRequest]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        for request in requests {
            match self.increment(request.product_id, request.quantity).await {
                Ok(level) => outcome.succeeded.push(BatchItemOutcome {
                    product_id: request.product_id,
                    inventory: level.inventory,
                    status: level.status,
                }),
                Err(LedgerError::Store(err)) => return Err(LedgerError::Store(err)),
                Err(err) => outcome.failed.push(BatchFailure {
                    product_id: request.product_id,
                    reason: err.to_string(),
                }),
            }
        }
        Ok(outcome)
    }
}

fn require_positive(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(LedgerError::InvalidArgument(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::Money;
    use domain::{NewProduct, Product};
    use store::MemoryStore;

    async fn seed_product(store: &MemoryStore, inventory: u32) -> ProductId {
        let product = Product::create(
            NewProduct {
                name: "Widget".to_string(),
                price: Money::from_cents(1000),
                description: String::new(),
                image: String::new(),
                inventory,
                variants: vec![],
            },
            Utc::now(),
        )
        .unwrap();
        let id = product.id;
        store.insert_product(&product).await.unwrap();
        id
    }

    #[tokio::test]
    async fn decrement_reserves_stock() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let id = seed_product(&store, 5).await;

        let level = ledger.decrement(id, 3).await.unwrap();
        assert_eq!(level.inventory, 2);
        assert_eq!(level.status, ProductStatus::Available);
    }

    #[tokio::test]
    async fn oversell_is_rejected_with_available_count() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let id = seed_product(&store, 5).await;

        ledger.decrement(id, 3).await.unwrap();
        let err = ledger.decrement(id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            }
        ));

        // The failed attempt must not have touched the count.
        let probe = ledger.check_availability(id, 1).await.unwrap();
        assert_eq!(probe.current_inventory, 2);
    }

    #[tokio::test]
    async fn drained_product_rejects_as_insufficient() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let id = seed_product(&store, 2).await;

        let level = ledger.decrement(id, 2).await.unwrap();
        assert_eq!(level.status, ProductStatus::OutOfStock);

        let err = ledger.decrement(id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { available: 0, .. }
        ));
    }

    #[tokio::test]
    async fn withdrawn_product_rejects_as_unavailable() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let id = seed_product(&store, 5).await;

        let mut product = store.product(id).await.unwrap().unwrap();
        product.withdraw(Utc::now());
        store.update_product(&product).await.unwrap();

        let err = ledger.decrement(id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Unavailable {
                status: ProductStatus::Unavailable,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn zero_quantity_is_invalid() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let id = seed_product(&store, 5).await;

        assert!(matches!(
            ledger.decrement(id, 0).await.unwrap_err(),
            LedgerError::InvalidArgument(_)
        ));
        assert!(matches!(
            ledger.increment(id, 0).await.unwrap_err(),
            LedgerError::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let ledger = StockLedger::new(MemoryStore::default());
        let missing = ProductId::new();

        assert!(matches!(
            ledger.decrement(missing, 1).await.unwrap_err(),
            LedgerError::NotFound(_)
        ));
        assert!(matches!(
            ledger.check_availability(missing, 1).await.unwrap_err(),
            LedgerError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn increment_restores_and_flips_status() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let id = seed_product(&store, 1).await;

        ledger.decrement(id, 1).await.unwrap();
        let level = ledger.increment(id, 3).await.unwrap();
        assert_eq!(level.inventory, 3);
        assert_eq!(level.status, ProductStatus::Available);
    }

    #[tokio::test]
    async fn check_availability_is_read_only() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let id = seed_product(&store, 4).await;

        let probe = ledger.check_availability(id, 5).await.unwrap();
        assert!(!probe.available);
        assert_eq!(probe.current_inventory, 4);

        let probe = ledger.check_availability(id, 4).await.unwrap();
        assert!(probe.available);
        assert_eq!(probe.current_inventory, 4);
    }

    #[tokio::test]
    async fn bulk_decrement_partitions_outcomes() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let plentiful = seed_product(&store, 10).await;
        let scarce = seed_product(&store, 1).await;
        let missing = ProductId::new();

        let outcome = ledger
            .bulk_decrement(&[
                StockRequest {
                    product_id: plentiful,
                    quantity: 2,
                },
                StockRequest {
                    product_id: scarce,
                    quantity: 5,
                },
                StockRequest {
                    product_id: missing,
                    quantity: 1,
                },
            ])
            .await
            .unwrap();

        assert!(!outcome.all_succeeded());
        assert_eq!(outcome.succeeded.len(), 1);
        assert_eq!(outcome.succeeded[0].product_id, plentiful);
        assert_eq!(outcome.succeeded[0].inventory, 8);
        assert_eq!(outcome.failed.len(), 2);

        // The successful line stands even though later lines failed.
        let probe = ledger.check_availability(plentiful, 1).await.unwrap();
        assert_eq!(probe.current_inventory, 8);
        let probe = ledger.check_availability(scarce, 1).await.unwrap();
        assert_eq!(probe.current_inventory, 1);
    }

    #[tokio::test]
    async fn bulk_increment_restores_cancelled_lines() {
        let store = MemoryStore::default();
        let ledger = StockLedger::new(store.clone());
        let id = seed_product(&store, 5).await;
        ledger.decrement(id, 5).await.unwrap();

        let outcome = ledger
            .bulk_increment(&[StockRequest {
                product_id: id,
                quantity: 5,
            }])
            .await
            .unwrap();

        assert!(outcome.all_succeeded());
        assert_eq!(outcome.succeeded[0].inventory, 5);
        assert_eq!(outcome.succeeded[0].status, ProductStatus::Available);
    }
}
