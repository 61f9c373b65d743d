//! Order write-path orchestration over the store and the stock ledger.

use chrono::Utc;
use common::{CustomerId, OrderId, ProductId};
use domain::{
    DomainError, LineItem, NewOrder, Order, OrderStatus, PaymentStatus, ProductStatus, Variant,
};
use ledger::StockLedger;
use serde::Deserialize;
use store::{OrderStore, ProductStore};

use crate::error::{CheckoutError, Result};

/// One cart line from a checkout request. The product snapshot is
/// taken by the coordinator, not trusted from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Variant,
}

/// Who is asking for a cancellation.
#[derive(Debug, Clone)]
pub enum CancelActor {
    /// A customer may only cancel their own pending orders. Orders
    /// they do not own are reported as not found.
    Customer(CustomerId),
    /// An admin may cancel any non-terminal order.
    Admin { name: Option<String> },
}

/// Coordinates checkout, cancellation, and lifecycle updates.
#[derive(Debug, Clone)]
pub struct ReservationCoordinator<S> {
    store: S,
    ledger: StockLedger<S>,
}

impl<S> ReservationCoordinator<S>
where
    S: ProductStore + OrderStore + Clone,
{
    pub fn new(store: S) -> Self {
        let ledger = StockLedger::new(store.clone());
        Self { store, ledger }
    }

    /// Places an order.
    ///
    /// Runs a validate-all read phase over every cart line, snapshots
    /// the product data into line items, persists the order, and then
    /// reserves stock line by line. The read phase is advisory: the
    /// per-line decrement is the authoritative check, and a line that
    /// fails there after the order is persisted is logged and counted
    /// rather than rolled back.
    #[tracing::instrument(skip(self, input, lines), fields(customer_id = %input.customer_id, lines = lines.len()))]
    pub async fn create_order(&self, input: NewOrder, lines: Vec<CartLine>) -> Result<Order> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            if line.quantity == 0 {
                return Err(CheckoutError::Domain(DomainError::InvalidArgument(
                    "line item quantity must be at least 1".to_string(),
                )));
            }
            let product = self
                .store
                .product(line.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;
            if product.status != ProductStatus::Available {
                return Err(CheckoutError::ProductUnavailable {
                    product_id: product.id,
                    status: product.status,
                });
            }
            if product.inventory < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    available: product.inventory,
                    requested: line.quantity,
                });
            }
            items.push(LineItem {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity: line.quantity,
                variant: line.variant.clone(),
                image: product.image.clone(),
            });
        }

        let seq = self.store.next_order_number().await?;
        let order = Order::place(seq, input, items, Utc::now())?;
        self.store.insert_order(&order).await?;

        for item in order.items() {
            if let Err(err) = self.ledger.decrement(item.product_id, item.quantity).await {
                // The order already exists; surface the discrepancy
                // instead of failing the checkout.
                metrics::counter!("checkout_decrement_failures_total").increment(1);
                tracing::error!(
                    order_id = %order.id(),
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %err,
                    "stock decrement failed after order was persisted"
                );
            }
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id(), order_number = order.order_number(), "order placed");
        Ok(order)
    }

    /// Cancels an order and restores its reserved stock.
    ///
    /// Stock is restored only after the cancelled order has won the
    /// version check; a racing cancellation fails there before it can
    /// touch inventory. Restoration is best-effort per line; a line
    /// that fails to restore is logged and skipped.
    #[tracing::instrument(skip(self, note))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        actor: CancelActor,
        note: Option<String>,
    ) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        let actor_name = match actor {
            CancelActor::Customer(customer_id) => {
                if order.customer_id() != customer_id {
                    // Do not reveal that the order exists.
                    return Err(CheckoutError::OrderNotFound(order_id));
                }
                if order.status() != OrderStatus::Pending {
                    return Err(CheckoutError::CannotCancel {
                        status: order.status(),
                    });
                }
                None
            }
            CancelActor::Admin { name } => {
                if !order.status().can_cancel() {
                    return Err(CheckoutError::CannotCancel {
                        status: order.status(),
                    });
                }
                name
            }
        };

        order.transition_to(OrderStatus::Cancelled, note, actor_name, Utc::now())?;
        self.store.update_order(&mut order).await?;

        self.restore_stock(&order).await;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");
        Ok(order)
    }

    /// Moves an order along its lifecycle (admin path). A transition
    /// to cancelled restores stock after the update is persisted.
    #[tracing::instrument(skip(self, note, actor))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        to: OrderStatus,
        note: Option<String>,
        actor: Option<String>,
    ) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        order.transition_to(to, note, actor, Utc::now())?;
        self.store.update_order(&mut order).await?;

        if to == OrderStatus::Cancelled {
            self.restore_stock(&order).await;
        }

        tracing::info!(%order_id, status = %to, "order status updated");
        Ok(order)
    }

    /// Records a payment status change (admin path).
    #[tracing::instrument(skip(self, note, actor))]
    pub async fn update_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
        note: Option<String>,
        actor: Option<String>,
    ) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or(CheckoutError::OrderNotFound(order_id))?;

        order.set_payment_status(payment_status, note, actor, Utc::now());
        self.store.update_order(&mut order).await?;

        tracing::info!(%order_id, payment_status = %payment_status, "payment status updated");
        Ok(order)
    }

    async fn restore_stock(&self, order: &Order) {
        for item in order.items() {
            if let Err(err) = self.ledger.increment(item.product_id, item.quantity).await {
                tracing::warn!(
                    order_id = %order.id(),
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %err,
                    "stock restoration failed"
                );
            }
        }
    }
}
