//! Order listings and the reporting aggregate.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use common::{CustomerId, Money, OrderId};
use domain::{Order, OrderStatus};
use serde::Serialize;
use store::{OrderFilter, OrderSort, OrderStore, PageInfo, PageRequest};

use crate::error::{QueryError, Result};

/// One page of listing results plus the pagination envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

/// Per-status slice of the reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusBucket {
    pub count: u64,
    pub amount: Money,
}

/// Sales statistics over a trailing creation-time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub period_days: u32,
    pub total_orders: u64,
    /// Sum of final amounts, excluding cancelled orders.
    pub total_revenue: Money,
    /// Order count and amount per status label.
    pub status_breakdown: BTreeMap<String, StatusBucket>,
}

/// Read-side queries over orders.
#[derive(Debug, Clone)]
pub struct OrderQueries<S> {
    store: S,
}

impl<S: OrderStore> OrderQueries<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .order(order_id)
            .await?
            .ok_or(QueryError::OrderNotFound(order_id))
    }

    /// Fetches an order on behalf of a customer. Orders owned by
    /// someone else are reported as not found.
    pub async fn customer_order(
        &self,
        order_id: OrderId,
        customer_id: CustomerId,
    ) -> Result<Order> {
        let order = self.order(order_id).await?;
        if order.customer_id() != customer_id {
            return Err(QueryError::OrderNotFound(order_id));
        }
        Ok(order)
    }

    #[tracing::instrument(skip(self, filter))]
    pub async fn list(
        &self,
        filter: &OrderFilter,
        sort: OrderSort,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let (items, total) = self.store.find_orders(filter, sort, page).await?;
        Ok(Page {
            items,
            page_info: PageInfo::build(page, total),
        })
    }

    /// Lists one customer's orders; the customer predicate always
    /// wins over whatever the filter carries.
    #[tracing::instrument(skip(self, filter))]
    pub async fn customer_orders(
        &self,
        customer_id: CustomerId,
        mut filter: OrderFilter,
        sort: OrderSort,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        filter.customer_id = Some(customer_id);
        self.list(&filter, sort, page).await
    }

    /// Computes sales statistics over the trailing `period_days`.
    #[tracing::instrument(skip(self))]
    pub async fn stats(&self, period_days: u32) -> Result<OrderStats> {
        let since = Utc::now() - Duration::days(i64::from(period_days));
        let orders = self.store.orders_created_since(since).await?;

        let mut status_breakdown: BTreeMap<String, StatusBucket> = BTreeMap::new();
        let mut total_revenue = Money::zero();
        for order in &orders {
            let bucket = status_breakdown
                .entry(order.status().as_str().to_string())
                .or_default();
            bucket.count += 1;
            bucket.amount += order.final_amount();
            if order.status() != OrderStatus::Cancelled {
                total_revenue += order.final_amount();
            }
        }

        Ok(OrderStats {
            period_days,
            total_orders: orders.len() as u64,
            total_revenue,
            status_breakdown,
        })
    }
}
