//! Order checkout, lifecycle, and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use checkout::{CancelActor, CartLine};
use common::{Money, OrderId, ProductId};
use domain::{
    CustomerInfo, NewOrder, Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress,
    Variant,
};
use query::{OrderStats, Page};
use serde::Deserialize;
use store::{OrderFilter, OrderSort, PageRequest};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::{AppState, BackingStore};

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CartLineRequest>,
    pub shipping_address: ShippingAddressRequest,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub shipping_fee: Money,
    #[serde(default)]
    pub discount_amount: Money,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Variant,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressRequest {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub ward: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    #[serde(default)]
    pub period: Option<u32>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payment_status: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// -- Handlers --

/// POST /orders — place an order for the authenticated customer.
#[tracing::instrument(skip(state, identity, req), fields(user_id = %identity.user_id))]
pub async fn create<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let input = NewOrder {
        customer_id: identity.user_id,
        customer: CustomerInfo {
            name: identity.name.clone(),
            email: identity.email.clone(),
        },
        shipping_address: ShippingAddress {
            full_name: req.shipping_address.full_name,
            phone: req.shipping_address.phone,
            address: req.shipping_address.address,
            city: req.shipping_address.city,
            district: req.shipping_address.district,
            ward: req.shipping_address.ward,
        },
        payment_method: req.payment_method,
        notes: req.notes,
        shipping_fee: req.shipping_fee,
        discount_amount: req.discount_amount,
    };
    let lines: Vec<CartLine> = req
        .items
        .into_iter()
        .map(|item| CartLine {
            product_id: item.product_id,
            quantity: item.quantity,
            variant: item.variant,
        })
        .collect();

    let order = state.coordinator.create_order(input, lines).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders — admin listing with filters, sort, and pagination.
#[tracing::instrument(skip(state, identity, params))]
pub async fn list<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Order>>, ApiError> {
    identity.require_admin()?;

    let (filter, sort, page) = parse_listing(&params)?;
    let page = state.orders.list(&filter, sort, page).await?;
    Ok(Json(page))
}

/// GET /orders/my-orders — the caller's own orders.
#[tracing::instrument(skip(state, identity, params), fields(user_id = %identity.user_id))]
pub async fn my_orders<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Order>>, ApiError> {
    let (filter, sort, page) = parse_listing(&params)?;
    let page = state
        .orders
        .customer_orders(identity.user_id, filter, sort, page)
        .await?;
    Ok(Json(page))
}

/// GET /orders/admin/stats — sales statistics over a trailing window.
#[tracing::instrument(skip(state, identity))]
pub async fn stats<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Query(params): Query<StatsParams>,
) -> Result<Json<OrderStats>, ApiError> {
    identity.require_admin()?;
    let stats = state.orders.stats(params.period.unwrap_or(30)).await?;
    Ok(Json(stats))
}

/// GET /orders/:id — one order; customers only see their own.
#[tracing::instrument(skip(state, identity))]
pub async fn get<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = if identity.is_admin() {
        state.orders.order(order_id).await?
    } else {
        state
            .orders
            .customer_order(order_id, identity.user_id)
            .await?
    };
    Ok(Json(order))
}

/// PUT /orders/:id/status — admin lifecycle transition.
#[tracing::instrument(skip(state, identity, req))]
pub async fn update_status<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    identity.require_admin()?;
    let order_id = parse_order_id(&id)?;
    let to: OrderStatus = req
        .status
        .parse()
        .map_err(|e: String| ApiError::BadRequest(e))?;

    let order = state
        .coordinator
        .update_order_status(order_id, to, req.note, actor(&identity))
        .await?;
    Ok(Json(order))
}

/// PUT /orders/:id/payment — admin payment status update.
#[tracing::instrument(skip(state, identity, req))]
pub async fn update_payment<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<Json<Order>, ApiError> {
    identity.require_admin()?;
    let order_id = parse_order_id(&id)?;
    let payment_status: PaymentStatus = req
        .payment_status
        .parse()
        .map_err(|e: String| ApiError::BadRequest(e))?;

    let order = state
        .coordinator
        .update_payment_status(order_id, payment_status, req.note, actor(&identity))
        .await?;
    Ok(Json(order))
}

/// POST /orders/:id/cancel — cancel an order and restore its stock.
#[tracing::instrument(skip(state, identity, req), fields(user_id = %identity.user_id))]
pub async fn cancel<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let cancel_actor = if identity.is_admin() {
        CancelActor::Admin {
            name: actor(&identity),
        }
    } else {
        CancelActor::Customer(identity.user_id)
    };

    let order = state
        .coordinator
        .cancel_order(order_id, cancel_actor, req.reason)
        .await?;
    Ok(Json(order))
}

// -- Helpers --

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

fn actor(identity: &Identity) -> Option<String> {
    if !identity.name.is_empty() {
        Some(identity.name.clone())
    } else if !identity.email.is_empty() {
        Some(identity.email.clone())
    } else {
        None
    }
}

fn parse_listing(params: &ListParams) -> Result<(OrderFilter, OrderSort, PageRequest), ApiError> {
    let mut filter = OrderFilter::new();
    if let Some(ref status) = params.status {
        filter.status = Some(
            status
                .parse()
                .map_err(|e: String| ApiError::BadRequest(e))?,
        );
    }
    if let Some(ref payment_status) = params.payment_status {
        filter.payment_status = Some(
            payment_status
                .parse()
                .map_err(|e: String| ApiError::BadRequest(e))?,
        );
    }
    if let Some(ref search) = params.search {
        filter.search = Some(search.clone());
    }
    filter.created_from = params.start_date;
    filter.created_to = params.end_date;

    let sort = match params.sort_by {
        Some(ref key) => key.parse().map_err(|e: String| ApiError::BadRequest(e))?,
        None => OrderSort::default(),
    };

    let page = PageRequest::new(params.page.unwrap_or(1), params.limit.unwrap_or(10));
    Ok((filter, sort, page))
}
