//! Inventory probe and batch adjustment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::ProductId;
use ledger::{Availability, BatchOutcome, StockRequest};
use serde::Deserialize;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::{AppState, BackingStore};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub items: Vec<BatchItemRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// POST /inventory/check — read-only availability probe.
#[tracing::instrument(skip(state, req))]
pub async fn check<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<Availability>, ApiError> {
    let availability = state
        .ledger
        .check_availability(req.product_id, req.quantity)
        .await?;
    Ok(Json(availability))
}

/// POST /inventory/process-order — batch stock decrement.
///
/// Lines apply independently; a partial failure returns 400 with the
/// partitioned outcome so the caller can see which lines stood.
#[tracing::instrument(skip(state, identity, req))]
pub async fn process_order<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchOutcome>), ApiError> {
    identity.require_admin()?;
    let outcome = state.ledger.bulk_decrement(&to_requests(req)).await?;
    Ok((batch_status(&outcome), Json(outcome)))
}

/// POST /inventory/cancel-order — batch stock restoration.
#[tracing::instrument(skip(state, identity, req))]
pub async fn cancel_order<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<BatchRequest>,
) -> Result<(StatusCode, Json<BatchOutcome>), ApiError> {
    identity.require_admin()?;
    let outcome = state.ledger.bulk_increment(&to_requests(req)).await?;
    Ok((batch_status(&outcome), Json(outcome)))
}

fn to_requests(req: BatchRequest) -> Vec<StockRequest> {
    req.items
        .into_iter()
        .map(|item| StockRequest {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect()
}

fn batch_status(outcome: &BatchOutcome) -> StatusCode {
    if outcome.all_succeeded() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}
