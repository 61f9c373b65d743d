//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use common::{Money, ProductId};
use domain::{NewProduct, Product, Variant};
use query::Page;
use serde::Deserialize;
use store::{PageRequest, ProductFilter, ProductSort};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::{AppState, BackingStore};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub min_price: Option<Money>,
    #[serde(default)]
    pub max_price: Option<Money>,
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub variants: Option<Vec<Variant>>,
}

/// POST /products — admin creates a product.
#[tracing::instrument(skip(state, identity, req))]
pub async fn create<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    identity.require_admin()?;
    let product = Product::create(req, Utc::now())?;
    state.store.insert_product(&product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products — catalog listing with filters, sort, and pagination.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Page<Product>>, ApiError> {
    let mut filter = ProductFilter::new();
    if let Some(ref search) = params.search {
        filter.search = Some(search.clone());
    }
    if let Some(ref status) = params.status {
        filter.status = Some(
            status
                .parse()
                .map_err(|e: String| ApiError::BadRequest(e))?,
        );
    }
    filter.price_min = params.min_price;
    filter.price_max = params.max_price;

    let sort = match params.sort_by {
        Some(ref key) => key
            .parse::<ProductSort>()
            .map_err(|e: String| ApiError::BadRequest(e))?,
        None => ProductSort::default(),
    };
    let page = PageRequest::new(params.page.unwrap_or(1), params.limit.unwrap_or(10));

    let page = state.products.list(&filter, sort, page).await?;
    Ok(Json(page))
}

/// GET /products/:id — one product.
#[tracing::instrument(skip(state))]
pub async fn get<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product_id = parse_product_id(&id)?;
    let product = state.products.product(product_id).await?;
    Ok(Json(product))
}

/// PUT /products/:id — admin updates catalog fields. The inventory
/// count is not writable here; it only moves through the stock
/// operations.
#[tracing::instrument(skip(state, identity, req))]
pub async fn update<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    identity.require_admin()?;
    let product_id = parse_product_id(&id)?;
    let mut product = state.products.product(product_id).await?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "product name must not be empty".to_string(),
            ));
        }
        product.name = name;
    }
    if let Some(price) = req.price {
        if price.is_negative() {
            return Err(ApiError::BadRequest(
                "product price must not be negative".to_string(),
            ));
        }
        product.price = price;
    }
    if let Some(description) = req.description {
        product.description = description;
    }
    if let Some(image) = req.image {
        product.image = image;
    }
    if let Some(ref status) = req.status {
        product.status = status
            .parse()
            .map_err(|e: String| ApiError::BadRequest(e))?;
    }
    if let Some(variants) = req.variants {
        product.variants = variants;
    }
    product.updated_at = Utc::now();

    if !state.store.update_product(&product).await? {
        return Err(ApiError::NotFound(format!("product not found: {id}")));
    }
    // Re-read so the response carries the live inventory count, which
    // the catalog update does not write.
    let product = state.products.product(product_id).await?;
    Ok(Json(product))
}

/// DELETE /products/:id — admin soft delete.
#[tracing::instrument(skip(state, identity))]
pub async fn withdraw<S: BackingStore>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    identity.require_admin()?;
    let product_id = parse_product_id(&id)?;
    let mut product = state.products.product(product_id).await?;

    product.withdraw(Utc::now());
    if !state.store.update_product(&product).await? {
        return Err(ApiError::NotFound(format!("product not found: {id}")));
    }
    let product = state.products.product(product_id).await?;
    Ok(Json(product))
}

fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("invalid product id: {e}")))?;
    Ok(ProductId::from_uuid(uuid))
}
