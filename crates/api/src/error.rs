//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::DomainError;
use ledger::LedgerError;
use query::QueryError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found (or not visible to the caller).
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or malformed identity headers.
    Unauthorized(String),
    /// Authenticated but lacking the required role.
    Forbidden(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Stock ledger error.
    Ledger(LedgerError),
    /// Checkout/cancellation error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Ledger(err) => ledger_error_to_response(err),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "message": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::InvalidArgument(_) | DomainError::EmptyCart => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    match &err {
        LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        LedgerError::Unavailable { .. }
        | LedgerError::InsufficientStock { .. }
        | LedgerError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        LedgerError::Store(store_err) => store_error_to_response(store_err),
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::ProductNotFound(_) | CheckoutError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CheckoutError::EmptyCart
        | CheckoutError::ProductUnavailable { .. }
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::CannotCancel { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::Domain(err) => domain_error_to_response(err),
        CheckoutError::Store(store_err) => store_error_to_response(&store_err),
    }
}

fn store_error_to_response(err: &StoreError) -> (StatusCode, String) {
    match err {
        StoreError::VersionConflict { .. } => (StatusCode::CONFLICT, err.to_string()),
        StoreError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        other => {
            tracing::error!(error = %other, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::OrderNotFound(id) => ApiError::NotFound(format!("order not found: {id}")),
            QueryError::ProductNotFound(id) => {
                ApiError::NotFound(format!("product not found: {id}"))
            }
            QueryError::Store(store_err) => ApiError::from(store_err),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrderNotFound(id) => ApiError::NotFound(format!("order not found: {id}")),
            conflict @ StoreError::VersionConflict { .. } => {
                ApiError::Checkout(CheckoutError::Store(conflict))
            }
            other => {
                tracing::error!(error = %other, "store failure");
                ApiError::Internal("internal server error".to_string())
            }
        }
    }
}
