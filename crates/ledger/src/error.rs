use common::ProductId;
use domain::ProductStatus;
use store::StoreError;
use thiserror::Error;

/// Errors raised by stock ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The product exists but was withdrawn from sale.
    #[error("product {product_id} is not sellable (status: {status})")]
    Unavailable {
        product_id: ProductId,
        status: ProductStatus,
    },

    #[error(
        "insufficient stock for product {product_id}: {available} available, {requested} requested"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
