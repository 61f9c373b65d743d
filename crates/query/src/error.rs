use common::{OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Errors raised by the read-side queries.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, QueryError>;
