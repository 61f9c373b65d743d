use common::{OrderId, ProductId};
use domain::{DomainError, OrderStatus, ProductStatus};
use store::StoreError;
use thiserror::Error;

/// Errors raised by the reservation coordinator.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("product {product_id} is not sellable (status: {status})")]
    ProductUnavailable {
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

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// Cancellation refused for the order's current status. Customers
    /// may only cancel pending orders; admins may cancel anything
    /// non-terminal.
    #[error("order cannot be cancelled in status {status}")]
    CannotCancel { status: OrderStatus },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
