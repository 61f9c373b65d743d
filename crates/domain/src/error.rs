//! Domain error taxonomy.

use thiserror::Error;

use crate::status::OrderStatus;

/// Errors raised by the data model itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Order status change violates the state machine.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Malformed input: negative amount, zero quantity, empty field.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Checkout attempted with zero items.
    #[error("order must contain at least one item")]
    EmptyCart,
}
