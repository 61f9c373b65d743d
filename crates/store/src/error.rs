//! Store error types.

use common::OrderId;
use thiserror::Error;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Optimistic concurrency check failed on an order update.
    #[error("version conflict on order {order_id}: expected {expected}, actual {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// Update targeted an order that does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// A stored record failed to decode.
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
}

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
