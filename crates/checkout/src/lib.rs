//! Reservation coordinator: the write path for orders.
//!
//! Checkout validates every cart line against live product state,
//! persists the order, and then reserves stock line by line through
//! the ledger. A decrement that fails after the order is persisted is
//! logged and counted, not rolled back; cancellation restores stock on
//! a best-effort basis. The order document itself is protected by
//! optimistic versioning in the store.

mod coordinator;
mod error;

pub use coordinator::{CancelActor, CartLine, ReservationCoordinator};
pub use error::{CheckoutError, Result};
