//! Data model for the inventory-reservation service.
//!
//! This crate owns the two persistent document types — [`Product`] and
//! [`Order`] — along with the order status state machine and the
//! domain-level error taxonomy. All inventory mutation goes through
//! the stock ledger; all order status mutation goes through the
//! methods on [`Order`] so the state machine and the status-history
//! log cannot be bypassed.

mod error;
mod order;
mod product;
mod status;

pub use error::DomainError;
pub use order::{
    CustomerInfo, LineItem, NewOrder, Order, ShippingAddress, StatusHistoryEntry, format_order_number,
};
pub use product::{NewProduct, Product, ProductStatus, Variant};
pub use status::{OrderStatus, PaymentMethod, PaymentStatus};
