//! Shared types used across the reservation service.
//!
//! Typed UUID wrappers prevent mixing up product, order, and customer
//! identifiers, and [`Money`] keeps amounts in integer cents.

mod ids;
mod money;

pub use ids::{CustomerId, OrderId, ProductId};
pub use money::Money;
