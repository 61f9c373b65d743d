//! Backing store for products and orders.
//!
//! The [`ProductStore`] and [`OrderStore`] traits are the only way the
//! rest of the system touches persistent state. Two implementations
//! are provided: [`MemoryStore`] for tests and local development, and
//! [`PgStore`] backed by PostgreSQL.
//!
//! The stock compare-and-swap primitive lives here because only the
//! store can make validate-and-mutate a single atomic step: the
//! in-memory implementation does it under one write lock, the Postgres
//! implementation with one conditional `UPDATE`.

mod error;
mod memory;
mod postgres;
mod query;
mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query::{
    OrderFilter, OrderSort, PageInfo, PageRequest, ProductFilter, ProductSort,
};
pub use store::{OrderStore, ProductStore, StockDecrement, StockLevel};
