//! Read-side queries over the store seam.
//!
//! Listings return a [`Page`] with the standard pagination envelope;
//! the reporting aggregate scans a creation-time window and excludes
//! cancelled orders from revenue.

mod error;
mod orders;
mod products;

pub use error::{QueryError, Result};
pub use orders::{OrderQueries, OrderStats, Page, StatusBucket};
pub use products::ProductQueries;
