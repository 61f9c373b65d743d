//! Stock ledger: the single authority over inventory counts.
//!
//! Every inventory mutation in the system goes through
//! [`StockLedger::decrement`] or [`StockLedger::increment`], which
//! delegate to the store's atomic conditional updates and translate
//! the raw outcomes into the service error taxonomy. Batch variants
//! apply each line independently and report a partitioned outcome;
//! they never roll back lines that already succeeded.

mod error;
mod ledger;

pub use error::{LedgerError, Result};
pub use ledger::{Availability, BatchFailure, BatchItemOutcome, BatchOutcome, StockLedger, StockRequest};
