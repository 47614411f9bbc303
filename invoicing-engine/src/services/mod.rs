//! Engine services: totals, schedule reconciliation, ledger, lifecycle, store.

pub mod ledger;
pub mod lifecycle;
pub mod metrics;
pub mod schedule;
pub mod store;
pub mod totals;

pub use store::InvoiceStore;
pub use totals::{PreviewItem, TotalsBreakdown};
