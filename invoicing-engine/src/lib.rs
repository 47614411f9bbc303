//! invoicing-engine: the financial engine behind the invoicing platform.
//!
//! Derives monetary totals from line items, tax and discounts, reconciles
//! optional payment schedules against the total, applies payments to the
//! outstanding balance, and enforces the invoice lifecycle. Persistence and
//! transport live outside this crate; [`services::InvoiceStore`] is the
//! in-process aggregate store that gives callers the per-invoice atomic
//! read-modify-write the payment path requires.

pub mod models;
pub mod services;

pub use engine_core::error::EngineError;
pub use engine_core::money::{format_decimal, round_money, within_tolerance, AMOUNT_TOLERANCE};
