//! Shared helpers for invoicing-engine integration tests.
#![allow(dead_code)]

use chrono::{Duration, NaiveDate, Utc};
use engine_core::config::EngineConfig;
use invoicing_engine::models::{CreateInvoice, CreateLineItem, CreatePayment, Invoice, LineItem};
use invoicing_engine::services::InvoiceStore;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Parse a decimal literal.
pub fn money(s: &str) -> Decimal {
    s.parse().expect("invalid decimal literal")
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn test_store() -> InvoiceStore {
    InvoiceStore::new(EngineConfig::default())
}

/// Create a draft invoice due 30 days out.
pub fn create_draft(store: &InvoiceStore, customer_name: &str, tax_rate: &str) -> Invoice {
    create_draft_due(store, customer_name, tax_rate, today() + Duration::days(30))
}

/// Create a draft invoice with an explicit due date.
pub fn create_draft_due(
    store: &InvoiceStore,
    customer_name: &str,
    tax_rate: &str,
    due_date: NaiveDate,
) -> Invoice {
    store
        .create_invoice(&CreateInvoice {
            customer_id: Uuid::new_v4(),
            customer_name: customer_name.to_string(),
            currency: None,
            due_date: Some(due_date),
            tax_rate: money(tax_rate),
            notes: None,
        })
        .expect("Failed to create invoice")
}

/// Add a line item to a draft invoice.
pub fn add_item(
    store: &InvoiceStore,
    invoice_id: Uuid,
    description: &str,
    quantity: &str,
    unit_price: &str,
) -> LineItem {
    store
        .add_line_item(
            invoice_id,
            &CreateLineItem {
                description: description.to_string(),
                quantity: money(quantity),
                unit_price: money(unit_price),
                sort_order: 0,
            },
        )
        .expect("Failed to add line item")
}

/// Create, populate and send an invoice for a single line of `amount`.
pub fn sent_invoice(store: &InvoiceStore, customer_name: &str, amount: &str) -> Invoice {
    let invoice = create_draft(store, customer_name, "0");
    add_item(store, invoice.invoice_id, "Consulting services", "1", amount);
    store
        .send_invoice(invoice.invoice_id, today())
        .expect("Failed to send invoice")
        .expect("Invoice missing")
}

/// A bank-transfer payment input dated today.
pub fn payment(amount: &str) -> CreatePayment {
    CreatePayment {
        amount: money(amount),
        method: "bank_transfer".to_string(),
        reference: None,
        payment_date: today(),
        notes: None,
    }
}
