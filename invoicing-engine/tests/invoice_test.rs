//! Invoice CRUD tests: creation, retrieval, listing and draft-only updates.

mod common;

use common::{add_item, create_draft, money, payment, sent_invoice, test_store, today};
use engine_core::error::EngineError;
use invoicing_engine::models::{
    CreateInvoice, DeliveryState, InvoiceStatus, ListInvoicesFilter, PaymentState, UpdateInvoice,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[test]
fn create_invoice_starts_as_empty_draft() {
    let store = test_store();
    let invoice = create_draft(&store, "New Customer", "18");

    assert_eq!(invoice.delivery_state, DeliveryState::Draft);
    assert_eq!(invoice.payment_state, PaymentState::Unpaid);
    assert!(invoice.invoice_number.is_none());
    assert!(invoice.line_items.is_empty());
    assert_eq!(invoice.total, Decimal::ZERO);
    assert_eq!(invoice.balance_due, Decimal::ZERO);
    assert_eq!(invoice.currency, "USD");
    assert_eq!(invoice.tax_rate, money("18"));
}

#[test]
fn create_invoice_rejects_blank_customer_name() {
    let store = test_store();
    let result = store.create_invoice(&CreateInvoice {
        customer_id: Uuid::new_v4(),
        customer_name: String::new(),
        currency: None,
        due_date: None,
        tax_rate: Decimal::ZERO,
        notes: None,
    });
    assert!(matches!(result, Err(EngineError::ValidationError(_))));
}

#[test]
fn create_invoice_rejects_out_of_range_tax_rate() {
    let store = test_store();
    let result = store.create_invoice(&CreateInvoice {
        customer_id: Uuid::new_v4(),
        customer_name: "Tax Range Customer".to_string(),
        currency: None,
        due_date: None,
        tax_rate: money("150"),
        notes: None,
    });
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[test]
fn get_invoice_returns_none_for_unknown_id() {
    let store = test_store();
    let result = store
        .get_invoice(Uuid::new_v4())
        .expect("Lookup should not error");
    assert!(result.is_none());
}

#[test]
fn update_draft_header_fields() {
    let store = test_store();
    let invoice = create_draft(&store, "Old Name", "0");

    let updated = store
        .update_invoice(
            invoice.invoice_id,
            &UpdateInvoice {
                customer_name: Some("New Name".to_string()),
                notes: Some("Net 30".to_string()),
                ..Default::default()
            },
        )
        .expect("Failed to update invoice")
        .expect("Invoice missing");

    assert_eq!(updated.customer_name, "New Name");
    assert_eq!(updated.notes.as_deref(), Some("Net 30"));
}

#[test]
fn list_invoices_filters_by_customer() {
    let store = test_store();
    let mine = create_draft(&store, "Mine", "0");
    create_draft(&store, "Theirs", "0");

    let listed = store
        .list_invoices(&ListInvoicesFilter {
            customer_id: Some(mine.customer_id),
            page_size: 10,
            ..Default::default()
        })
        .expect("Failed to list invoices");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].invoice_id, mine.invoice_id);
}

#[test]
fn list_invoices_filters_by_flattened_status() {
    let store = test_store();
    let draft = create_draft(&store, "Draft Customer", "0");
    add_item(&store, draft.invoice_id, "Work", "1", "100");
    let paid = sent_invoice(&store, "Paid Customer", "200");
    store
        .record_payment(paid.invoice_id, &payment("200"))
        .expect("Failed to record payment");

    let paid_only = store
        .list_invoices(&ListInvoicesFilter {
            status: Some(InvoiceStatus::Paid),
            page_size: 10,
            ..Default::default()
        })
        .expect("Failed to list invoices");

    assert_eq!(paid_only.len(), 1);
    assert_eq!(paid_only[0].invoice_id, paid.invoice_id);
}

#[test]
fn list_invoices_paginates_with_cursor() {
    let store = test_store();
    for i in 0..5 {
        create_draft(&store, &format!("Customer {}", i), "0");
    }

    let first_page = store
        .list_invoices(&ListInvoicesFilter {
            page_size: 2,
            ..Default::default()
        })
        .expect("Failed to list first page");
    assert_eq!(first_page.len(), 2);

    let second_page = store
        .list_invoices(&ListInvoicesFilter {
            page_size: 2,
            page_token: Some(first_page[1].invoice_id),
            ..Default::default()
        })
        .expect("Failed to list second page");
    assert_eq!(second_page.len(), 2);
    assert!(second_page[0].invoice_id > first_page[1].invoice_id);
}

#[test]
fn invoice_uses_configured_default_currency() {
    let store = test_store();
    let invoice = store
        .create_invoice(&CreateInvoice {
            customer_id: Uuid::new_v4(),
            customer_name: "Currency Customer".to_string(),
            currency: Some("EUR".to_string()),
            due_date: Some(today()),
            tax_rate: Decimal::ZERO,
            notes: None,
        })
        .expect("Failed to create invoice");
    assert_eq!(invoice.currency, "EUR");
}
