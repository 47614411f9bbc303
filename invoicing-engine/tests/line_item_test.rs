//! Line item tests: creation, validation, editing and total recomputation.

mod common;

use common::{add_item, create_draft, money, test_store};
use engine_core::error::EngineError;
use invoicing_engine::models::{CreateLineItem, UpdateLineItem};
use uuid::Uuid;

#[test]
fn add_line_item_derives_amount() {
    let store = test_store();
    let invoice = create_draft(&store, "Amount Customer", "0");

    let item = add_item(&store, invoice.invoice_id, "Design work", "2.5", "120");

    assert_eq!(item.amount, money("300"));
    assert_eq!(item.description, "Design work");
}

#[test]
fn add_line_item_recomputes_invoice_totals() {
    let store = test_store();
    let invoice = create_draft(&store, "Recompute Customer", "10");

    add_item(&store, invoice.invoice_id, "Phase one", "1", "500");
    add_item(&store, invoice.invoice_id, "Phase two", "2", "250");

    let invoice = store
        .get_invoice(invoice.invoice_id)
        .expect("Failed to get invoice")
        .expect("Invoice missing");
    assert_eq!(invoice.subtotal, money("1000"));
    assert_eq!(invoice.tax_amount, money("100"));
    assert_eq!(invoice.total, money("1100"));
}

#[test]
fn empty_description_is_rejected() {
    let store = test_store();
    let invoice = create_draft(&store, "Validation Customer", "0");

    let result = store.add_line_item(
        invoice.invoice_id,
        &CreateLineItem {
            description: String::new(),
            quantity: money("1"),
            unit_price: money("10"),
            sort_order: 0,
        },
    );
    assert!(matches!(result, Err(EngineError::ValidationError(_))));
}

#[test]
fn non_positive_quantity_is_rejected() {
    let store = test_store();
    let invoice = create_draft(&store, "Quantity Customer", "0");

    let zero = store.add_line_item(
        invoice.invoice_id,
        &CreateLineItem {
            description: "Zero qty".to_string(),
            quantity: money("0"),
            unit_price: money("10"),
            sort_order: 0,
        },
    );
    assert!(matches!(zero, Err(EngineError::InvalidInput(_))));

    let negative = store.add_line_item(
        invoice.invoice_id,
        &CreateLineItem {
            description: "Negative qty".to_string(),
            quantity: money("-1"),
            unit_price: money("10"),
            sort_order: 0,
        },
    );
    assert!(matches!(negative, Err(EngineError::InvalidInput(_))));
}

#[test]
fn negative_unit_price_is_rejected() {
    let store = test_store();
    let invoice = create_draft(&store, "Price Customer", "0");

    let result = store.add_line_item(
        invoice.invoice_id,
        &CreateLineItem {
            description: "Negative price".to_string(),
            quantity: money("1"),
            unit_price: money("-5"),
            sort_order: 0,
        },
    );
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));
}

#[test]
fn update_line_item_recomputes_amount_and_totals() {
    let store = test_store();
    let invoice = create_draft(&store, "Update Customer", "0");
    let item = add_item(&store, invoice.invoice_id, "Consulting", "1", "100");

    let updated = store
        .update_line_item(
            invoice.invoice_id,
            item.line_item_id,
            &UpdateLineItem {
                quantity: Some(money("3")),
                ..Default::default()
            },
        )
        .expect("Failed to update line item")
        .expect("Line item missing");

    assert_eq!(updated.amount, money("300"));
    let invoice = store
        .get_invoice(invoice.invoice_id)
        .expect("Failed to get invoice")
        .expect("Invoice missing");
    assert_eq!(invoice.total, money("300"));
}

#[test]
fn rejected_update_leaves_item_untouched() {
    let store = test_store();
    let invoice = create_draft(&store, "Atomic Update Customer", "0");
    let item = add_item(&store, invoice.invoice_id, "Widget", "2", "50");

    // The quantity is invalid, so the new description must not land either.
    let result = store.update_line_item(
        invoice.invoice_id,
        item.line_item_id,
        &UpdateLineItem {
            description: Some("Renamed".to_string()),
            quantity: Some(money("-1")),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));

    let invoice = store
        .get_invoice(invoice.invoice_id)
        .expect("Failed to get invoice")
        .expect("Invoice missing");
    let stored = &invoice.line_items[0];
    assert_eq!(stored.description, "Widget");
    assert_eq!(stored.quantity, money("2"));
    assert_eq!(stored.amount, money("100"));
    assert_eq!(invoice.total, money("100"));
}

#[test]
fn remove_line_item_recomputes_totals() {
    let store = test_store();
    let invoice = create_draft(&store, "Remove Customer", "0");
    let keep = add_item(&store, invoice.invoice_id, "Keep", "1", "100");
    let extra = add_item(&store, invoice.invoice_id, "Drop", "1", "900");

    let removed = store
        .remove_line_item(invoice.invoice_id, extra.line_item_id)
        .expect("Failed to remove line item");
    assert!(removed);

    let invoice = store
        .get_invoice(invoice.invoice_id)
        .expect("Failed to get invoice")
        .expect("Invoice missing");
    assert_eq!(invoice.line_items.len(), 1);
    assert_eq!(invoice.line_items[0].line_item_id, keep.line_item_id);
    assert_eq!(invoice.total, money("100"));
}

#[test]
fn items_are_ordered_by_sort_order() {
    let store = test_store();
    let invoice = create_draft(&store, "Order Customer", "0");

    store
        .add_line_item(
            invoice.invoice_id,
            &CreateLineItem {
                description: "Second".to_string(),
                quantity: money("1"),
                unit_price: money("10"),
                sort_order: 2,
            },
        )
        .expect("Failed to add line item");
    store
        .add_line_item(
            invoice.invoice_id,
            &CreateLineItem {
                description: "First".to_string(),
                quantity: money("1"),
                unit_price: money("10"),
                sort_order: 1,
            },
        )
        .expect("Failed to add line item");

    let invoice = store
        .get_invoice(invoice.invoice_id)
        .expect("Failed to get invoice")
        .expect("Invoice missing");
    assert_eq!(invoice.line_items[0].description, "First");
    assert_eq!(invoice.line_items[1].description, "Second");
}

#[test]
fn updating_missing_item_returns_none() {
    let store = test_store();
    let invoice = create_draft(&store, "Missing Item Customer", "0");

    let result = store
        .update_line_item(
            invoice.invoice_id,
            Uuid::new_v4(),
            &UpdateLineItem::default(),
        )
        .expect("Update should not error");
    assert!(result.is_none());
}
