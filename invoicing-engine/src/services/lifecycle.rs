//! Invoice lifecycle: the state machine governing status transitions and
//! edit permissions.

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use engine_core::error::EngineError;
use rust_decimal::Decimal;

use crate::models::{DeliveryState, Invoice, InvoiceStatus, PaymentState};
use crate::services::schedule;

const MAX_TAX_RATE: Decimal = Decimal::ONE_HUNDRED;

/// Flatten the two state axes into the single status external consumers
/// expect, applying the overdue overlay at read time.
///
/// Overdue is derived, never persisted: it overlays the unpaid and partially
/// paid states of a sent invoice whose due date has passed, so paying off an
/// overdue invoice still reaches Paid.
pub fn status(invoice: &Invoice, today: NaiveDate) -> InvoiceStatus {
    match invoice.delivery_state {
        DeliveryState::Cancelled => InvoiceStatus::Cancelled,
        DeliveryState::Draft => InvoiceStatus::Draft,
        DeliveryState::Sent | DeliveryState::Viewed => match invoice.payment_state {
            PaymentState::Paid => InvoiceStatus::Paid,
            PaymentState::PartiallyPaid => {
                if is_overdue(invoice, today) {
                    InvoiceStatus::Overdue
                } else {
                    InvoiceStatus::PartiallyPaid
                }
            }
            PaymentState::Unpaid => {
                if is_overdue(invoice, today) {
                    InvoiceStatus::Overdue
                } else if invoice.delivery_state == DeliveryState::Viewed {
                    InvoiceStatus::Viewed
                } else {
                    InvoiceStatus::Sent
                }
            }
        },
    }
}

fn is_overdue(invoice: &Invoice, today: NaiveDate) -> bool {
    matches!(invoice.due_date, Some(due) if due < today) && invoice.balance_due > Decimal::ZERO
}

/// Fail unless the invoice is still a draft.
pub fn assert_editable(invoice: &Invoice) -> Result<(), EngineError> {
    if invoice.is_editable() {
        Ok(())
    } else {
        Err(EngineError::InvoiceLocked(anyhow!(
            "invoice {} is {}; items, tax, discount and milestones are read-only",
            invoice.invoice_id,
            invoice.delivery_state.as_str()
        )))
    }
}

/// Send a draft invoice: the only legal transition out of Draft besides
/// cancellation. Runs the full submit validation, then locks items, tax,
/// discount and milestones permanently.
pub fn send(
    invoice: &mut Invoice,
    issue_date: NaiveDate,
    next_number: impl FnOnce() -> String,
) -> Result<(), EngineError> {
    if invoice.delivery_state != DeliveryState::Draft {
        return Err(EngineError::IllegalTransition {
            from: invoice.delivery_state.as_str(),
            to: DeliveryState::Sent.as_str(),
        });
    }

    validate_for_send(invoice)?;

    // Number assigned only once validation has passed, so failed sends do
    // not burn a sequence slot.
    invoice.delivery_state = DeliveryState::Sent;
    invoice.invoice_number = Some(next_number());
    invoice.issue_date = Some(issue_date);
    invoice.sent_utc = Some(Utc::now());
    invoice.amount_paid = Decimal::ZERO;
    invoice.balance_due = invoice.total;
    Ok(())
}

/// Record the external viewing event. Informational only; money is untouched.
pub fn mark_viewed(invoice: &mut Invoice) -> Result<(), EngineError> {
    if invoice.delivery_state != DeliveryState::Sent {
        return Err(EngineError::IllegalTransition {
            from: invoice.delivery_state.as_str(),
            to: DeliveryState::Viewed.as_str(),
        });
    }
    invoice.delivery_state = DeliveryState::Viewed;
    invoice.viewed_utc = Some(Utc::now());
    Ok(())
}

/// Cancel an invoice. One-way; blocks further payments. A fully paid invoice
/// cannot be cancelled.
pub fn cancel(invoice: &mut Invoice) -> Result<(), EngineError> {
    if invoice.delivery_state == DeliveryState::Cancelled {
        return Err(EngineError::IllegalTransition {
            from: DeliveryState::Cancelled.as_str(),
            to: DeliveryState::Cancelled.as_str(),
        });
    }
    if invoice.payment_state == PaymentState::Paid {
        return Err(EngineError::IllegalTransition {
            from: PaymentState::Paid.as_str(),
            to: DeliveryState::Cancelled.as_str(),
        });
    }
    invoice.delivery_state = DeliveryState::Cancelled;
    invoice.cancelled_utc = Some(Utc::now());
    Ok(())
}

/// Submit validation: the hard checks deferred while the draft was a live,
/// possibly incomplete preview.
pub fn validate_for_send(invoice: &Invoice) -> Result<(), EngineError> {
    if invoice.line_items.is_empty() {
        return Err(EngineError::InvalidInput(anyhow!(
            "cannot send an invoice without line items"
        )));
    }
    for item in &invoice.line_items {
        if item.description.trim().is_empty() {
            return Err(EngineError::InvalidInput(anyhow!(
                "line item {} has an empty description",
                item.line_item_id
            )));
        }
        if item.quantity <= Decimal::ZERO {
            return Err(EngineError::InvalidInput(anyhow!(
                "line item '{}' has non-positive quantity {}",
                item.description,
                item.quantity
            )));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(EngineError::InvalidInput(anyhow!(
                "line item '{}' has negative unit price {}",
                item.description,
                item.unit_price
            )));
        }
    }
    if invoice.tax_rate < Decimal::ZERO || invoice.tax_rate > MAX_TAX_RATE {
        return Err(EngineError::InvalidInput(anyhow!(
            "tax rate {} is outside 0-100",
            invoice.tax_rate
        )));
    }
    // Policy decision: a discount that drives the total negative is rejected
    // rather than clamped or allowed through.
    if invoice.total < Decimal::ZERO {
        return Err(EngineError::InvalidInput(anyhow!(
            "discount {} exceeds subtotal plus tax; total would be negative",
            invoice.discount_amount
        )));
    }
    if invoice.has_payment_schedule {
        schedule::validate_for_submit(invoice.total, &invoice.milestones)?;
    }
    Ok(())
}
