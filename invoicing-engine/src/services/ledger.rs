//! Payment ledger: applies individual payment records against the
//! outstanding balance and recomputes the derived payment state.

use anyhow::anyhow;
use chrono::Utc;
use engine_core::error::EngineError;
use engine_core::money::within_tolerance;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreatePayment, DeliveryState, Invoice, Payment, PaymentState};

/// Apply a single payment to an invoice.
///
/// The caller must hold exclusive access to the invoice for the duration of
/// the call; the check against `balance_due` and the append are one unit.
/// This is the only mutation path for `balance_due` after drafting.
pub fn apply_payment(
    invoice: &mut Invoice,
    next_number: impl FnOnce() -> String,
    input: &CreatePayment,
) -> Result<Payment, EngineError> {
    input.validate()?;

    match invoice.delivery_state {
        DeliveryState::Draft => {
            return Err(EngineError::InvoiceLocked(anyhow!(
                "payments cannot be recorded against a draft invoice"
            )))
        }
        DeliveryState::Cancelled => {
            return Err(EngineError::InvoiceLocked(anyhow!(
                "payments cannot be recorded against a cancelled invoice"
            )))
        }
        DeliveryState::Sent | DeliveryState::Viewed => {}
    }
    if invoice.payment_state == PaymentState::Paid {
        return Err(EngineError::InvoiceLocked(anyhow!(
            "invoice is already fully paid"
        )));
    }

    if input.amount <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount {
            amount: input.amount,
        });
    }
    if input.amount > invoice.balance_due {
        return Err(EngineError::ExceedsBalance {
            amount: input.amount,
            balance_due: invoice.balance_due,
        });
    }

    let payment = Payment {
        payment_id: Uuid::new_v4(),
        payment_number: next_number(),
        invoice_id: invoice.invoice_id,
        amount: input.amount,
        currency: invoice.currency.clone(),
        method: input.method.clone(),
        reference: input.reference.clone(),
        payment_date: input.payment_date,
        notes: input.notes.clone(),
        created_utc: Utc::now(),
    };
    invoice.payments.push(payment.clone());
    recompute_payment_state(invoice);

    Ok(payment)
}

/// Recompute `amount_paid`, `balance_due` and the payment state from the
/// recorded payments. A residual within the shared tolerance counts as paid.
pub fn recompute_payment_state(invoice: &mut Invoice) {
    invoice.amount_paid = invoice.payments.iter().map(|p| p.amount).sum();
    invoice.balance_due = invoice.total - invoice.amount_paid;

    invoice.payment_state = if invoice.amount_paid <= Decimal::ZERO {
        PaymentState::Unpaid
    } else if within_tolerance(invoice.balance_due, Decimal::ZERO) {
        PaymentState::Paid
    } else {
        PaymentState::PartiallyPaid
    };
}
