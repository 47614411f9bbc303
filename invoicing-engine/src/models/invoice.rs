//! Invoice aggregate model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{LineItem, Milestone, Payment};

/// Delivery axis of the invoice state: how far the document has travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Draft,
    Sent,
    Viewed,
    Cancelled,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Draft => "draft",
            DeliveryState::Sent => "sent",
            DeliveryState::Viewed => "viewed",
            DeliveryState::Cancelled => "cancelled",
        }
    }
}

/// Payment axis of the invoice state: how much of the total is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Unpaid => "unpaid",
            PaymentState::PartiallyPaid => "partially_paid",
            PaymentState::Paid => "paid",
        }
    }
}

/// Flattened invoice status for external consumers.
///
/// Merges the delivery and payment axes into the single enum the rest of the
/// platform expects. Overdue is a read-time overlay, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Viewed,
    Unpaid,
    PartiallyPaid,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Viewed => "viewed",
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

/// Discount kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

/// Invoice-level discount.
///
/// A percentage discount is a fraction of the subtotal; a fixed discount is
/// an absolute amount and is not clamped by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountSpec {
    pub kind: DiscountKind,
    pub value: Decimal,
}

/// Invoice aggregate.
///
/// Line items, milestones and payments are owned by the invoice and move
/// through the store as a unit. Totals and balance are derived fields,
/// recomputed on every draft edit and on every payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub invoice_number: Option<String>,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub currency: String,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub tax_rate: Decimal,
    pub discount: Option<DiscountSpec>,
    pub line_items: Vec<LineItem>,
    pub has_payment_schedule: bool,
    pub milestones: Vec<Milestone>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub payments: Vec<Payment>,
    pub delivery_state: DeliveryState,
    pub payment_state: PaymentState,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub sent_utc: Option<DateTime<Utc>>,
    pub viewed_utc: Option<DateTime<Utc>>,
    pub cancelled_utc: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Items, tax, discount and milestones are mutable only while drafting.
    pub fn is_editable(&self) -> bool {
        self.delivery_state == DeliveryState::Draft
    }
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

/// Input for creating an invoice.
#[derive(Debug, Clone, Validate)]
pub struct CreateInvoice {
    pub customer_id: Uuid,
    #[validate(length(min = 1))]
    pub customer_name: String,
    pub currency: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub tax_rate: Decimal,
    pub notes: Option<String>,
}

/// Input for updating invoice header fields (draft only).
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub customer_name: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}
