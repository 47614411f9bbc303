//! Domain models for the invoicing engine.

mod invoice;
mod line_item;
mod milestone;
mod payment;

pub use invoice::{
    CreateInvoice, DeliveryState, DiscountKind, DiscountSpec, Invoice, InvoiceStatus,
    ListInvoicesFilter, PaymentState, UpdateInvoice,
};
pub use line_item::{CreateLineItem, LineItem, UpdateLineItem};
pub use milestone::{CreateMilestone, Milestone, MilestoneStatus, UpdateMilestone};
pub use payment::{CreatePayment, Payment};
