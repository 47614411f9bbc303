//! In-memory invoice store.
//!
//! Owns every invoice aggregate and serializes mutations per invoice: a
//! `DashMap` entry guard is held across each check-then-mutate sequence, so
//! two racing payment submissions can never jointly overshoot the balance.
//! Invoices are independent units of concurrency; there is no cross-invoice
//! coordination.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use engine_core::config::EngineConfig;
use engine_core::error::EngineError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CreateInvoice, CreateLineItem, CreateMilestone, CreatePayment, DeliveryState, DiscountSpec,
    Invoice, LineItem, ListInvoicesFilter, Milestone, Payment, PaymentState, UpdateInvoice,
    UpdateLineItem, UpdateMilestone,
};
use crate::services::metrics::{
    ENGINE_OPS_TOTAL, ERRORS_TOTAL, INVOICES_TOTAL, INVOICE_AMOUNT_TOTAL, OP_DURATION,
    PAYMENTS_TOTAL, PAYMENT_AMOUNT_TOTAL,
};
use crate::services::{ledger, lifecycle, schedule, totals};

/// Invoice aggregate store.
pub struct InvoiceStore {
    invoices: DashMap<Uuid, Invoice>,
    invoice_seq: AtomicU64,
    payment_seq: AtomicU64,
    config: EngineConfig,
}

impl InvoiceStore {
    /// Create an empty store.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            invoices: DashMap::new(),
            invoice_seq: AtomicU64::new(0),
            payment_seq: AtomicU64::new(0),
            config,
        }
    }

    fn next_invoice_number(&self) -> String {
        let n = self.invoice_seq.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{:06}", self.config.invoice_number_prefix, n)
    }

    fn next_payment_number(&self) -> String {
        let n = self.payment_seq.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{:06}", self.config.payment_number_prefix, n)
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// Create a new draft invoice.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub fn create_invoice(&self, input: &CreateInvoice) -> Result<Invoice, EngineError> {
        let timer = OP_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        input.validate()?;
        if input.tax_rate < Decimal::ZERO || input.tax_rate > Decimal::ONE_HUNDRED {
            return Err(EngineError::InvalidInput(anyhow!(
                "tax rate {} is outside 0-100",
                input.tax_rate
            )));
        }

        let invoice_id = Uuid::new_v4();
        let invoice = Invoice {
            invoice_id,
            invoice_number: None,
            customer_id: input.customer_id,
            customer_name: input.customer_name.clone(),
            currency: input
                .currency
                .clone()
                .unwrap_or_else(|| self.config.default_currency.clone()),
            issue_date: None,
            due_date: input.due_date,
            tax_rate: input.tax_rate,
            discount: None,
            line_items: Vec::new(),
            has_payment_schedule: false,
            milestones: Vec::new(),
            subtotal: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            balance_due: Decimal::ZERO,
            payments: Vec::new(),
            delivery_state: DeliveryState::Draft,
            payment_state: PaymentState::Unpaid,
            notes: input.notes.clone(),
            created_utc: Utc::now(),
            sent_utc: None,
            viewed_utc: None,
            cancelled_utc: None,
        };
        self.invoices.insert(invoice_id, invoice.clone());

        timer.observe_duration();
        ENGINE_OPS_TOTAL
            .with_label_values(&["create_invoice", "ok"])
            .inc();
        INVOICES_TOTAL.with_label_values(&["draft"]).inc();
        info!(invoice_id = %invoice_id, "Invoice created");

        Ok(invoice)
    }

    /// Get an invoice by id.
    pub fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, EngineError> {
        Ok(self.invoices.get(&invoice_id).map(|inv| inv.value().clone()))
    }

    /// List invoices, filtered by flattened status and/or customer, with
    /// cursor pagination ordered by invoice id.
    #[instrument(skip(self, filter))]
    pub fn list_invoices(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, EngineError> {
        let timer = OP_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let today = Utc::now().date_naive();
        let limit = filter.page_size.clamp(1, 100) as usize;

        let mut invoices: Vec<Invoice> = self
            .invoices
            .iter()
            .filter(|entry| {
                let inv = entry.value();
                if let Some(customer_id) = filter.customer_id {
                    if inv.customer_id != customer_id {
                        return false;
                    }
                }
                if let Some(status) = filter.status {
                    if lifecycle::status(inv, today) != status {
                        return false;
                    }
                }
                true
            })
            .map(|entry| entry.value().clone())
            .collect();
        invoices.sort_by_key(|inv| inv.invoice_id);

        if let Some(cursor) = filter.page_token {
            invoices.retain(|inv| inv.invoice_id > cursor);
        }
        invoices.truncate(limit);

        timer.observe_duration();
        Ok(invoices)
    }

    /// Update invoice header fields (draft only).
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id))]
    pub fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: &UpdateInvoice,
    ) -> Result<Option<Invoice>, EngineError> {
        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let invoice = entry.value_mut();
        lifecycle::assert_editable(invoice)?;

        if let Some(name) = &input.customer_name {
            if name.trim().is_empty() {
                return Err(EngineError::InvalidInput(anyhow!(
                    "customer name cannot be empty"
                )));
            }
            invoice.customer_name = name.clone();
        }
        if let Some(due_date) = input.due_date {
            invoice.due_date = Some(due_date);
        }
        if let Some(notes) = &input.notes {
            invoice.notes = Some(notes.clone());
        }

        Ok(Some(invoice.clone()))
    }

    /// Delete a draft invoice. Sent invoices are cancelled, never deleted.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, EngineError> {
        let removed = self
            .invoices
            .remove_if(&invoice_id, |_, inv| inv.is_editable());
        if removed.is_some() {
            info!(invoice_id = %invoice_id, "Draft invoice deleted");
            return Ok(true);
        }
        // Distinguish "missing" from "not a draft" for the caller.
        if self.invoices.contains_key(&invoice_id) {
            return Err(EngineError::InvoiceLocked(anyhow!(
                "only draft invoices can be deleted"
            )));
        }
        Ok(false)
    }

    /// Set the flat tax rate (draft only). Recomputes totals synchronously.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub fn set_tax_rate(
        &self,
        invoice_id: Uuid,
        tax_rate: Decimal,
    ) -> Result<Option<Invoice>, EngineError> {
        if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE_HUNDRED {
            return Err(EngineError::InvalidInput(anyhow!(
                "tax rate {} is outside 0-100",
                tax_rate
            )));
        }
        self.with_draft(invoice_id, |invoice| {
            invoice.tax_rate = tax_rate;
            totals::recalculate(invoice);
            Ok(())
        })
    }

    /// Set the invoice discount (draft only). Recomputes totals synchronously.
    #[instrument(skip(self, discount), fields(invoice_id = %invoice_id))]
    pub fn set_discount(
        &self,
        invoice_id: Uuid,
        discount: DiscountSpec,
    ) -> Result<Option<Invoice>, EngineError> {
        if discount.value < Decimal::ZERO {
            return Err(EngineError::InvalidInput(anyhow!(
                "discount value {} cannot be negative",
                discount.value
            )));
        }
        self.with_draft(invoice_id, |invoice| {
            invoice.discount = Some(discount);
            totals::recalculate(invoice);
            Ok(())
        })
    }

    /// Remove the invoice discount (draft only).
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub fn clear_discount(&self, invoice_id: Uuid) -> Result<Option<Invoice>, EngineError> {
        self.with_draft(invoice_id, |invoice| {
            invoice.discount = None;
            totals::recalculate(invoice);
            Ok(())
        })
    }

    /// Live totals preview for editor input. Pure and infallible; half-typed
    /// rows are treated as zero.
    pub fn preview_totals(
        &self,
        items: &[totals::PreviewItem],
        tax_rate: Option<Decimal>,
        discount: Option<&DiscountSpec>,
    ) -> totals::TotalsBreakdown {
        totals::preview(items, tax_rate, discount)
    }

    // -------------------------------------------------------------------------
    // Line Item Operations
    // -------------------------------------------------------------------------

    /// Add a line item to a draft invoice. Recomputes totals synchronously.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id))]
    pub fn add_line_item(
        &self,
        invoice_id: Uuid,
        input: &CreateLineItem,
    ) -> Result<LineItem, EngineError> {
        let timer = OP_DURATION
            .with_label_values(&["add_line_item"])
            .start_timer();

        input.validate()?;
        validate_item_numbers(input.quantity, input.unit_price)?;

        let mut entry = self
            .invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| EngineError::NotFound(anyhow!("invoice {} not found", invoice_id)))?;
        let invoice = entry.value_mut();
        lifecycle::assert_editable(invoice)?;

        let line_item = LineItem {
            line_item_id: Uuid::new_v4(),
            description: input.description.clone(),
            quantity: input.quantity,
            unit_price: input.unit_price,
            amount: totals::line_amount(input.quantity, input.unit_price),
            sort_order: input.sort_order,
            created_utc: Utc::now(),
        };
        invoice.line_items.push(line_item.clone());
        invoice
            .line_items
            .sort_by_key(|item| (item.sort_order, item.created_utc));
        totals::recalculate(invoice);

        timer.observe_duration();
        info!(line_item_id = %line_item.line_item_id, "Line item added");

        Ok(line_item)
    }

    /// Update a line item on a draft invoice.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id, line_item_id = %line_item_id))]
    pub fn update_line_item(
        &self,
        invoice_id: Uuid,
        line_item_id: Uuid,
        input: &UpdateLineItem,
    ) -> Result<Option<LineItem>, EngineError> {
        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let invoice = entry.value_mut();
        lifecycle::assert_editable(invoice)?;

        let item = match invoice
            .line_items
            .iter_mut()
            .find(|item| item.line_item_id == line_item_id)
        {
            Some(item) => item,
            None => return Ok(None),
        };

        // All checks before any write; a rejected update must not leave a
        // half-applied item behind.
        if let Some(description) = &input.description {
            if description.trim().is_empty() {
                return Err(EngineError::InvalidInput(anyhow!(
                    "line item description cannot be empty"
                )));
            }
        }
        let quantity = input.quantity.unwrap_or(item.quantity);
        let unit_price = input.unit_price.unwrap_or(item.unit_price);
        validate_item_numbers(quantity, unit_price)?;

        if let Some(description) = &input.description {
            item.description = description.clone();
        }
        item.quantity = quantity;
        item.unit_price = unit_price;
        item.amount = totals::line_amount(quantity, unit_price);
        if let Some(sort_order) = input.sort_order {
            item.sort_order = sort_order;
        }

        let updated = item.clone();
        invoice
            .line_items
            .sort_by_key(|item| (item.sort_order, item.created_utc));
        totals::recalculate(invoice);

        Ok(Some(updated))
    }

    /// Remove a line item from a draft invoice.
    #[instrument(skip(self), fields(invoice_id = %invoice_id, line_item_id = %line_item_id))]
    pub fn remove_line_item(
        &self,
        invoice_id: Uuid,
        line_item_id: Uuid,
    ) -> Result<bool, EngineError> {
        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(false),
        };
        let invoice = entry.value_mut();
        lifecycle::assert_editable(invoice)?;

        let before = invoice.line_items.len();
        invoice
            .line_items
            .retain(|item| item.line_item_id != line_item_id);
        let removed = invoice.line_items.len() < before;
        if removed {
            totals::recalculate(invoice);
        }
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Payment Schedule Operations
    // -------------------------------------------------------------------------

    /// Enable the payment schedule on a draft invoice, seeding the default
    /// deposit/final pair when no milestones exist yet. Re-enabling with
    /// existing milestones does not reseed.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub fn enable_payment_schedule(
        &self,
        invoice_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<Invoice>, EngineError> {
        self.with_draft(invoice_id, |invoice| {
            invoice.has_payment_schedule = true;
            if invoice.milestones.is_empty() {
                invoice.milestones = schedule::seed_default(invoice.total, today);
                info!("Payment schedule seeded with default milestones");
            }
            Ok(())
        })
    }

    /// Disable the payment schedule. Milestones are kept but excluded from
    /// submit validation.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub fn disable_payment_schedule(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, EngineError> {
        self.with_draft(invoice_id, |invoice| {
            invoice.has_payment_schedule = false;
            Ok(())
        })
    }

    /// Add a milestone to a draft invoice.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id))]
    pub fn add_milestone(
        &self,
        invoice_id: Uuid,
        input: &CreateMilestone,
    ) -> Result<Milestone, EngineError> {
        input.validate()?;
        if input.amount < Decimal::ZERO {
            return Err(EngineError::InvalidInput(anyhow!(
                "milestone amount {} cannot be negative",
                input.amount
            )));
        }

        let mut entry = self
            .invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| EngineError::NotFound(anyhow!("invoice {} not found", invoice_id)))?;
        let invoice = entry.value_mut();
        lifecycle::assert_editable(invoice)?;

        let milestone = Milestone {
            milestone_id: Uuid::new_v4(),
            name: input.name.clone(),
            amount: input.amount,
            percent: input.percent,
            due_date: input.due_date,
            status: crate::models::MilestoneStatus::Pending,
            created_utc: Utc::now(),
        };
        invoice.milestones.push(milestone.clone());

        info!(milestone_id = %milestone.milestone_id, "Milestone added");
        Ok(milestone)
    }

    /// Update a milestone on a draft invoice. The reconciler never
    /// rebalances the other milestones to compensate.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id, milestone_id = %milestone_id))]
    pub fn update_milestone(
        &self,
        invoice_id: Uuid,
        milestone_id: Uuid,
        input: &UpdateMilestone,
    ) -> Result<Option<Milestone>, EngineError> {
        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let invoice = entry.value_mut();
        lifecycle::assert_editable(invoice)?;

        let milestone = match invoice
            .milestones
            .iter_mut()
            .find(|m| m.milestone_id == milestone_id)
        {
            Some(m) => m,
            None => return Ok(None),
        };

        // All checks before any write; a rejected update must not leave a
        // half-applied milestone behind.
        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(EngineError::InvalidInput(anyhow!(
                    "milestone name cannot be empty"
                )));
            }
        }
        if let Some(amount) = input.amount {
            if amount < Decimal::ZERO {
                return Err(EngineError::InvalidInput(anyhow!(
                    "milestone amount {} cannot be negative",
                    amount
                )));
            }
        }

        if let Some(name) = &input.name {
            milestone.name = name.clone();
        }
        if let Some(amount) = input.amount {
            milestone.amount = amount;
        }
        if let Some(percent) = input.percent {
            milestone.percent = Some(percent);
        }
        if let Some(due_date) = input.due_date {
            milestone.due_date = due_date;
        }

        Ok(Some(milestone.clone()))
    }

    /// Remove a milestone from a draft invoice.
    #[instrument(skip(self), fields(invoice_id = %invoice_id, milestone_id = %milestone_id))]
    pub fn remove_milestone(
        &self,
        invoice_id: Uuid,
        milestone_id: Uuid,
    ) -> Result<bool, EngineError> {
        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(false),
        };
        let invoice = entry.value_mut();
        lifecycle::assert_editable(invoice)?;

        let before = invoice.milestones.len();
        invoice
            .milestones
            .retain(|m| m.milestone_id != milestone_id);
        Ok(invoice.milestones.len() < before)
    }

    /// Schedule balance still unallocated for an invoice.
    pub fn schedule_remaining(&self, invoice_id: Uuid) -> Result<Option<Decimal>, EngineError> {
        Ok(self
            .invoices
            .get(&invoice_id)
            .map(|inv| schedule::remaining(inv.value().total, &inv.value().milestones)))
    }

    // -------------------------------------------------------------------------
    // Lifecycle Operations
    // -------------------------------------------------------------------------

    /// Send a draft invoice: runs submit validation, assigns the sequential
    /// invoice number and locks the draft fields.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub fn send_invoice(
        &self,
        invoice_id: Uuid,
        issue_date: NaiveDate,
    ) -> Result<Option<Invoice>, EngineError> {
        let timer = OP_DURATION
            .with_label_values(&["send_invoice"])
            .start_timer();

        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let invoice = entry.value_mut();

        lifecycle::send(invoice, issue_date, || self.next_invoice_number()).map_err(|e| {
            ENGINE_OPS_TOTAL
                .with_label_values(&["send_invoice", "error"])
                .inc();
            ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
            e
        })?;

        timer.observe_duration();
        ENGINE_OPS_TOTAL
            .with_label_values(&["send_invoice", "ok"])
            .inc();
        INVOICES_TOTAL.with_label_values(&["sent"]).inc();
        if let Some(amount) = invoice.total.to_f64() {
            INVOICE_AMOUNT_TOTAL
                .with_label_values(&[&invoice.currency])
                .inc_by(amount);
        }
        info!(
            invoice_id = %invoice_id,
            invoice_number = %invoice.invoice_number.as_deref().unwrap_or(""),
            total = %invoice.total,
            "Invoice sent"
        );

        Ok(Some(invoice.clone()))
    }

    /// Record the external viewing event on a sent invoice.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub fn mark_viewed(&self, invoice_id: Uuid) -> Result<Option<Invoice>, EngineError> {
        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let invoice = entry.value_mut();
        lifecycle::mark_viewed(invoice)?;
        Ok(Some(invoice.clone()))
    }

    /// Cancel an invoice. One-way; blocks further payments.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub fn cancel_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, EngineError> {
        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let invoice = entry.value_mut();
        lifecycle::cancel(invoice).map_err(|e| {
            ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
            e
        })?;

        INVOICES_TOTAL.with_label_values(&["cancelled"]).inc();
        info!(invoice_id = %invoice_id, "Invoice cancelled");
        Ok(Some(invoice.clone()))
    }

    /// Flattened status of an invoice as of `today` (overdue overlay applied).
    pub fn invoice_status(
        &self,
        invoice_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<crate::models::InvoiceStatus>, EngineError> {
        Ok(self
            .invoices
            .get(&invoice_id)
            .map(|inv| lifecycle::status(inv.value(), today)))
    }

    // -------------------------------------------------------------------------
    // Payment Operations
    // -------------------------------------------------------------------------

    /// Record a payment against an invoice.
    ///
    /// The entry guard is held across the balance check and the append, so
    /// concurrent submissions against the same invoice serialize here.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id))]
    pub fn record_payment(
        &self,
        invoice_id: Uuid,
        input: &CreatePayment,
    ) -> Result<Payment, EngineError> {
        let timer = OP_DURATION
            .with_label_values(&["record_payment"])
            .start_timer();

        let mut entry = self
            .invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| EngineError::NotFound(anyhow!("invoice {} not found", invoice_id)))?;
        let invoice = entry.value_mut();

        let payment = ledger::apply_payment(invoice, || self.next_payment_number(), input)
            .map_err(|e| {
                ENGINE_OPS_TOTAL
                    .with_label_values(&["record_payment", "error"])
                    .inc();
                ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
                e
            })?;

        timer.observe_duration();
        ENGINE_OPS_TOTAL
            .with_label_values(&["record_payment", "ok"])
            .inc();
        PAYMENTS_TOTAL.with_label_values(&[&payment.method]).inc();
        if let Some(amount) = payment.amount.to_f64() {
            PAYMENT_AMOUNT_TOTAL
                .with_label_values(&[&payment.currency])
                .inc_by(amount);
        }
        if invoice.payment_state == PaymentState::Paid {
            INVOICES_TOTAL.with_label_values(&["paid"]).inc();
        }
        info!(
            invoice_id = %invoice_id,
            payment_id = %payment.payment_id,
            payment_number = %payment.payment_number,
            amount = %payment.amount,
            balance_due = %invoice.balance_due,
            "Payment recorded"
        );

        Ok(payment)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Run a mutation against a draft invoice under its entry guard.
    fn with_draft<F>(&self, invoice_id: Uuid, f: F) -> Result<Option<Invoice>, EngineError>
    where
        F: FnOnce(&mut Invoice) -> Result<(), EngineError>,
    {
        let mut entry = match self.invoices.get_mut(&invoice_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let invoice = entry.value_mut();
        lifecycle::assert_editable(invoice)?;
        f(invoice)?;
        Ok(Some(invoice.clone()))
    }
}

fn validate_item_numbers(quantity: Decimal, unit_price: Decimal) -> Result<(), EngineError> {
    if quantity <= Decimal::ZERO {
        return Err(EngineError::InvalidInput(anyhow!(
            "quantity {} must be positive",
            quantity
        )));
    }
    if unit_price < Decimal::ZERO {
        return Err(EngineError::InvalidInput(anyhow!(
            "unit price {} cannot be negative",
            unit_price
        )));
    }
    Ok(())
}
