//! Totals calculator: pure derivation of invoice totals from line items,
//! tax rate and discount.

use engine_core::money::round_money;
use rust_decimal::Decimal;

use crate::models::{DiscountKind, DiscountSpec, Invoice, LineItem};

/// Computed monetary breakdown of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalsBreakdown {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

/// A possibly incomplete line item as typed in the editor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewItem {
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Compute totals for a set of line items.
///
/// Pure and O(n) in item count; safe to call on every edit. The subtotal is
/// the exact sum of `quantity * unit_price`; tax and percentage discounts are
/// rounded to two decimal places. A fixed discount is taken at face value, so
/// the returned total can be negative; rejecting that is a submit-time
/// decision, not the calculator's.
pub fn compute(
    items: &[LineItem],
    tax_rate: Decimal,
    discount: Option<&DiscountSpec>,
) -> TotalsBreakdown {
    let subtotal: Decimal = items.iter().map(|i| i.quantity * i.unit_price).sum();
    breakdown(subtotal, tax_rate, discount)
}

/// Compute totals for live preview input, treating missing fields as zero.
/// Never fails: the editor may hold half-typed rows at any keystroke.
pub fn preview(
    items: &[PreviewItem],
    tax_rate: Option<Decimal>,
    discount: Option<&DiscountSpec>,
) -> TotalsBreakdown {
    let subtotal: Decimal = items
        .iter()
        .map(|i| i.quantity.unwrap_or(Decimal::ZERO) * i.unit_price.unwrap_or(Decimal::ZERO))
        .sum();
    breakdown(subtotal, tax_rate.unwrap_or(Decimal::ZERO), discount)
}

/// Derived amount of a single line item.
pub fn line_amount(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity * unit_price
}

/// Recompute and store the derived totals on an invoice.
pub fn recalculate(invoice: &mut Invoice) {
    let totals = compute(&invoice.line_items, invoice.tax_rate, invoice.discount.as_ref());
    invoice.subtotal = totals.subtotal;
    invoice.tax_amount = totals.tax_amount;
    invoice.discount_amount = totals.discount_amount;
    invoice.total = totals.total;
    invoice.balance_due = invoice.total - invoice.amount_paid;
}

fn breakdown(subtotal: Decimal, tax_rate: Decimal, discount: Option<&DiscountSpec>) -> TotalsBreakdown {
    let tax_amount = round_money(subtotal * tax_rate / HUNDRED);
    let discount_amount = discount
        .map(|d| discount_amount(subtotal, d))
        .unwrap_or(Decimal::ZERO);
    TotalsBreakdown {
        subtotal,
        tax_amount,
        discount_amount,
        total: subtotal + tax_amount - discount_amount,
    }
}

fn discount_amount(subtotal: Decimal, discount: &DiscountSpec) -> Decimal {
    match discount.kind {
        DiscountKind::Percentage => round_money(subtotal * discount.value / HUNDRED),
        DiscountKind::Fixed => discount.value,
    }
}
