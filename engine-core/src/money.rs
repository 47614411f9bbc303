//! Money helpers shared across the engine.

use rust_decimal::{Decimal, RoundingStrategy};

/// Tolerance for "matches the invoice total" checks.
///
/// One unit of currency, chosen to absorb rounding noise between a total and
/// a decomposition of it (milestones, accumulated payments). Not a business
/// rule; the single definition keeps every call site consistent.
pub const AMOUNT_TOLERANCE: Decimal = Decimal::ONE;

/// Round a monetary value to two decimal places.
pub fn round_money(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// True when `a` and `b` differ by no more than [`AMOUNT_TOLERANCE`].
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= AMOUNT_TOLERANCE
}

/// Format a Decimal as a normalized string.
pub fn format_decimal(d: &Decimal) -> String {
    let s = d.to_string();
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
