//! Line item model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Line item on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub line_item_id: Uuid,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Derived: `quantity * unit_price`.
    pub amount: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a line item.
#[derive(Debug, Clone, Validate)]
pub struct CreateLineItem {
    #[validate(length(min = 1))]
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub sort_order: i32,
}

/// Input for updating a line item.
#[derive(Debug, Clone, Default)]
pub struct UpdateLineItem {
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub sort_order: Option<i32>,
}
