//! Payment record model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A recorded payment against an invoice. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: Uuid,
    pub payment_number: String,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub reference: Option<String>,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for recording a payment.
#[derive(Debug, Clone, Validate)]
pub struct CreatePayment {
    pub amount: Decimal,
    #[validate(length(min = 1))]
    pub method: String,
    pub reference: Option<String>,
    pub payment_date: NaiveDate,
    pub notes: Option<String>,
}
