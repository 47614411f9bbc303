//! Payment schedule milestone model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Milestone status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    Paid,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "pending",
            MilestoneStatus::Paid => "paid",
        }
    }
}

/// A planned partial payment within an invoice's payment schedule.
///
/// `percent` is informational only; the reconciler works on amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub milestone_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub percent: Option<Decimal>,
    pub due_date: NaiveDate,
    pub status: MilestoneStatus,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a milestone.
#[derive(Debug, Clone, Validate)]
pub struct CreateMilestone {
    #[validate(length(min = 1))]
    pub name: String,
    pub amount: Decimal,
    pub percent: Option<Decimal>,
    pub due_date: NaiveDate,
}

/// Input for updating a milestone.
#[derive(Debug, Clone, Default)]
pub struct UpdateMilestone {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub percent: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}
