//! Milestone reconciler: keeps a payment-schedule decomposition consistent
//! with the computed invoice total.

use chrono::{NaiveDate, Utc};
use engine_core::error::EngineError;
use engine_core::money::{round_money, AMOUNT_TOLERANCE};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Milestone, MilestoneStatus};

const TWO: Decimal = Decimal::TWO;

/// Seed the default two-milestone schedule for a freshly enabled schedule.
///
/// A deposit and a final payment, half the total each, both due today. This
/// is a starting point for the user to edit; it is never re-applied after
/// milestones exist. The second amount is the exact remainder so the pair
/// always sums to `total`.
pub fn seed_default(total: Decimal, today: NaiveDate) -> Vec<Milestone> {
    let deposit = round_money(total / TWO);
    let half = Decimal::new(50, 0);
    let now = Utc::now();
    vec![
        Milestone {
            milestone_id: Uuid::new_v4(),
            name: "Initial Deposit".to_string(),
            amount: deposit,
            percent: Some(half),
            due_date: today,
            status: MilestoneStatus::Pending,
            created_utc: now,
        },
        Milestone {
            milestone_id: Uuid::new_v4(),
            name: "Final Payment".to_string(),
            amount: total - deposit,
            percent: Some(half),
            due_date: today,
            status: MilestoneStatus::Pending,
            created_utc: now,
        },
    ]
}

/// Portion of the total not yet covered by milestones. Negative when the
/// schedule overshoots.
pub fn remaining(total: Decimal, milestones: &[Milestone]) -> Decimal {
    let allocated: Decimal = milestones.iter().map(|m| m.amount).sum();
    total - allocated
}

/// Check that milestone amounts sum to the invoice total within tolerance.
///
/// The reconciler only reports imbalance; it never rebalances user-entered
/// amounts. Enforced at submit time because the total can change after the
/// schedule is first entered.
pub fn validate_for_submit(total: Decimal, milestones: &[Milestone]) -> Result<(), EngineError> {
    let remaining = remaining(total, milestones);
    if remaining > AMOUNT_TOLERANCE {
        return Err(EngineError::ScheduleUnderallocated { remaining });
    }
    if remaining < -AMOUNT_TOLERANCE {
        return Err(EngineError::ScheduleOverallocated {
            excess: -remaining,
        });
    }
    Ok(())
}
