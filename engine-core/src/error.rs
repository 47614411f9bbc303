use rust_decimal::Decimal;
use thiserror::Error;

/// Error taxonomy for the financial engine.
///
/// Every component except the totals calculator fails fast with one of these
/// variants; financial values are never silently clamped or coerced.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(anyhow::Error),

    #[error("Schedule underallocated: milestones fall {remaining} short of the invoice total")]
    ScheduleUnderallocated { remaining: Decimal },

    #[error("Schedule overallocated: milestones exceed the invoice total by {excess}")]
    ScheduleOverallocated { excess: Decimal },

    #[error("Payment amount {amount} exceeds balance due {balance_due}")]
    ExceedsBalance {
        amount: Decimal,
        balance_due: Decimal,
    },

    #[error("Payment amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Invoice is locked: {0}")]
    InvoiceLocked(anyhow::Error),

    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl EngineError {
    /// Stable label for metrics and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::ValidationError(_) | EngineError::InvalidInput(_) => "validation_error",
            EngineError::ScheduleUnderallocated { .. } => "schedule_underallocated",
            EngineError::ScheduleOverallocated { .. } => "schedule_overallocated",
            EngineError::ExceedsBalance { .. } => "exceeds_balance",
            EngineError::InvalidAmount { .. } => "invalid_amount",
            EngineError::InvoiceLocked(_) => "invoice_locked",
            EngineError::IllegalTransition { .. } => "illegal_transition",
            EngineError::NotFound(_) => "not_found",
            EngineError::ConfigError(_) => "config_error",
            EngineError::InternalError(_) => "internal_error",
        }
    }
}
