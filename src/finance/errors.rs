//! # Finance Errors

use thiserror::Error;

/// Result type for finance records
pub type FinanceResult<T> = Result<T, FinanceError>;

/// Finance record validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FinanceError {
    /// Amounts must be finite and positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Description too long: {len} characters (max {max})")]
    DescriptionTooLong { len: usize, max: usize },

    #[error("Savings goal name must not be empty")]
    EmptyGoalName,

    #[error("Unknown time range: {0}")]
    UnknownTimeRange(String),
}
