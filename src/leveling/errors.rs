//! # Leveling Errors

use thiserror::Error;

/// Result type for leveling operations
pub type LevelingResult<T> = Result<T, LevelingError>;

/// Leveling errors
///
/// The curve functions are total; only the gain precondition can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelingError {
    /// Gains must be strictly positive
    #[error("XP gain must be positive")]
    NonPositiveAmount,

    /// The new total does not fit in the XP counter
    #[error("XP total overflow: {current} + {amount}")]
    XpOverflow { current: u64, amount: u64 },
}
