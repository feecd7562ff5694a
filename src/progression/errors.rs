//! # Progression Errors

use thiserror::Error;

use crate::leveling::LevelingError;
use crate::profile::ProfileError;

/// Result type for XP tracking
pub type ProgressionResult<T> = Result<T, ProgressionError>;

/// XP tracking errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    /// The gain itself was invalid
    #[error(transparent)]
    Leveling(#[from] LevelingError),

    /// The profile could not be loaded
    #[error("Failed to load profile: {0}")]
    Load(ProfileError),

    /// The computed gain could not be persisted; it is kept for retry
    #[error("Failed to persist {amount} XP: {source}")]
    Persistence {
        amount: u64,
        #[source]
        source: ProfileError,
    },

    /// A failed gain must be retried before a new one is accepted
    #[error("A gain of {amount} XP is pending retry")]
    GainPending { amount: u64 },

    /// `retry_pending` called with nothing to retry
    #[error("No pending XP gain")]
    NoPendingGain,
}

impl ProgressionError {
    /// True if the same operation may succeed when retried
    pub fn is_retryable(&self) -> bool {
        match self {
            ProgressionError::Persistence { source, .. } => source.is_retryable(),
            ProgressionError::Load(source) => source.is_retryable(),
            _ => false,
        }
    }
}
