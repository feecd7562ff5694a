//! # Profile Errors

use thiserror::Error;

use crate::auth::UserId;

/// Result type for profile persistence
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Profile persistence errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// No profile record for the user
    #[error("Profile not found: {0}")]
    NotFound(UserId),

    /// The store could not be reached or written
    #[error("Profile store unavailable: {0}")]
    Unavailable(String),

    /// The stored data could not be read back
    #[error("Corrupt profile store: {0}")]
    Corrupt(String),
}

impl ProfileError {
    /// True if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProfileError::Unavailable(_))
    }
}
