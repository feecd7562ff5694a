//! # Real-Time Errors
//!
//! Error types for the realtime module.

use thiserror::Error;

use super::event::TableName;

/// Result type for realtime operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Realtime errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    // ==================
    // Request Errors
    // ==================
    /// A registration must observe at least one event kind
    #[error("Event kind set must not be empty")]
    EmptyEventSet,

    /// Table name outside the closed set
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Event kind outside {INSERT, UPDATE, DELETE}
    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),

    // ==================
    // Feed Errors
    // ==================
    /// The change feed could not open a channel
    #[error("Failed to open channel for {table}: {reason}")]
    OpenFailed { table: TableName, reason: String },

    /// The change feed is not reachable
    #[error("Change feed unavailable: {0}")]
    FeedUnavailable(String),
}

impl RealtimeError {
    /// True if a later attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RealtimeError::OpenFailed { .. } | RealtimeError::FeedUnavailable(_)
        )
    }
}
