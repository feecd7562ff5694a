//! # Progression
//!
//! XP tracking for the signed-in user: persisting gains, notifying, and
//! re-syncing from profile change events.

mod errors;
mod tracker;

pub use errors::{ProgressionError, ProgressionResult};
pub use tracker::{PendingGain, XpTracker};
