//! # Leveling Engine
//!
//! Pure functions over experience points:
//! - XP → level, next-level threshold and progress
//! - apply-delta producing the new total and whether a level was gained
//!
//! Nothing here performs I/O. See `progression` for the caller that
//! persists gains and raises notifications.

mod curve;
mod errors;
mod gain;
mod rewards;

pub use curve::{
    level_for_xp, progress_within_level, threshold_for_level, LevelSnapshot, XP_PER_LEVEL_UNIT,
};
pub use errors::{LevelingError, LevelingResult};
pub use gain::{apply_xp_gain, XpGain};
pub use rewards::{RewardTable, XpReward};
