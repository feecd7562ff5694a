//! # XP Gain
//!
//! Pure apply-delta. Persisting the result and notifying the user belongs
//! to the caller; recomputing from the same inputs gives the same gain.

use serde::{Deserialize, Serialize};

use super::curve::level_for_xp;
use super::errors::{LevelingError, LevelingResult};

/// Outcome of applying an XP gain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpGain {
    /// Total before the gain
    pub previous_xp: u64,
    /// XP added
    pub amount: u64,
    /// Why the XP was awarded
    pub reason: String,
    /// Total after the gain
    pub new_xp: u64,
    /// Level before the gain
    pub previous_level: u32,
    /// Level after the gain
    pub new_level: u32,
    /// True if the gain crossed at least one level boundary
    pub leveled_up: bool,
}

/// Apply `amount` XP to `current_xp`
pub fn apply_xp_gain(current_xp: u64, amount: u64, reason: &str) -> LevelingResult<XpGain> {
    if amount == 0 {
        return Err(LevelingError::NonPositiveAmount);
    }

    let new_xp = current_xp
        .checked_add(amount)
        .ok_or(LevelingError::XpOverflow {
            current: current_xp,
            amount,
        })?;

    let previous_level = level_for_xp(current_xp);
    let new_level = level_for_xp(new_xp);

    Ok(XpGain {
        previous_xp: current_xp,
        amount,
        reason: reason.to_string(),
        new_xp,
        previous_level,
        new_level,
        leveled_up: new_level > previous_level,
    })
}
