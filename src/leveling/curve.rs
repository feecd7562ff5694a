//! # Level Curve
//!
//! `level(xp) = floor(1 + sqrt(xp / 100))` and
//! `threshold(level) = level^2 * 100`.
//!
//! Level 1 starts at 0 XP, level 2 at 100, level 3 at 400, level 4 at 900.
//! The square root is taken on integers so those boundaries are exact.

use serde::{Deserialize, Serialize};

/// XP scale factor of the curve
pub const XP_PER_LEVEL_UNIT: u64 = 100;

/// Level for an accumulated XP total. Always `>= 1`.
pub fn level_for_xp(xp: u64) -> u32 {
    // floor(sqrt(xp / 100)) == floor(isqrt(xp) / 10)
    let steps = isqrt(xp) / 10;
    // isqrt(u64::MAX) / 10 < u32::MAX
    1 + steps as u32
}

/// Cumulative XP needed to complete `level`, i.e. to reach `level + 1`.
///
/// `threshold_for_level(0) == 0`, which is the lower bound of level 1.
pub fn threshold_for_level(level: u32) -> u64 {
    let level = u64::from(level);
    level.saturating_mul(level).saturating_mul(XP_PER_LEVEL_UNIT)
}

/// Progress through the current level, in `[0, 100]`.
pub fn progress_within_level(xp: u64) -> f64 {
    let level = level_for_xp(xp);
    let floor = threshold_for_level(level - 1);
    let ceiling = threshold_for_level(level);

    // Strictly increasing thresholds keep the span positive; saturation at
    // the very top of the range is the only way to reach zero.
    let span = ceiling.saturating_sub(floor);
    if span == 0 {
        return 100.0;
    }

    let into_level = xp.saturating_sub(floor);
    let progress = into_level as f64 / span as f64 * 100.0;
    progress.clamp(0.0, 100.0)
}

/// Display values derived from one XP total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    /// Accumulated XP
    pub xp: u64,
    /// Current level
    pub level: u32,
    /// Cumulative XP at which the next level starts
    pub xp_for_next_level: u64,
    /// Progress through the current level, in `[0, 100]`
    pub progress: f64,
}

impl LevelSnapshot {
    /// Derive the snapshot for `xp`
    pub fn from_xp(xp: u64) -> Self {
        let level = level_for_xp(xp);
        Self {
            xp,
            level,
            xp_for_next_level: threshold_for_level(level),
            progress: progress_within_level(xp),
        }
    }

    /// XP still missing to reach the next level
    pub fn xp_to_next_level(&self) -> u64 {
        self.xp_for_next_level.saturating_sub(self.xp)
    }
}

impl Default for LevelSnapshot {
    fn default() -> Self {
        Self::from_xp(0)
    }
}

/// Integer square root (floor)
fn isqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root.checked_mul(root).map_or(true, |sq| sq > n) {
        root -= 1;
    }
    while (root + 1).checked_mul(root + 1).map_or(false, |sq| sq <= n) {
        root += 1;
    }
    root
}
