//! Leveling Invariant Tests
//!
//! - Level is at least 1 and never decreases as XP grows
//! - Level boundaries sit exactly on the squares of 10 (x100 XP)
//! - Progress stays within [0, 100]
//! - apply-delta is pure: identical inputs give identical outputs

use finquest::leveling::{
    apply_xp_gain, level_for_xp, progress_within_level, threshold_for_level, LevelSnapshot,
    LevelingError,
};

// =============================================================================
// Level curve
// =============================================================================

#[test]
fn test_level_is_at_least_one_and_monotonic() {
    let mut previous = level_for_xp(0);
    assert_eq!(previous, 1);

    for xp in (0..50_000u64).step_by(7) {
        let level = level_for_xp(xp);
        assert!(level >= 1);
        assert!(level >= previous, "level dropped at xp={}", xp);
        previous = level;
    }
}

#[test]
fn test_level_boundaries() {
    assert_eq!(level_for_xp(0), 1);
    assert_eq!(level_for_xp(99), 1);
    assert_eq!(level_for_xp(100), 2);
    assert_eq!(level_for_xp(399), 2);
    assert_eq!(level_for_xp(400), 3);
    assert_eq!(level_for_xp(899), 3);
    assert_eq!(level_for_xp(900), 4);
}

#[test]
fn test_level_for_huge_totals() {
    assert!(level_for_xp(u64::MAX) > level_for_xp(u64::MAX / 2));
    assert_eq!(level_for_xp(1_000_000), 101);
}

#[test]
fn test_thresholds() {
    assert_eq!(threshold_for_level(0), 0);
    assert_eq!(threshold_for_level(1), 100);
    assert_eq!(threshold_for_level(2), 400);
    assert_eq!(threshold_for_level(5), 2500);

    for level in 1..200u32 {
        assert!(threshold_for_level(level + 1) > threshold_for_level(level));
    }
}

#[test]
fn test_progress_bounds() {
    for xp in (0..100_000u64).step_by(13) {
        let progress = progress_within_level(xp);
        assert!(
            (0.0..=100.0).contains(&progress),
            "progress {} out of bounds at xp={}",
            progress,
            xp
        );
    }
    assert_eq!(progress_within_level(0), 0.0);
    assert_eq!(progress_within_level(100), 0.0);
    assert_eq!(progress_within_level(250), 50.0);
}

#[test]
fn test_snapshot_matches_functions() {
    let snapshot = LevelSnapshot::from_xp(250);
    assert_eq!(snapshot.level, 2);
    assert_eq!(snapshot.xp_for_next_level, 400);
    assert_eq!(snapshot.xp_to_next_level(), 150);
    assert_eq!(snapshot.progress, 50.0);
}

// =============================================================================
// Apply-delta
// =============================================================================

#[test]
fn test_gain_crosses_into_level_two() {
    let gain = apply_xp_gain(90, 10, "x").unwrap();
    assert!(gain.leveled_up);
    assert_eq!(gain.new_level, 2);
    assert_eq!(gain.new_xp, 100);
}

#[test]
fn test_gain_stays_in_level_one() {
    let gain = apply_xp_gain(50, 10, "x").unwrap();
    assert!(!gain.leveled_up);
    assert_eq!(gain.new_level, 1);
}

#[test]
fn test_gain_is_pure() {
    let first = apply_xp_gain(390, 25, "Completed a challenge").unwrap();
    let second = apply_xp_gain(390, 25, "Completed a challenge").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_gain_rejects_zero_and_overflow() {
    assert_eq!(
        apply_xp_gain(10, 0, "x"),
        Err(LevelingError::NonPositiveAmount)
    );
    assert!(matches!(
        apply_xp_gain(u64::MAX, 1, "x"),
        Err(LevelingError::XpOverflow { .. })
    ));
}
