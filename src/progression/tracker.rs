//! # XP Tracker
//!
//! Caller side of the leveling engine for one signed-in user.
//!
//! A gain is applied in this order:
//! 1. Compute the gain from the current snapshot
//! 2. Persist the new total
//! 3. Replace the snapshot and notify
//!
//! If step 2 fails the snapshot is left alone and the gain is kept as
//! pending. Retrying recomputes it from the same inputs.

use std::sync::Arc;

use super::errors::{ProgressionError, ProgressionResult};
use crate::auth::UserId;
use crate::leveling::{apply_xp_gain, LevelSnapshot, RewardTable, XpGain, XpReward};
use crate::notify::{Notification, Notifier};
use crate::observability::{log_event_with_fields, Event};
use crate::profile::ProfileStore;
use crate::realtime::{ChangeEvent, EventKind, TableName};

const DEFAULT_REASON: &str = "You earned experience points";

/// A gain that was computed but not persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingGain {
    pub gain: XpGain,
    /// Failed persistence attempts so far
    pub attempts: u32,
}

/// XP state of one user
pub struct XpTracker<S: ProfileStore> {
    user_id: UserId,
    store: S,
    notifier: Arc<dyn Notifier>,
    snapshot: LevelSnapshot,
    pending: Option<PendingGain>,
}

impl<S: ProfileStore> XpTracker<S> {
    /// Load the persisted XP for `user_id`
    pub fn load(user_id: UserId, store: S, notifier: Arc<dyn Notifier>) -> ProgressionResult<Self> {
        let xp = store
            .read_profile_xp(user_id)
            .map_err(ProgressionError::Load)?;

        Ok(Self {
            user_id,
            store,
            notifier,
            snapshot: LevelSnapshot::from_xp(xp),
            pending: None,
        })
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn snapshot(&self) -> &LevelSnapshot {
        &self.snapshot
    }

    pub fn pending(&self) -> Option<&PendingGain> {
        self.pending.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Add `amount` XP. An empty `reason` uses the default description.
    pub fn add_xp(&mut self, amount: u64, reason: &str) -> ProgressionResult<XpGain> {
        if let Some(pending) = &self.pending {
            return Err(ProgressionError::GainPending {
                amount: pending.gain.amount,
            });
        }

        let reason = if reason.is_empty() { DEFAULT_REASON } else { reason };
        let gain = apply_xp_gain(self.snapshot.xp, amount, reason)?;
        self.commit(gain, 0)
    }

    /// Award a fixed reward
    pub fn award(&mut self, reward: XpReward, table: &RewardTable) -> ProgressionResult<XpGain> {
        self.add_xp(table.amount(reward), reward.reason())
    }

    /// Persist the pending gain again
    pub fn retry_pending(&mut self) -> ProgressionResult<XpGain> {
        let pending = self.pending.take().ok_or(ProgressionError::NoPendingGain)?;

        let previous = &pending.gain;
        let gain = apply_xp_gain(previous.previous_xp, previous.amount, &previous.reason)?;

        let amount = gain.amount.to_string();
        let attempts = pending.attempts.to_string();
        log_event_with_fields(
            Event::XpRetry,
            &[("amount", &amount), ("attempts", &attempts)],
        );

        self.commit(gain, pending.attempts)
    }

    /// Drop the pending gain without persisting it
    pub fn discard_pending(&mut self) -> Option<PendingGain> {
        self.pending.take()
    }

    /// Replace the snapshot from a profile update for this user.
    ///
    /// Returns true if the snapshot was replaced.
    pub fn apply_profile_change(&mut self, event: &ChangeEvent) -> bool {
        if event.kind != EventKind::Updated || event.table != TableName::Profiles {
            return false;
        }
        let Some(record) = event.new_record.as_ref() else {
            return false;
        };
        if !record.get("id").is_some_and(|id| self.user_id.matches(id)) {
            return false;
        }
        let Some(xp) = record.get("xp").and_then(|xp| xp.as_u64()) else {
            return false;
        };

        if xp != self.snapshot.xp {
            let previous = self.snapshot.xp.to_string();
            let synced = xp.to_string();
            log_event_with_fields(
                Event::XpSynced,
                &[("previous_xp", &previous), ("xp", &synced)],
            );
        }
        self.snapshot = LevelSnapshot::from_xp(xp);
        true
    }

    fn commit(&mut self, gain: XpGain, attempts: u32) -> ProgressionResult<XpGain> {
        let user = self.user_id.to_string();

        if let Err(source) = self.store.write_profile_xp(self.user_id, gain.new_xp) {
            let amount = gain.amount.to_string();
            let error = source.to_string();
            log_event_with_fields(
                Event::XpPersistFailed,
                &[("amount", &amount), ("error", &error), ("user_id", &user)],
            );

            self.notifier.notify(Notification::destructive(
                "Failed to add XP",
                "An error occurred while updating your experience",
            ));

            let amount = gain.amount;
            self.pending = Some(PendingGain {
                gain,
                attempts: attempts.saturating_add(1),
            });
            return Err(ProgressionError::Persistence { amount, source });
        }

        self.snapshot = LevelSnapshot::from_xp(gain.new_xp);

        let amount = gain.amount.to_string();
        let new_xp = gain.new_xp.to_string();
        log_event_with_fields(
            Event::XpGained,
            &[("amount", &amount), ("new_xp", &new_xp), ("user_id", &user)],
        );
        self.notifier.notify(Notification::new(
            format!("+{} XP Gained!", gain.amount),
            gain.reason.clone(),
        ));

        if gain.leveled_up {
            let level = gain.new_level.to_string();
            log_event_with_fields(Event::LevelUp, &[("level", &level), ("user_id", &user)]);
            self.notifier.notify(Notification::new(
                "Level Up!",
                format!("Congratulations! You've reached level {}!", gain.new_level),
            ));
        }

        Ok(gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leveling::LevelingError;
    use crate::notify::{MemoryNotifier, Variant};
    use crate::profile::{MemoryProfileStore, Profile};
    use serde_json::json;

    fn tracker_with(xp: u64) -> (XpTracker<MemoryProfileStore>, Arc<MemoryNotifier>) {
        let user = UserId::random();
        let mut profile = Profile::new(user, "sam");
        profile.xp = xp;
        let notifier = Arc::new(MemoryNotifier::new());
        let tracker =
            XpTracker::load(user, MemoryProfileStore::with_profile(profile), notifier.clone())
                .unwrap();
        (tracker, notifier)
    }

    #[test]
    fn test_load_missing_profile() {
        let notifier = Arc::new(MemoryNotifier::new());
        let result = XpTracker::load(UserId::random(), MemoryProfileStore::new(), notifier);
        assert!(matches!(result, Err(ProgressionError::Load(_))));
    }

    #[test]
    fn test_add_xp_within_level() {
        let (mut tracker, notifier) = tracker_with(50);

        let gain = tracker.add_xp(10, "Logged an expense").unwrap();

        assert_eq!(gain.new_xp, 60);
        assert_eq!(tracker.snapshot().xp, 60);
        assert_eq!(tracker.store().read_profile_xp(tracker.user_id()).unwrap(), 60);
        assert_eq!(notifier.titles(), vec!["+10 XP Gained!"]);
        assert_eq!(notifier.sent()[0].description, "Logged an expense");
    }

    #[test]
    fn test_add_xp_level_up_raises_second_notification() {
        let (mut tracker, notifier) = tracker_with(90);

        let gain = tracker.add_xp(10, "").unwrap();

        assert!(gain.leveled_up);
        assert_eq!(tracker.snapshot().level, 2);
        assert_eq!(tracker.snapshot().xp_for_next_level, 400);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].description, DEFAULT_REASON);
        assert_eq!(sent[1].title, "Level Up!");
        assert_eq!(sent[1].description, "Congratulations! You've reached level 2!");
    }

    #[test]
    fn test_zero_amount_rejected_without_side_effects() {
        let (mut tracker, notifier) = tracker_with(50);

        let err = tracker.add_xp(0, "nothing").unwrap_err();

        assert_eq!(err, ProgressionError::Leveling(LevelingError::NonPositiveAmount));
        assert_eq!(tracker.snapshot().xp, 50);
        assert!(notifier.sent().is_empty());
        assert!(tracker.pending().is_none());
    }

    #[test]
    fn test_persistence_failure_keeps_snapshot_and_pending() {
        let (mut tracker, notifier) = tracker_with(90);
        tracker.store_mut().fail_next_writes(1);

        let err = tracker.add_xp(10, "Logged an expense").unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(tracker.snapshot().xp, 90);
        assert_eq!(tracker.snapshot().level, 1);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Failed to add XP");
        assert_eq!(sent[0].variant, Variant::Destructive);

        let pending = tracker.pending().unwrap();
        assert_eq!(pending.gain.new_xp, 100);
        assert_eq!(pending.attempts, 1);
    }

    #[test]
    fn test_add_while_pending_is_rejected() {
        let (mut tracker, _) = tracker_with(0);
        tracker.store_mut().fail_next_writes(1);
        let _ = tracker.add_xp(10, "first");

        let err = tracker.add_xp(50, "second").unwrap_err();
        assert_eq!(err, ProgressionError::GainPending { amount: 10 });
    }

    #[test]
    fn test_retry_yields_same_gain() {
        let (mut tracker, notifier) = tracker_with(90);
        tracker.store_mut().fail_next_writes(2);

        let _ = tracker.add_xp(10, "Logged an expense");
        let _ = tracker.retry_pending();
        assert_eq!(tracker.pending().unwrap().attempts, 2);

        notifier.clear();
        let gain = tracker.retry_pending().unwrap();

        assert_eq!(gain.previous_xp, 90);
        assert_eq!(gain.new_xp, 100);
        assert!(gain.leveled_up);
        assert!(tracker.pending().is_none());
        assert_eq!(tracker.snapshot().level, 2);
        assert_eq!(notifier.titles(), vec!["+10 XP Gained!", "Level Up!"]);
    }

    #[test]
    fn test_retry_without_pending() {
        let (mut tracker, _) = tracker_with(0);
        assert_eq!(tracker.retry_pending(), Err(ProgressionError::NoPendingGain));
    }

    #[test]
    fn test_discard_pending() {
        let (mut tracker, _) = tracker_with(0);
        tracker.store_mut().fail_next_writes(1);
        let _ = tracker.add_xp(10, "x");

        assert!(tracker.discard_pending().is_some());
        assert_eq!(tracker.add_xp(10, "x").unwrap().new_xp, 10);
    }

    #[test]
    fn test_award_uses_reward_table() {
        let (mut tracker, _) = tracker_with(0);
        let table = RewardTable {
            create_budget: 150,
            ..RewardTable::default()
        };

        let gain = tracker.award(XpReward::CreateBudget, &table).unwrap();
        assert_eq!(gain.amount, 150);
        assert_eq!(gain.reason, XpReward::CreateBudget.reason());
    }

    #[test]
    fn test_profile_change_for_same_user_replaces_snapshot() {
        let (mut tracker, _) = tracker_with(0);
        let id = tracker.user_id().to_string();

        let event = ChangeEvent::updated(
            TableName::Profiles,
            json!({"id": id, "xp": 0}),
            json!({"id": id, "xp": 400}),
        );

        assert!(tracker.apply_profile_change(&event));
        assert_eq!(tracker.snapshot().level, 3);
    }

    #[test]
    fn test_profile_change_ignored_for_other_user_or_table() {
        let (mut tracker, _) = tracker_with(0);
        let other = UserId::random().to_string();

        let event = ChangeEvent::updated(
            TableName::Profiles,
            json!({"id": other, "xp": 0}),
            json!({"id": other, "xp": 400}),
        );
        assert!(!tracker.apply_profile_change(&event));

        let id = tracker.user_id().to_string();
        let event = ChangeEvent::created(TableName::Expenses, json!({"id": id, "xp": 400}));
        assert!(!tracker.apply_profile_change(&event));

        let event = ChangeEvent::updated(
            TableName::Profiles,
            json!({"id": id}),
            json!({"id": id, "username": "renamed"}),
        );
        assert!(!tracker.apply_profile_change(&event));
        assert_eq!(tracker.snapshot().xp, 0);
    }
}
