//! # Profile Store
//!
//! Persistence collaborator for the XP total of a profile record.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::{ProfileError, ProfileResult};
use crate::auth::UserId;

/// Profile record as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    /// Missing on profiles created before XP existed
    #[serde(default)]
    pub xp: u64,
}

impl Profile {
    /// Fresh profile with zero XP
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            avatar_url: None,
            monthly_income: None,
            xp: 0,
        }
    }
}

/// Persistence collaborator
pub trait ProfileStore {
    /// Persisted XP total for `user_id`
    fn read_profile_xp(&self, user_id: UserId) -> ProfileResult<u64>;

    /// Persist `xp` as the new total for `user_id`
    fn write_profile_xp(&mut self, user_id: UserId, xp: u64) -> ProfileResult<()>;
}

/// In-memory store with write-failure injection
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: HashMap<UserId, Profile>,
    failing_writes: usize,
    writes: usize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one profile already present
    pub fn with_profile(profile: Profile) -> Self {
        let mut store = Self::new();
        store.insert(profile);
        store
    }

    pub fn insert(&mut self, profile: Profile) {
        self.profiles.insert(profile.id, profile);
    }

    pub fn profile(&self, user_id: UserId) -> Option<&Profile> {
        self.profiles.get(&user_id)
    }

    /// Make the next `count` writes fail
    pub fn fail_next_writes(&mut self, count: usize) {
        self.failing_writes = count;
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl ProfileStore for MemoryProfileStore {
    fn read_profile_xp(&self, user_id: UserId) -> ProfileResult<u64> {
        self.profiles
            .get(&user_id)
            .map(|p| p.xp)
            .ok_or(ProfileError::NotFound(user_id))
    }

    fn write_profile_xp(&mut self, user_id: UserId, xp: u64) -> ProfileResult<()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(ProfileError::Unavailable("injected write failure".to_string()));
        }

        let profile = self
            .profiles
            .get_mut(&user_id)
            .ok_or(ProfileError::NotFound(user_id))?;
        profile.xp = xp;
        self.writes += 1;
        Ok(())
    }
}
