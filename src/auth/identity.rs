//! # Identity
//!
//! The authenticated user as supplied by the identity provider. It is
//! passed explicitly to every component that needs it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an existing UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a random user ID
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// True if `value` is this user's ID in string form
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .is_some_and(|id| id == self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identity provider state: `{ user_id, loading }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Identity {
    /// Signed-in user, if any
    pub user_id: Option<UserId>,
    /// True while the provider has not resolved the session yet
    pub loading: bool,
}

impl Identity {
    /// Session still resolving
    pub fn loading() -> Self {
        Self {
            user_id: None,
            loading: true,
        }
    }

    /// No user signed in
    pub fn signed_out() -> Self {
        Self {
            user_id: None,
            loading: false,
        }
    }

    /// `user_id` signed in
    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            loading: false,
        }
    }

    /// The user registrations should be scoped to, if any.
    ///
    /// A loading identity has no active user even if one is cached.
    pub fn active_user(&self) -> Option<UserId> {
        if self.loading {
            None
        } else {
            self.user_id
        }
    }
}
