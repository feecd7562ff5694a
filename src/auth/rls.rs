//! # Row-Level Security
//!
//! Ownership scoping of change-feed records. Every finance table is owned
//! through its `user_id` column, except `profiles` whose primary key is the
//! owner.

use serde_json::Value;

use super::identity::UserId;
use crate::realtime::TableName;

/// Ownership policy for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowPolicy {
    /// Visible to everyone
    Public,
    /// Visible only to the user named in `owner_field`
    Ownership { owner_field: &'static str },
}

impl RowPolicy {
    /// Policy applied to `table` by the managed backend
    pub fn for_table(table: TableName) -> Self {
        match table {
            TableName::Profiles => RowPolicy::Ownership { owner_field: "id" },
            TableName::ExpenseCategories => RowPolicy::Public,
            TableName::Expenses | TableName::SavingsGoals | TableName::UserAchievements => {
                RowPolicy::Ownership {
                    owner_field: "user_id",
                }
            }
        }
    }

    /// Check whether `user` may see `record`
    ///
    /// Records without the owner field are hidden.
    pub fn allows(&self, user: UserId, record: &Value) -> bool {
        match self {
            RowPolicy::Public => true,
            RowPolicy::Ownership { owner_field } => record
                .get(*owner_field)
                .is_some_and(|owner| user.matches(owner)),
        }
    }
}
