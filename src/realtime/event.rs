//! # Real-Time Events
//!
//! Tables observable through the change feed and the change events they
//! produce.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{RealtimeError, RealtimeResult};

/// Tables exposed through the change feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Expenses,
    SavingsGoals,
    Profiles,
    UserAchievements,
    ExpenseCategories,
}

impl TableName {
    /// Every observable table
    pub const ALL: [TableName; 5] = [
        TableName::Expenses,
        TableName::SavingsGoals,
        TableName::Profiles,
        TableName::UserAchievements,
        TableName::ExpenseCategories,
    ];

    /// Backend table name
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Expenses => "expenses",
            TableName::SavingsGoals => "savings_goals",
            TableName::Profiles => "profiles",
            TableName::UserAchievements => "user_achievements",
            TableName::ExpenseCategories => "expense_categories",
        }
    }

    /// Human-readable name used in notification titles
    pub fn display_name(&self) -> &'static str {
        match self {
            TableName::Expenses => "Expenses",
            TableName::SavingsGoals => "Savings goals",
            TableName::Profiles => "Profiles",
            TableName::UserAchievements => "User achievements",
            TableName::ExpenseCategories => "Expense categories",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TableName {
    type Err = RealtimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RealtimeError::UnknownTable(s.to_string()))
    }
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// Row inserted
    #[serde(rename = "INSERT")]
    Created,
    /// Row updated
    #[serde(rename = "UPDATE")]
    Updated,
    /// Row deleted
    #[serde(rename = "DELETE")]
    Deleted,
}

impl EventKind {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "INSERT",
            EventKind::Updated => "UPDATE",
            EventKind::Deleted => "DELETE",
        }
    }

    /// Notification text used when no custom template is given
    pub fn default_message(&self) -> &'static str {
        match self {
            EventKind::Created => "New data added",
            EventKind::Updated => "Data updated",
            EventKind::Deleted => "Data removed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = RealtimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(EventKind::Created),
            "UPDATE" => Ok(EventKind::Updated),
            "DELETE" => Ok(EventKind::Deleted),
            other => Err(RealtimeError::UnknownEventKind(other.to_string())),
        }
    }
}

/// Non-empty set of event kinds a registration observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventKinds(BTreeSet<EventKind>);

impl EventKinds {
    /// All three kinds
    pub fn all() -> Self {
        Self(
            [EventKind::Created, EventKind::Updated, EventKind::Deleted]
                .into_iter()
                .collect(),
        )
    }

    /// Exactly `kinds`; fails if empty
    pub fn only<I>(kinds: I) -> RealtimeResult<Self>
    where
        I: IntoIterator<Item = EventKind>,
    {
        let set: BTreeSet<EventKind> = kinds.into_iter().collect();
        if set.is_empty() {
            return Err(RealtimeError::EmptyEventSet);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the set is non-empty by construction
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EventKinds {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for EventKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|k| k.as_str()).collect();
        write!(f, "{}", names.join(","))
    }
}

/// One row-level change delivered by the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Change kind
    pub kind: EventKind,

    /// Table the row belongs to
    pub table: TableName,

    /// Row after the change (INSERT/UPDATE)
    #[serde(rename = "new", skip_serializing_if = "Option::is_none")]
    pub new_record: Option<Value>,

    /// Row before the change (UPDATE/DELETE)
    #[serde(rename = "old", skip_serializing_if = "Option::is_none")]
    pub old_record: Option<Value>,

    /// Commit time reported by the backend
    pub commit_timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Row inserted
    pub fn created(table: TableName, record: Value) -> Self {
        Self {
            kind: EventKind::Created,
            table,
            new_record: Some(record),
            old_record: None,
            commit_timestamp: Utc::now(),
        }
    }

    /// Row updated
    pub fn updated(table: TableName, old_record: Value, new_record: Value) -> Self {
        Self {
            kind: EventKind::Updated,
            table,
            new_record: Some(new_record),
            old_record: Some(old_record),
            commit_timestamp: Utc::now(),
        }
    }

    /// Row deleted
    pub fn deleted(table: TableName, record: Value) -> Self {
        Self {
            kind: EventKind::Deleted,
            table,
            new_record: None,
            old_record: Some(record),
            commit_timestamp: Utc::now(),
        }
    }

    /// The row this event is about: new state if any, else the old one
    pub fn record(&self) -> Option<&Value> {
        self.new_record.as_ref().or(self.old_record.as_ref())
    }

    /// `id` column of the affected row
    pub fn record_id(&self) -> Option<&Value> {
        self.record().and_then(|r| r.get("id"))
    }

    /// Channel topic the event travels on
    pub fn topic(&self) -> String {
        format!("{}-changes", self.table)
    }

    /// Serialize to the backend's postgres_changes shape
    pub fn to_wire_format(&self) -> Value {
        serde_json::json!({
            "type": "postgres_changes",
            "payload": {
                "eventType": self.kind.as_str(),
                "schema": "public",
                "table": self.table.as_str(),
                "new": self.new_record,
                "old": self.old_record,
                "commit_timestamp": self.commit_timestamp.to_rfc3339(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_name_roundtrip() {
        for table in TableName::ALL {
            assert_eq!(table.as_str().parse::<TableName>().unwrap(), table);
        }
        assert!(matches!(
            "users".parse::<TableName>(),
            Err(RealtimeError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(EventKind::Created.to_string(), "INSERT");
        assert_eq!("DELETE".parse::<EventKind>().unwrap(), EventKind::Deleted);
        assert_eq!(
            serde_json::to_value(EventKind::Updated).unwrap(),
            json!("UPDATE")
        );
    }

    #[test]
    fn test_event_kinds_non_empty() {
        assert_eq!(EventKinds::only([]), Err(RealtimeError::EmptyEventSet));

        let kinds = EventKinds::only([EventKind::Updated, EventKind::Updated]).unwrap();
        assert_eq!(kinds.len(), 1);
        assert!(kinds.contains(EventKind::Updated));
        assert!(!kinds.contains(EventKind::Created));
        assert_eq!(EventKinds::default(), EventKinds::all());
        assert_eq!(EventKinds::all().to_string(), "INSERT,UPDATE,DELETE");
    }

    #[test]
    fn test_event_record_selection() {
        let created = ChangeEvent::created(TableName::Expenses, json!({"id": "a"}));
        assert_eq!(created.record_id(), Some(&json!("a")));
        assert!(created.old_record.is_none());

        let deleted = ChangeEvent::deleted(TableName::Expenses, json!({"id": "b"}));
        assert_eq!(deleted.record_id(), Some(&json!("b")));
        assert!(deleted.new_record.is_none());
    }

    #[test]
    fn test_wire_format() {
        let event = ChangeEvent::updated(
            TableName::Profiles,
            json!({"xp": 10}),
            json!({"xp": 20}),
        );

        let wire = event.to_wire_format();
        assert_eq!(wire["type"], "postgres_changes");
        assert_eq!(wire["payload"]["eventType"], "UPDATE");
        assert_eq!(wire["payload"]["table"], "profiles");
        assert_eq!(wire["payload"]["new"]["xp"], 20);
        assert_eq!(event.topic(), "profiles-changes");
    }
}
