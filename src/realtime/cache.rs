//! # Table Cache
//!
//! One read cache per (table, user). Rows are loaded once and then kept
//! fresh by applying change events, instead of every view re-querying the
//! same table.

use std::collections::HashMap;

use serde_json::Value;

use super::event::{ChangeEvent, EventKind, TableName};
use crate::auth::UserId;

/// Rows keyed by (table, user)
#[derive(Debug, Default)]
pub struct TableCache {
    tables: HashMap<(TableName, UserId), Vec<Value>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached rows for (table, user)
    pub fn load(&mut self, table: TableName, user: UserId, rows: Vec<Value>) {
        self.tables.insert((table, user), rows);
    }

    /// Cached rows, if the table was loaded for `user`
    pub fn rows(&self, table: TableName, user: UserId) -> Option<&[Value]> {
        self.tables.get(&(table, user)).map(Vec::as_slice)
    }

    /// True if (table, user) is cached
    pub fn is_loaded(&self, table: TableName, user: UserId) -> bool {
        self.tables.contains_key(&(table, user))
    }

    /// Forget everything cached for `user`, e.g. on sign-out
    pub fn invalidate_user(&mut self, user: UserId) {
        self.tables.retain(|(_, owner), _| *owner != user);
    }

    /// Apply `event` to the rows cached for `user`.
    ///
    /// Returns true if the cached rows changed. Tables that were never
    /// loaded are left alone.
    pub fn apply(&mut self, user: UserId, event: &ChangeEvent) -> bool {
        let Some(rows) = self.tables.get_mut(&(event.table, user)) else {
            return false;
        };
        let Some(id) = event.record_id().cloned() else {
            return false;
        };
        let position = rows.iter().position(|r| r.get("id") == Some(&id));

        match event.kind {
            EventKind::Created | EventKind::Updated => {
                let Some(record) = event.new_record.clone() else {
                    return false;
                };
                match position {
                    Some(index) => rows[index] = record,
                    None => rows.push(record),
                }
                true
            }
            EventKind::Deleted => match position {
                Some(index) => {
                    rows.remove(index);
                    true
                }
                None => false,
            },
        }
    }
}
