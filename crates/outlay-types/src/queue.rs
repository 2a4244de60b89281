//! Pending-operation records for the offline queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The two remote collections a mutation can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Expenses,
    Categories,
}

impl Collection {
    /// Remote table name, which doubles as the read-cache key.
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Expenses => "expenses",
            Collection::Categories => "categories",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// The kind of mutation an entry represents.
///
/// `Insert` and `Update` are handled identically on replay: both become an
/// upsert keyed by the record's primary id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Insert,
    Update,
    Delete,
}

/// One buffered mutation, immutable once created.
///
/// `payload` holds the caller's fields exactly as submitted: the full draft
/// for insert/update, `{"id": "..."}` for delete. Owner attribution and
/// currency defaulting happen at replay time, not at enqueue time, so the
/// entry stays a faithful record of what the caller asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    /// Unique id, assigned at enqueue time; the entry's storage key.
    pub id: String,
    pub table: Collection,
    pub op: OpKind,
    pub payload: Value,
    /// Enqueue timestamp; replay preserves ascending order.
    pub created_at: DateTime<Utc>,
}

impl QueuedOperation {
    /// Create a new entry stamped with a fresh id and the current time.
    pub fn new(table: Collection, op: OpKind, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            table,
            op,
            payload,
            created_at: Utc::now(),
        }
    }

    /// Convenience constructor for a delete entry.
    pub fn delete(table: Collection, id: &str) -> Self {
        Self::new(table, OpKind::Delete, serde_json::json!({ "id": id }))
    }

    /// The target row id of a delete entry, if present in the payload.
    pub fn delete_target(&self) -> Option<&str> {
        self.payload.get("id").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_get_distinct_ids() {
        let a = QueuedOperation::delete(Collection::Expenses, "x");
        let b = QueuedOperation::delete(Collection::Expenses, "x");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_delete_target() {
        let entry = QueuedOperation::delete(Collection::Categories, "c9");
        assert_eq!(entry.delete_target(), Some("c9"));

        let upsert = QueuedOperation::new(
            Collection::Categories,
            OpKind::Insert,
            serde_json::json!({ "name": "food" }),
        );
        assert_eq!(upsert.delete_target(), None);
    }

    #[test]
    fn test_round_trips_through_json_line() {
        let entry = QueuedOperation::new(
            Collection::Expenses,
            OpKind::Update,
            serde_json::json!({ "id": "e1", "title": "lunch", "amount": 12.0 }),
        );
        let line = serde_json::to_string(&entry).unwrap();
        assert!(!line.contains('\n'));
        let back: QueuedOperation = serde_json::from_str(&line).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::Expenses.table_name(), "expenses");
        assert_eq!(Collection::Categories.table_name(), "categories");
        assert_eq!(Collection::Expenses.to_string(), "expenses");
    }
}
