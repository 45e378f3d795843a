//! # Undo and Audit Journal
//!
//! ```text
//!   delete_entity ──► UndoJournal.push(Delete, prior)     undo_last ──► pop
//!   update_entity ──► UndoJournal.push(Update, prior)                    │
//!                                                          Delete: re-insert prior
//!                                                          Update: restore prior
//!
//!   every mutation ──► AuditLog.record(action, entity, data)   (best effort)
//! ```
//!
//! The undo stack has no depth limit but only its top entry is ever used.
//! Both the stack and the audit log belong to one session and are owned by
//! the sync engine; nothing here is global.

use chrono::{DateTime, Utc};
use goreceipt_core::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::LocalCache;
use crate::entity::EntityKind;

// =============================================================================
// Undo
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndoAction {
    /// Reversed by re-inserting the prior record.
    Delete,
    /// Reversed by writing the prior record back.
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoEntry {
    pub action: UndoAction,
    pub prior: Record,
    pub entity: EntityKind,
    pub business_id: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct UndoJournal {
    stack: Vec<UndoEntry>,
}

impl UndoJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: UndoAction, prior: Record, entity: EntityKind, business_id: &str) {
        self.stack.push(UndoEntry {
            action,
            prior,
            entity,
            business_id: business_id.to_string(),
            at: Utc::now(),
        });
    }

    /// Puts a popped entry back, e.g. when reversing it failed.
    pub fn restore(&mut self, entry: UndoEntry) {
        self.stack.push(entry);
    }

    /// Pops the top entry. An empty stack yields `None`.
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.stack.pop()
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.stack.last()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Drops every entry (session end).
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

// =============================================================================
// Audit
// =============================================================================

/// Cache key of the per-device audit log.
pub const AUDIT_LOG_KEY: &str = "audit_log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    pub entity: String,
    pub business_id: String,
    pub device_id: String,
    #[serde(default)]
    pub data: Value,
    pub at: DateTime<Utc>,
}

/// Append-only, per-device audit trail, persisted to the local cache.
///
/// Oldest entries are dropped beyond `max_entries`.
pub struct AuditLog {
    cache: LocalCache,
    device_id: String,
    max_entries: usize,
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    /// Opens the log, loading entries saved by earlier sessions.
    pub fn open(cache: LocalCache, device_id: &str, max_entries: usize) -> Self {
        let entries: Vec<AuditEntry> = cache.read_value(AUDIT_LOG_KEY).unwrap_or_default();
        debug!(count = entries.len(), "Audit log loaded");
        AuditLog {
            cache,
            device_id: device_id.to_string(),
            max_entries: max_entries.max(1),
            entries: Mutex::new(entries),
        }
    }

    /// Appends an entry. Never fails: a persistence error is logged and the
    /// entry stays in memory.
    pub fn record(&self, action: &str, entity: EntityKind, data: Value, business_id: &str) {
        let entry = AuditEntry {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            entity: entity.table().to_string(),
            business_id: business_id.to_string(),
            device_id: self.device_id.clone(),
            data,
            at: Utc::now(),
        };

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push(entry);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        if let Err(e) = self.cache.write_value(AUDIT_LOG_KEY, entries.as_slice()) {
            warn!(error = %e, action, entity = %entity, "Failed to persist audit entry");
        }
    }

    /// Snapshot of the log, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLocalStore;
    use crate::store::{LocalStore, StoreError, StoreResult};
    use serde_json::json;
    use std::sync::Arc;

    struct BrokenStore;

    impl LocalStore for BrokenStore {
        fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Io("disk gone".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> StoreResult<()> {
            Err(StoreError::Io("disk full".into()))
        }

        fn remove(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::Io("disk gone".into()))
        }
    }

    #[test]
    fn test_undo_stack_is_lifo() {
        let mut journal = UndoJournal::new();
        assert!(journal.pop().is_none());

        let a = json!({"id": 1}).as_object().cloned().unwrap();
        let b = json!({"id": 2}).as_object().cloned().unwrap();
        journal.push(UndoAction::Delete, a, EntityKind::Customers, "B1");
        journal.push(UndoAction::Update, b.clone(), EntityKind::Products, "B1");

        let top = journal.pop().unwrap();
        assert_eq!(top.action, UndoAction::Update);
        assert_eq!(top.prior, b);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_audit_persists_and_caps() {
        let store = Arc::new(MemoryLocalStore::new());
        let log = AuditLog::open(LocalCache::new(store.clone()), "dev-1", 2);
        log.record("add", EntityKind::Customers, json!({"id": 1}), "B1");
        log.record("update", EntityKind::Customers, json!({"id": 1}), "B1");
        log.record("delete", EntityKind::Customers, json!({"id": 1}), "B1");

        let actions: Vec<String> = log.entries().into_iter().map(|e| e.action).collect();
        assert_eq!(actions, vec!["update", "delete"]);

        let reopened = AuditLog::open(LocalCache::new(store), "dev-1", 10);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.entries()[0].device_id, "dev-1");
    }

    #[test]
    fn test_audit_never_fails() {
        let log = AuditLog::open(LocalCache::new(Arc::new(BrokenStore)), "dev-1", 10);
        log.record("add", EntityKind::Receipts, Value::Null, "B1");
        assert_eq!(log.len(), 1);
    }
}
