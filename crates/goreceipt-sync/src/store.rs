//! # Store Seams
//!
//! The two collaborators of the sync layer.
//!
//! ```text
//! ┌─────────────────────────────┐          ┌─────────────────────────────┐
//! │  RemoteStore (async)        │          │  LocalStore (sync)          │
//! │  hosted relational backend  │          │  device key/value storage   │
//! │                             │          │                             │
//! │  select(table, filter)      │          │  get(key)    -> Option<str> │
//! │  insert(table, record)      │          │  set(key, value)            │
//! │  upsert(table, records)     │          │  remove(key)                │
//! │  update(table, patch, flt)  │          │                             │
//! │  delete(table, filter)      │          │                             │
//! └─────────────────────────────┘          └─────────────────────────────┘
//!        MemoryRemoteStore                   MemoryLocalStore
//!                                            FileLocalStore
//! ```
//!
//! Neither trait enforces timeouts; a hung remote call hangs the caller.

use async_trait::async_trait;
use goreceipt_core::Record;
use serde_json::Value;
use thiserror::Error;

/// Errors reported by store implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request.
    #[error("Rejected by store: {0}")]
    Rejected(String),

    /// Device storage I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Filter
// =============================================================================

/// Conjunction of field equality conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field == value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether `record` satisfies every condition.
    ///
    /// Numbers and strings compare by their text, so `7` matches `"7"`.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            record
                .get(field)
                .is_some_and(|actual| loosely_equal(actual, expected))
        })
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => a == b,
    }
}

// =============================================================================
// Traits
// =============================================================================

/// The hosted record store, addressed by table name and filter.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>>;

    /// Inserts one record and returns it as stored (with any assigned id).
    async fn insert(&self, table: &str, record: Record) -> StoreResult<Record>;

    /// Inserts or replaces records by identity.
    async fn upsert(&self, table: &str, records: Vec<Record>) -> StoreResult<Vec<Record>>;

    /// Applies `patch` to every record matching `filter`.
    async fn update(&self, table: &str, patch: Record, filter: &Filter) -> StoreResult<()>;

    async fn delete(&self, table: &str, filter: &Filter) -> StoreResult<()>;
}

/// Device-local string storage.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches() {
        let record = json!({"id": 7, "businessId": "B1", "name": "Asha"})
            .as_object()
            .cloned()
            .unwrap();

        assert!(Filter::new().matches(&record));
        assert!(Filter::new().eq("businessId", "B1").eq("id", "7").matches(&record));
        assert!(Filter::new().eq("id", 7).matches(&record));
        assert!(!Filter::new().eq("businessId", "B2").matches(&record));
        assert!(!Filter::new().eq("phone", "1").matches(&record));
    }
}
