//! In-process stores.
//!
//! `MemoryRemoteStore` stands in for the hosted backend in tests and in the
//! `preview` binary. Any operation can be made to fail on demand.

use async_trait::async_trait;
use goreceipt_core::Record;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tracing::debug;

use crate::merge::identity_key;
use crate::store::{Filter, LocalStore, RemoteStore, StoreError, StoreResult};

/// A remote store operation, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Select,
    Insert,
    Upsert,
    Update,
    Delete,
}

impl RemoteOp {
    pub const ALL: [RemoteOp; 5] = [
        RemoteOp::Select,
        RemoteOp::Insert,
        RemoteOp::Upsert,
        RemoteOp::Update,
        RemoteOp::Delete,
    ];
}

// =============================================================================
// Remote
// =============================================================================

#[derive(Default)]
pub struct MemoryRemoteStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    failing: StdMutex<HashSet<RemoteOp>>,
    next_id: AtomicU64,
    calls: AtomicU64,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Makes `op` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, op: RemoteOp) {
        self.failing_ops().insert(op);
    }

    /// Makes every operation fail (simulates being offline).
    pub fn go_offline(&self) {
        self.failing_ops().extend(RemoteOp::ALL);
    }

    pub fn heal(&self) {
        self.failing_ops().clear();
    }

    /// Number of calls received, failed ones included.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Snapshot of a table.
    pub async fn table(&self, table: &str) -> Vec<Record> {
        self.tables.lock().await.get(table).cloned().unwrap_or_default()
    }

    /// Seeds a table directly, bypassing failure injection.
    pub async fn seed(&self, table: &str, records: Vec<Record>) {
        self.tables
            .lock()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(records);
    }

    fn failing_ops(&self) -> std::sync::MutexGuard<'_, HashSet<RemoteOp>> {
        self.failing.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self, op: RemoteOp, table: &str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing_ops().contains(&op) {
            debug!(?op, table, "Injected remote failure");
            return Err(StoreError::Unavailable(format!("{:?} {} failed", op, table)));
        }
        Ok(())
    }

    fn assign_id(&self, record: &mut Record) {
        if record.get("id").map_or(true, Value::is_null) {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            record.insert("id".to_string(), Value::from(id));
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn select(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        self.check(RemoteOp::Select, table)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, mut record: Record) -> StoreResult<Record> {
        self.check(RemoteOp::Insert, table)?;
        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table.to_string()).or_default();

        if let Some(key) = identity_key(&record) {
            if record.contains_key("id") && rows.iter().any(|r| identity_key(r).as_ref() == Some(&key)) {
                return Err(StoreError::Rejected(format!("duplicate {} in {}", key, table)));
            }
        }
        self.assign_id(&mut record);
        rows.push(record.clone());
        Ok(record)
    }

    async fn upsert(&self, table: &str, records: Vec<Record>) -> StoreResult<Vec<Record>> {
        self.check(RemoteOp::Upsert, table)?;
        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table.to_string()).or_default();

        for record in &records {
            let key = identity_key(record);
            match rows
                .iter_mut()
                .find(|r| key.is_some() && identity_key(r) == key)
            {
                Some(existing) => *existing = record.clone(),
                None => rows.push(record.clone()),
            }
        }
        Ok(records)
    }

    async fn update(&self, table: &str, patch: Record, filter: &Filter) -> StoreResult<()> {
        self.check(RemoteOp::Update, table)?;
        let mut tables = self.tables.lock().await;
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| filter.matches(r)) {
                for (field, value) in &patch {
                    row.insert(field.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> StoreResult<()> {
        self.check(RemoteOp::Delete, table)?;
        let mut tables = self.tables.lock().await;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }
}

// =============================================================================
// Local
// =============================================================================

/// Key/value store held in memory; one per session.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: StdMutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_select_filters() {
        let store = MemoryRemoteStore::new();
        let saved = store
            .insert("customers", rec(json!({"name": "Asha", "businessId": "B1"})))
            .await
            .unwrap();
        assert_eq!(saved["id"], 1);
        store
            .insert("customers", rec(json!({"name": "Ravi", "businessId": "B2"})))
            .await
            .unwrap();

        let b1 = store
            .select("customers", &Filter::new().eq("businessId", "B1"))
            .await
            .unwrap();
        assert_eq!(b1.len(), 1);
        assert_eq!(b1[0]["name"], "Asha");
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_identity() {
        let store = MemoryRemoteStore::new();
        store.seed("products", vec![rec(json!({"id": 1, "price": 10}))]).await;
        store
            .upsert(
                "products",
                vec![rec(json!({"id": 1, "price": 12})), rec(json!({"id": 2, "price": 5}))],
            )
            .await
            .unwrap();

        let rows = store.table("products").await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["price"], 12);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryRemoteStore::new();
        store.fail(RemoteOp::Delete);
        assert!(store.delete("customers", &Filter::new()).await.is_err());
        assert!(store.select("customers", &Filter::new()).await.is_ok());

        store.go_offline();
        assert!(store.select("customers", &Filter::new()).await.is_err());

        store.heal();
        assert!(store.delete("customers", &Filter::new()).await.is_ok());
        assert_eq!(store.call_count(), 4);
    }

    #[test]
    fn test_memory_local_store() {
        let store = MemoryLocalStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.keys().is_empty());
    }
}
