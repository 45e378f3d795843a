//! # Local Cache
//!
//! Owns every read and write of the device cache. Each table of each
//! business is one JSON array under `<table>_<businessId>`.
//!
//! Unreadable entries are treated as empty and logged; the UI keeps working
//! with whatever the next successful sync provides.

use goreceipt_core::Record;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::entity::{cache_key, EntityKind};
use crate::error::SyncResult;
use crate::store::LocalStore;

#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn LocalStore>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        LocalCache { store }
    }

    /// Cached records of a table. Missing or malformed entries read as empty.
    pub fn read(&self, kind: EntityKind, business_id: &str) -> Vec<Record> {
        let key = cache_key(kind, business_id);
        let Some(raw) = self.read_raw(&key) else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => {
                let total = values.len();
                let records: Vec<Record> = values
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::Object(map) => Some(map),
                        _ => None,
                    })
                    .collect();
                if records.len() != total {
                    warn!(key = %key, skipped = total - records.len(), "Skipped non-object cache rows");
                }
                records
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Malformed cache entry, treating as empty");
                Vec::new()
            }
        }
    }

    /// Replaces the cached records of a table.
    pub fn write(&self, kind: EntityKind, business_id: &str, records: &[Record]) -> SyncResult<()> {
        let key = cache_key(kind, business_id);
        let json = serde_json::to_string(records)?;
        self.store.set(&key, &json)?;
        debug!(key = %key, count = records.len(), "Cache written");
        Ok(())
    }

    pub fn clear(&self, kind: EntityKind, business_id: &str) -> SyncResult<()> {
        self.store.remove(&cache_key(kind, business_id))?;
        Ok(())
    }

    /// Reads a typed value stored under `key`; malformed values read as `None`.
    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Malformed cache value, ignoring");
                None
            }
        }
    }

    pub fn write_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SyncResult<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)?;
        Ok(())
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Local store read failed, treating as empty");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLocalStore;
    use serde_json::json;

    #[test]
    fn test_write_then_read() {
        let cache = LocalCache::new(Arc::new(MemoryLocalStore::new()));
        let records = vec![json!({"id": 1, "name": "A"}).as_object().cloned().unwrap()];
        cache.write(EntityKind::Customers, "B1", &records).unwrap();

        assert_eq!(cache.read(EntityKind::Customers, "B1"), records);
        assert!(cache.read(EntityKind::Customers, "B2").is_empty());
    }

    #[test]
    fn test_malformed_entry_reads_as_empty() {
        let store = Arc::new(MemoryLocalStore::new());
        store.set("customers_B1", "{not json").unwrap();
        store.set("products_B1", r#"[{"id":1}, 5, "x"]"#).unwrap();

        let cache = LocalCache::new(store);
        assert!(cache.read(EntityKind::Customers, "B1").is_empty());
        assert_eq!(cache.read(EntityKind::Products, "B1").len(), 1);
        assert_eq!(cache.read_value::<Vec<String>>("customers_B1"), None);
    }
}
