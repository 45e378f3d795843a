//! # Record Merge
//!
//! Reconciles the cached record set with the remote one.
//!
//! ## Policy: local wins, per field
//! ```text
//!   remote  {id:1, name:"A", phone:"222", city:"Pune"}
//!   local   {id:1, name:"A", phone:"111"}
//!                         │
//!         remote applied first, local on top (shallow)
//!                         ▼
//!   merged  {id:1, name:"A", phone:"111", city:"Pune"}
//! ```
//!
//! The cache only ever holds records the server acknowledged (writes are
//! gated on the remote call), plus edits made while offline. The device's
//! copy is therefore the most recent edit and wins every conflicting field.
//! This one rule is used for every table.
//!
//! Records are matched on `id` when present, else on `name`. Output order is
//! remote order followed by records that exist only locally.

use goreceipt_core::Record;
use serde_json::Value;
use std::collections::HashMap;

/// Identity of a record for merging: `id` if present, else `name`.
///
/// Numeric and string ids with the same text are the same identity.
pub fn identity_key(record: &Record) -> Option<String> {
    let id = record.get("id").and_then(scalar_text);
    id.map(|id| format!("id:{}", id)).or_else(|| {
        record
            .get("name")
            .and_then(scalar_text)
            .map(|name| format!("name:{}", name))
    })
}

/// The `id` or `name` value a caller passes to address a record.
pub fn matches_key(record: &Record, key: &str) -> bool {
    match record.get("id").and_then(scalar_text) {
        Some(id) => id == key,
        None => record.get("name").and_then(scalar_text).as_deref() == Some(key),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Merges `local` over `remote`.
pub fn merge(remote: &[Record], local: &[Record]) -> Vec<Record> {
    let mut merged: Vec<Record> = Vec::with_capacity(remote.len().max(local.len()));
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in remote.iter().chain(local) {
        match identity_key(record) {
            Some(key) => match index.get(&key) {
                Some(&i) => {
                    for (field, value) in record {
                        merged[i].insert(field.clone(), value.clone());
                    }
                }
                None => {
                    index.insert(key, merged.len());
                    merged.push(record.clone());
                }
            },
            // Without an identity the record can only be deduplicated whole.
            None => {
                if !merged.contains(record) {
                    merged.push(record.clone());
                }
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_local_wins_on_conflicting_fields() {
        let local = vec![rec(json!({"id": 1, "name": "A", "phone": "111"}))];
        let remote = vec![rec(json!({"id": 1, "name": "A", "phone": "222"}))];

        let merged = merge(&remote, &local);
        assert_eq!(merged, vec![rec(json!({"id": 1, "name": "A", "phone": "111"}))]);
    }

    #[test]
    fn test_remote_only_fields_survive() {
        let local = vec![rec(json!({"id": 1, "phone": "111"}))];
        let remote = vec![rec(json!({"id": 1, "phone": "222", "city": "Pune"}))];

        let merged = merge(&remote, &local);
        assert_eq!(merged[0]["city"], "Pune");
        assert_eq!(merged[0]["phone"], "111");
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let set = vec![
            rec(json!({"id": 1, "name": "A"})),
            rec(json!({"name": "B", "phone": "9"})),
            rec(json!({"note": "no identity"})),
        ];
        assert_eq!(merge(&set, &set), set);
        assert_eq!(merge(&merge(&set, &set), &set), set);
    }

    #[test]
    fn test_union_keeps_remote_order_then_local_only() {
        let remote = vec![rec(json!({"id": 2})), rec(json!({"id": 1}))];
        let local = vec![rec(json!({"id": 3})), rec(json!({"id": 1, "x": true}))];

        let ids: Vec<String> = merge(&remote, &local)
            .iter()
            .map(|r| r["id"].to_string())
            .collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_numeric_and_string_ids_match() {
        let remote = vec![rec(json!({"id": 7, "name": "A"}))];
        let local = vec![rec(json!({"id": "7", "name": "B"}))];
        let merged = merge(&remote, &local);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0]["name"], "B");
    }

    #[test]
    fn test_name_identity_when_no_id() {
        let remote = vec![rec(json!({"name": "Festive", "layout": "modern"}))];
        let local = vec![rec(json!({"name": "Festive", "layout": "bold"}))];
        let merged = merge(&remote, &local);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0]["layout"], "bold");
        assert!(matches_key(&merged[0], "Festive"));
    }
}
