//! # Sync Engine
//!
//! Keeps the device cache and the remote store consistent.
//!
//! ## Two-Phase Mutations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  add / update / delete                                                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  1. stage()   committed = cache                                        │
//! │               pending   = committed + change      (working copy)       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  2. remote write ──── fails ──► error to caller; cache untouched,      │
//! │        │                        working copy dropped                    │
//! │        ▼ ok                                                             │
//! │  3. commit    cache = cache at commit time + change                    │
//! │               undo journal + audit log                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The remote write is the gate for persistence. The cache therefore never
//! shows a change the server refused. Drafts are the exception: they live on
//! the device only and skip step 2.
//!
//! Commit folds the change into the cache as it is at commit time, not into
//! the copy taken at stage time, so overlapping writes to one table all land.
//! Two quick edits to the same record still race at the remote store;
//! whichever response lands last wins.

use goreceipt_core::validation::validate_business_id;
use goreceipt_core::Record;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::cache::LocalCache;
use crate::config::SyncConfig;
use crate::entity::{EntityKind, BUSINESS_FIELD};
use crate::error::{SyncError, SyncResult};
use crate::journal::{AuditLog, UndoAction, UndoEntry, UndoJournal};
use crate::merge::{identity_key, matches_key, merge};
use crate::store::{Filter, LocalStore, RemoteStore};

// =============================================================================
// Staged Mutation
// =============================================================================

/// A requested change to one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Add(Record),
    /// `key` is the record's `id`, or its `name` when it has no id.
    Update { key: String, patch: Record },
    Delete { key: String },
}

impl Mutation {
    pub fn action(&self) -> &'static str {
        match self {
            Mutation::Add(_) => "add",
            Mutation::Update { .. } => "update",
            Mutation::Delete { .. } => "delete",
        }
    }
}

/// A mutation applied to a working copy but not yet persisted.
#[derive(Debug, Clone)]
pub struct StagedMutation {
    kind: EntityKind,
    business_id: String,
    mutation: Mutation,
    committed: Vec<Record>,
    pending: Vec<Record>,
    /// Record as it was before an update or delete.
    prior: Option<Record>,
    /// Record after the change (the removed record for deletes).
    target: Record,
}

impl StagedMutation {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    /// The working copy with the change applied.
    pub fn pending(&self) -> &[Record] {
        &self.pending
    }

    /// The authoritative record set, as cached when staged.
    pub fn committed(&self) -> &[Record] {
        &self.committed
    }

    pub fn prior(&self) -> Option<&Record> {
        self.prior.as_ref()
    }
}

/// Remote filter addressing one record of a business.
fn record_filter(business_id: &str, record: &Record) -> Filter {
    let filter = Filter::new().eq(BUSINESS_FIELD, business_id);
    match record.get("id").filter(|v| !v.is_null()) {
        Some(id) => filter.eq("id", id.clone()),
        None => filter.eq("name", record.get("name").cloned().unwrap_or(Value::Null)),
    }
}

/// Applies an acknowledged mutation to the current cached records.
fn fold_committed(
    records: &mut Vec<Record>,
    mutation: &Mutation,
    prior: Option<&Record>,
    target: &Record,
    stored: &Record,
) {
    let same = |a: &Record, b: &Record| {
        let key = identity_key(b);
        key.is_some() && identity_key(a) == key
    };

    match mutation {
        // The store may have assigned an id on insert.
        Mutation::Add(_) => match records.iter_mut().find(|r| same(&**r, target) || same(&**r, stored)) {
            Some(existing) => *existing = stored.clone(),
            None => records.push(stored.clone()),
        },
        Mutation::Update { .. } => {
            let address = prior.unwrap_or(target);
            match records.iter_mut().find(|r| same(&**r, address)) {
                Some(existing) => *existing = stored.clone(),
                None => records.push(stored.clone()),
            }
        }
        Mutation::Delete { .. } => records.retain(|r| !same(r, target)),
    }
}

// =============================================================================
// Engine
// =============================================================================

pub struct SyncEngine {
    remote: Arc<dyn RemoteStore>,
    cache: LocalCache,
    undo: Mutex<UndoJournal>,
    audit: AuditLog,
}

impl SyncEngine {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        local: Arc<dyn LocalStore>,
        device_id: &str,
        audit_max_entries: usize,
    ) -> Self {
        let cache = LocalCache::new(local);
        let audit = AuditLog::open(cache.clone(), device_id, audit_max_entries);
        SyncEngine {
            remote,
            cache,
            undo: Mutex::new(UndoJournal::new()),
            audit,
        }
    }

    pub fn from_config(
        remote: Arc<dyn RemoteStore>,
        local: Arc<dyn LocalStore>,
        config: &SyncConfig,
    ) -> Self {
        Self::new(remote, local, config.device_id(), config.audit.max_entries)
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    fn journal(&self) -> MutexGuard<'_, UndoJournal> {
        self.undo.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn undo_depth(&self) -> usize {
        self.journal().len()
    }

    /// Drops the undo history (session end).
    pub fn clear_undo(&self) {
        self.journal().clear();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read-through load: a successful remote read refreshes the cache; a
    /// failed one falls back to the cache with a warning.
    pub async fn load_entity(&self, kind: EntityKind, business_id: &str) -> Vec<Record> {
        if kind.is_local_only() {
            return self.cache.read(kind, business_id);
        }

        let filter = Filter::new().eq(BUSINESS_FIELD, business_id);
        match self.remote.select(kind.table(), &filter).await {
            Ok(records) => {
                if let Err(e) = self.cache.write(kind, business_id, &records) {
                    warn!(entity = %kind, business_id, error = %e, "Could not refresh cache");
                }
                debug!(entity = %kind, business_id, count = records.len(), "Loaded from remote");
                records
            }
            Err(e) => {
                warn!(entity = %kind, business_id, error = %e, "Remote read failed, using cache");
                self.cache.read(kind, business_id)
            }
        }
    }

    /// Merges the cached and remote record sets (local wins), pushes the
    /// result to the remote store and then caches it.
    ///
    /// A remote failure leaves the cache as it was and is returned.
    pub async fn sync_entity(&self, kind: EntityKind, business_id: &str) -> SyncResult<Vec<Record>> {
        validate_business_id(business_id)?;
        let local = self.cache.read(kind, business_id);
        if kind.is_local_only() {
            return Ok(local);
        }

        let filter = Filter::new().eq(BUSINESS_FIELD, business_id);
        let remote = self
            .remote
            .select(kind.table(), &filter)
            .await
            .map_err(|e| {
                warn!(entity = %kind, business_id, error = %e, "Sync read failed");
                SyncError::remote_read(kind.table(), e)
            })?;

        let merged = merge(&remote, &local);

        self.remote
            .upsert(kind.table(), merged.clone())
            .await
            .map_err(|e| {
                error!(entity = %kind, business_id, error = %e, "Sync upsert failed");
                SyncError::remote_write(kind.table(), e)
            })?;

        self.cache.write(kind, business_id, &merged)?;
        info!(
            entity = %kind,
            business_id,
            local = local.len(),
            remote = remote.len(),
            count = merged.len(),
            "Entity synced"
        );
        Ok(merged)
    }

    // =========================================================================
    // Two-Phase Writes
    // =========================================================================

    /// Applies `mutation` to a working copy of the cached records.
    ///
    /// Validation happens here, before any I/O.
    pub fn stage(
        &self,
        kind: EntityKind,
        business_id: &str,
        mutation: Mutation,
    ) -> SyncResult<StagedMutation> {
        validate_business_id(business_id)?;
        let committed = self.cache.read(kind, business_id);
        let mut pending = committed.clone();

        let find = |key: &str| {
            committed
                .iter()
                .position(|r| matches_key(r, key))
                .ok_or_else(|| SyncError::NotFound {
                    table: kind.table().to_string(),
                    key: key.to_string(),
                })
        };

        let (prior, target) = match &mutation {
            Mutation::Add(record) => {
                let mut record = record.clone();
                record.insert(BUSINESS_FIELD.to_string(), Value::from(business_id));
                let key = identity_key(&record).ok_or_else(|| {
                    SyncError::Validation("A record needs an id or a name".into())
                })?;
                if committed.iter().any(|r| identity_key(r).as_ref() == Some(&key)) {
                    return Err(SyncError::Validation(format!(
                        "{} record '{}' already exists",
                        kind,
                        key.split_once(':').map_or(key.as_str(), |(_, v)| v)
                    )));
                }
                pending.push(record.clone());
                (None, record)
            }
            Mutation::Update { key, patch } => {
                let index = find(key)?;
                let prior = committed[index].clone();
                let mut updated = prior.clone();
                for (field, value) in patch {
                    if field != BUSINESS_FIELD && field != "id" {
                        updated.insert(field.clone(), value.clone());
                    }
                }
                if identity_key(&updated).is_none() {
                    return Err(SyncError::Validation("A record needs an id or a name".into()));
                }
                pending[index] = updated.clone();
                (Some(prior), updated)
            }
            Mutation::Delete { key } => {
                let index = find(key)?;
                let prior = pending.remove(index);
                (Some(prior.clone()), prior)
            }
        };

        Ok(StagedMutation {
            kind,
            business_id: business_id.to_string(),
            mutation,
            committed,
            pending,
            prior,
            target,
        })
    }

    /// Sends a staged mutation to the remote store and, only if that
    /// succeeds, folds the working copy into the cache.
    ///
    /// Returns the record as stored (for deletes, the removed record).
    pub async fn commit(&self, staged: StagedMutation) -> SyncResult<Record> {
        let StagedMutation {
            kind,
            business_id,
            mutation,
            prior,
            target,
            ..
        } = staged;
        let table = kind.table();

        let stored = if kind.is_local_only() {
            target.clone()
        } else {
            let result = match &mutation {
                Mutation::Add(_) => self.remote.insert(table, target.clone()).await,
                Mutation::Update { patch, .. } => {
                    let address = prior.as_ref().unwrap_or(&target);
                    let mut patch = patch.clone();
                    patch.remove(BUSINESS_FIELD);
                    patch.remove("id");
                    self.remote
                        .update(table, patch, &record_filter(&business_id, address))
                        .await
                        .map(|()| target.clone())
                }
                Mutation::Delete { .. } => self
                    .remote
                    .delete(table, &record_filter(&business_id, &target))
                    .await
                    .map(|()| target.clone()),
            };

            match result {
                Ok(stored) => stored,
                Err(e) => {
                    error!(
                        entity = %kind,
                        business_id = %business_id,
                        action = mutation.action(),
                        error = %e,
                        "Remote write failed, discarding staged change"
                    );
                    return Err(SyncError::remote_write(table, e));
                }
            }
        };

        // Other writes may have committed while the remote call was in flight.
        let mut records = self.cache.read(kind, &business_id);
        fold_committed(&mut records, &mutation, prior.as_ref(), &target, &stored);

        self.cache.write(kind, &business_id, &records)?;
        debug!(entity = %kind, business_id = %business_id, action = mutation.action(), "Committed");
        Ok(stored)
    }

    pub async fn add_entity(
        &self,
        kind: EntityKind,
        business_id: &str,
        record: Record,
    ) -> SyncResult<Record> {
        let staged = self.stage(kind, business_id, Mutation::Add(record))?;
        let stored = self.commit(staged).await?;

        self.audit
            .record("add", kind, Value::Object(stored.clone()), business_id);
        info!(entity = %kind, business_id, "Record added");
        Ok(stored)
    }

    pub async fn update_entity(
        &self,
        kind: EntityKind,
        business_id: &str,
        key: &str,
        patch: Record,
    ) -> SyncResult<Record> {
        let staged = self.stage(
            kind,
            business_id,
            Mutation::Update {
                key: key.to_string(),
                patch,
            },
        )?;
        let prior = staged.prior.clone();
        let stored = self.commit(staged).await?;

        if let Some(prior) = prior {
            self.journal().push(UndoAction::Update, prior, kind, business_id);
        }
        self.audit
            .record("update", kind, Value::Object(stored.clone()), business_id);
        info!(entity = %kind, business_id, key, "Record updated");
        Ok(stored)
    }

    pub async fn delete_entity(
        &self,
        kind: EntityKind,
        business_id: &str,
        key: &str,
    ) -> SyncResult<Record> {
        let staged = self.stage(
            kind,
            business_id,
            Mutation::Delete {
                key: key.to_string(),
            },
        )?;
        let removed = self.commit(staged).await?;

        self.journal()
            .push(UndoAction::Delete, removed.clone(), kind, business_id);
        self.audit
            .record("delete", kind, Value::Object(removed.clone()), business_id);
        info!(entity = %kind, business_id, key, "Record deleted");
        Ok(removed)
    }

    // =========================================================================
    // Undo
    // =========================================================================

    /// Reverses the most recent delete or update.
    ///
    /// An empty journal is a no-op returning `Ok(None)`. If the remote write
    /// fails the entry goes back on the stack so the undo can be retried.
    pub async fn undo_last(&self) -> SyncResult<Option<UndoEntry>> {
        let Some(entry) = self.journal().pop() else {
            debug!("Nothing to undo");
            return Ok(None);
        };

        let kind = entry.entity;
        let business_id = entry.business_id.clone();
        let record = entry.prior.clone();

        if !kind.is_local_only() {
            if let Err(e) = self.remote.upsert(kind.table(), vec![record.clone()]).await {
                error!(entity = %kind, business_id = %business_id, error = %e, "Undo failed");
                self.journal().restore(entry);
                return Err(SyncError::remote_write(kind.table(), e));
            }
        }

        let mut records = self.cache.read(kind, &business_id);
        let key = identity_key(&record);
        match records
            .iter_mut()
            .find(|r| key.is_some() && identity_key(r) == key)
        {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.cache.write(kind, &business_id, &records)?;

        let action = match entry.action {
            UndoAction::Delete => "undo_delete",
            UndoAction::Update => "undo_update",
        };
        self.audit
            .record(action, kind, Value::Object(record), &business_id);
        info!(entity = %kind, business_id = %business_id, action, "Undo applied");
        Ok(Some(entry))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
