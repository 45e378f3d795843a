//! # Receipt Book
//!
//! Receipt lifecycle on top of the sync engine.
//!
//! ```text
//!   next_number ──► new_receipt ──► add / edit items ──┬──► save_draft   (device only)
//!                                                      │
//!                                                      └──► finalize     (remote + cache,
//!                                                                         draft removed)
//!   delete_receipt ──► undoable through SyncEngine::undo_last
//! ```
//!
//! Receipts are stored as their camelCase JSON form, so cached and remote rows
//! can be read back into [`Receipt`] and fed to the numbering sequencer as
//! plain records.

use chrono::{DateTime, Utc};
use goreceipt_core::analytics::SalesSummary;
use goreceipt_core::{next_receipt_number, BillDesign, Receipt, Record};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::{Mutation, SyncEngine};
use crate::entity::EntityKind;
use crate::error::{SyncError, SyncResult};
use crate::merge::matches_key;

/// Serializes a receipt into a store record.
pub fn to_record(receipt: &Receipt) -> SyncResult<Record> {
    match serde_json::to_value(receipt)? {
        Value::Object(map) => Ok(map),
        _ => Err(SyncError::Internal("receipt did not serialize to an object".into())),
    }
}

/// Parses stored records into receipts, skipping rows that do not parse.
fn from_records(records: Vec<Record>) -> Vec<Receipt> {
    records
        .into_iter()
        .filter_map(|record| {
            match serde_json::from_value::<Receipt>(Value::Object(record)) {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed receipt record");
                    None
                }
            }
        })
        .collect()
}

pub struct ReceiptBook {
    engine: Arc<SyncEngine>,
    business_id: String,
}

impl ReceiptBook {
    pub fn new(engine: Arc<SyncEngine>, business_id: &str) -> Self {
        ReceiptBook {
            engine,
            business_id: business_id.to_string(),
        }
    }

    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    /// Next receipt number, computed from the receipts and drafts of this
    /// business. Falls back to cached receipts when offline.
    pub async fn next_number(&self) -> String {
        let receipts = self
            .engine
            .load_entity(EntityKind::Receipts, &self.business_id)
            .await;
        let drafts = self
            .engine
            .load_entity(EntityKind::Drafts, &self.business_id)
            .await;
        let number = next_receipt_number(&self.business_id, &receipts, &drafts);
        debug!(business_id = %self.business_id, number = %number, "Next receipt number");
        number
    }

    /// Starts an empty receipt numbered after everything seen so far.
    pub async fn new_receipt(&self, design: &BillDesign, now: DateTime<Utc>) -> SyncResult<Receipt> {
        let number = self.next_number().await;
        Ok(Receipt::new(&self.business_id, &number, design, now)?)
    }

    /// Saves (or overwrites) a draft on this device.
    pub async fn save_draft(&self, receipt: &Receipt) -> SyncResult<Receipt> {
        self.check_owner(receipt)?;
        let mut draft = receipt.clone();
        draft.draft = true;
        draft.recompute();

        let record = to_record(&draft)?;
        let exists = self
            .engine
            .cache()
            .read(EntityKind::Drafts, &self.business_id)
            .iter()
            .any(|r| matches_key(r, &draft.id));

        let mutation = if exists {
            Mutation::Update {
                key: draft.id.clone(),
                patch: record,
            }
        } else {
            Mutation::Add(record)
        };
        let staged = self
            .engine
            .stage(EntityKind::Drafts, &self.business_id, mutation)?;
        self.engine.commit(staged).await?;

        info!(business_id = %self.business_id, receipt = %draft.receipt_number, "Draft saved");
        Ok(draft)
    }

    /// Writes the receipt to the remote store and cache, then drops any
    /// draft with the same id.
    ///
    /// If the remote write fails the draft is kept and the error returned.
    /// Once the receipt is stored, a failure to drop the draft is only
    /// logged: the stale draft can be discarded later.
    pub async fn finalize(&self, receipt: &Receipt) -> SyncResult<Receipt> {
        self.check_owner(receipt)?;
        if receipt.is_empty() {
            return Err(SyncError::Validation(
                "A receipt needs at least one line item".into(),
            ));
        }

        let mut final_receipt = receipt.clone();
        final_receipt.draft = false;
        final_receipt.recompute();

        let stored = self
            .engine
            .add_entity(EntityKind::Receipts, &self.business_id, to_record(&final_receipt)?)
            .await?;

        if let Err(e) = self.discard_draft(&final_receipt.id).await {
            warn!(
                business_id = %self.business_id,
                receipt = %final_receipt.receipt_number,
                error = %e,
                "Receipt stored but its draft could not be removed"
            );
        }
        info!(
            business_id = %self.business_id,
            receipt = %final_receipt.receipt_number,
            total = %final_receipt.total,
            "Receipt finalized"
        );

        from_records(vec![stored])
            .pop()
            .ok_or_else(|| SyncError::MalformedData("stored receipt did not parse".into()))
    }

    /// Removes a draft without recording an undo step. Missing drafts are
    /// ignored.
    pub async fn discard_draft(&self, id: &str) -> SyncResult<()> {
        let exists = self
            .engine
            .cache()
            .read(EntityKind::Drafts, &self.business_id)
            .iter()
            .any(|r| matches_key(r, id));
        if !exists {
            return Ok(());
        }

        let staged = self.engine.stage(
            EntityKind::Drafts,
            &self.business_id,
            Mutation::Delete { key: id.to_string() },
        )?;
        self.engine.commit(staged).await?;
        debug!(business_id = %self.business_id, id, "Draft discarded");
        Ok(())
    }

    /// Deletes a finalized receipt; reversible with `SyncEngine::undo_last`.
    pub async fn delete_receipt(&self, id: &str) -> SyncResult<Receipt> {
        let removed = self
            .engine
            .delete_entity(EntityKind::Receipts, &self.business_id, id)
            .await?;
        from_records(vec![removed])
            .pop()
            .ok_or_else(|| SyncError::MalformedData("deleted receipt did not parse".into()))
    }

    /// Finalized receipts, newest first.
    pub async fn list_receipts(&self) -> Vec<Receipt> {
        let records = self
            .engine
            .load_entity(EntityKind::Receipts, &self.business_id)
            .await;
        let mut receipts = from_records(records);
        receipts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        receipts
    }

    /// Drafts saved on this device, newest first.
    pub async fn list_drafts(&self) -> Vec<Receipt> {
        let records = self
            .engine
            .load_entity(EntityKind::Drafts, &self.business_id)
            .await;
        let mut drafts = from_records(records);
        drafts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        drafts
    }

    pub async fn summary(&self) -> SalesSummary {
        SalesSummary::from_receipts(&self.list_receipts().await)
    }

    fn check_owner(&self, receipt: &Receipt) -> SyncResult<()> {
        if receipt.business_id != self.business_id {
            return Err(SyncError::Validation(format!(
                "Receipt {} belongs to business {}",
                receipt.receipt_number, receipt.business_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryLocalStore, MemoryRemoteStore, RemoteOp};
    use chrono::TimeZone;
    use crate::store::{LocalStore, StoreError, StoreResult};
    use goreceipt_core::{LineItem, Money, TaxRate};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Local store whose draft entries can be made read-only.
    #[derive(Default)]
    struct LockableDrafts {
        inner: MemoryLocalStore,
        locked: AtomicBool,
    }

    impl LocalStore for LockableDrafts {
        fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StoreResult<()> {
            if key.starts_with("drafts_") && self.locked.load(Ordering::Relaxed) {
                return Err(StoreError::Io("drafts are read-only".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StoreResult<()> {
            self.inner.remove(key)
        }
    }

    fn setup() -> (Arc<MemoryRemoteStore>, Arc<SyncEngine>, ReceiptBook) {
        let remote = Arc::new(MemoryRemoteStore::new());
        let engine = Arc::new(SyncEngine::new(
            remote.clone(),
            Arc::new(MemoryLocalStore::new()),
            "dev-1",
            100,
        ));
        let book = ReceiptBook::new(engine.clone(), "B1");
        (remote, engine, book)
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn item(name: &str, price: i64, qty: i64) -> LineItem {
        LineItem::new(name, Money::from_minor(price), qty, TaxRate::from_bps(1800)).unwrap()
    }

    #[tokio::test]
    async fn test_numbers_follow_receipts_and_drafts() {
        let (_remote, _engine, book) = setup();
        let design = BillDesign::standard();

        let mut first = book.new_receipt(&design, at(1, 9)).await.unwrap();
        assert_eq!(first.receipt_number, "GR-B1-1");
        first.add_item(item("Tea", 1000, 2));
        book.finalize(&first).await.unwrap();

        let second = book.new_receipt(&design, at(1, 10)).await.unwrap();
        assert_eq!(second.receipt_number, "GR-B1-2");
        book.save_draft(&second).await.unwrap();

        assert_eq!(book.next_number().await, "GR-B1-3");
    }

    #[tokio::test]
    async fn test_finalize_removes_draft() {
        let (remote, _engine, book) = setup();
        let mut receipt = book.new_receipt(&BillDesign::standard(), at(2, 9)).await.unwrap();
        receipt.add_item(item("Tea", 10000, 2));
        receipt.add_item(item("Biscuit", 5000, 1));
        book.save_draft(&receipt).await.unwrap();
        assert_eq!(book.list_drafts().await.len(), 1);

        let stored = book.finalize(&receipt).await.unwrap();
        assert!(!stored.draft);
        assert_eq!(stored.total.minor(), 29500);
        assert!(book.list_drafts().await.is_empty());
        assert_eq!(remote.table("receipts").await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_finalize_keeps_draft() {
        let (remote, _engine, book) = setup();
        let mut receipt = book.new_receipt(&BillDesign::standard(), at(2, 9)).await.unwrap();
        receipt.add_item(item("Tea", 1000, 1));
        book.save_draft(&receipt).await.unwrap();

        remote.fail(RemoteOp::Insert);
        let err = book.finalize(&receipt).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(book.list_drafts().await.len(), 1);
        assert!(remote.table("receipts").await.is_empty());
    }

    #[tokio::test]
    async fn test_finalize_rejects_empty_and_foreign_receipts() {
        let (remote, _engine, book) = setup();
        let empty = Receipt::new("B1", "GR-B1-1", &BillDesign::standard(), at(3, 9)).unwrap();
        assert!(book.finalize(&empty).await.is_err());

        let mut foreign = Receipt::new("B2", "GR-B2-1", &BillDesign::standard(), at(3, 9)).unwrap();
        foreign.add_item(item("Tea", 1000, 1));
        assert!(book.finalize(&foreign).await.is_err());
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_and_undo_receipt() {
        let (_remote, engine, book) = setup();
        let mut receipt = book.new_receipt(&BillDesign::standard(), at(4, 9)).await.unwrap();
        receipt.add_item(item("Tea", 1000, 1));
        let stored = book.finalize(&receipt).await.unwrap();

        let removed = book.delete_receipt(&stored.id).await.unwrap();
        assert_eq!(removed.receipt_number, stored.receipt_number);
        assert!(book.list_receipts().await.is_empty());

        engine.undo_last().await.unwrap();
        let receipts = book.list_receipts().await;
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].id, stored.id);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_summarized() {
        let (_remote, _engine, book) = setup();
        for (day, price) in [(5, 1000), (6, 2000)] {
            let mut receipt = book.new_receipt(&BillDesign::standard(), at(day, 9)).await.unwrap();
            receipt.add_item(item("Tea", price, 1));
            book.finalize(&receipt).await.unwrap();
        }

        let receipts = book.list_receipts().await;
        assert_eq!(receipts[0].receipt_number, "GR-B1-2");

        let summary = book.summary().await;
        assert_eq!(summary.receipt_count, 2);
        assert_eq!(summary.revenue.minor(), 1180 + 2360);
    }

    #[tokio::test]
    async fn test_finalize_succeeds_when_draft_cleanup_fails() {
        let remote = Arc::new(MemoryRemoteStore::new());
        let local = Arc::new(LockableDrafts::default());
        let engine = Arc::new(SyncEngine::new(remote.clone(), local.clone(), "dev-1", 100));
        let book = ReceiptBook::new(engine, "B1");

        let mut receipt = book.new_receipt(&BillDesign::standard(), at(7, 9)).await.unwrap();
        receipt.add_item(item("Tea", 1000, 1));
        book.save_draft(&receipt).await.unwrap();

        local.locked.store(true, Ordering::Relaxed);
        let stored = book.finalize(&receipt).await.unwrap();
        assert_eq!(stored.id, receipt.id);
        assert_eq!(remote.table("receipts").await.len(), 1);
        assert_eq!(book.list_receipts().await.len(), 1);
        assert_eq!(book.list_drafts().await.len(), 1);

        local.locked.store(false, Ordering::Relaxed);
        book.discard_draft(&receipt.id).await.unwrap();
        assert!(book.list_drafts().await.is_empty());
    }
}
