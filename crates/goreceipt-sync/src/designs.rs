//! Saved bill designs and record formats of one business.
//!
//! Designs are stored one record per design in `bill_designs`, keyed by
//! name; the catalog rules (unique names, fallback selection) come from
//! [`DesignCatalog`].

use goreceipt_core::{BillDesign, DesignCatalog, Record, RecordFormat};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::engine::SyncEngine;
use crate::entity::EntityKind;
use crate::error::{SyncError, SyncResult};
use crate::merge::identity_key;

fn to_record<T: Serialize>(value: &T) -> SyncResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(SyncError::Internal("value did not serialize to an object".into())),
    }
}

fn parse_all<T: DeserializeOwned>(kind: EntityKind, records: Vec<Record>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value(Value::Object(record)) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(entity = %kind, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

/// Key of the cached record named `name` (case-insensitive): its id once the
/// remote store assigned one, else the name itself.
fn key_for_name(records: &[Record], name: &str) -> Option<String> {
    records
        .iter()
        .find(|r| {
            r.get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name.trim()))
        })
        .and_then(identity_key)
        .and_then(|key| key.split_once(':').map(|(_, v)| v.to_string()))
}

pub struct DesignLibrary {
    engine: Arc<SyncEngine>,
    business_id: String,
}

impl DesignLibrary {
    pub fn new(engine: Arc<SyncEngine>, business_id: &str) -> Self {
        DesignLibrary {
            engine,
            business_id: business_id.to_string(),
        }
    }

    /// All saved designs of the business.
    pub async fn catalog(&self) -> DesignCatalog {
        let records = self
            .engine
            .load_entity(EntityKind::BillDesigns, &self.business_id)
            .await;
        DesignCatalog::from_designs(parse_all(EntityKind::BillDesigns, records))
    }

    /// The design a receipt should print with; see [`DesignCatalog::select`].
    pub async fn select(&self, name: Option<&str>) -> BillDesign {
        self.catalog().await.select(name)
    }

    /// Saves a design, replacing a saved design of the same name.
    pub async fn save(&self, design: &BillDesign) -> SyncResult<BillDesign> {
        let mut catalog = self.catalog().await;
        let record = to_record(design)?;

        match self.key_for(EntityKind::BillDesigns, &design.name) {
            Some(key) => {
                catalog.update(design.clone())?;
                self.engine
                    .update_entity(EntityKind::BillDesigns, &self.business_id, &key, record)
                    .await?;
            }
            None => {
                catalog.add(design.clone())?;
                self.engine
                    .add_entity(EntityKind::BillDesigns, &self.business_id, record)
                    .await?;
            }
        }

        info!(business_id = %self.business_id, design = %design.name, "Design saved");
        Ok(design.clone())
    }

    /// Deletes a design by name (case-insensitive); undoable.
    pub async fn remove(&self, name: &str) -> SyncResult<BillDesign> {
        let mut catalog = self.catalog().await;
        let removed = catalog.remove(name)?;
        let key = self
            .key_for(EntityKind::BillDesigns, &removed.name)
            .ok_or_else(|| SyncError::NotFound {
                table: EntityKind::BillDesigns.table().to_string(),
                key: removed.name.clone(),
            })?;
        self.engine
            .delete_entity(EntityKind::BillDesigns, &self.business_id, &key)
            .await?;
        Ok(removed)
    }

    /// Saved customer and product form formats.
    pub async fn formats(&self) -> Vec<RecordFormat> {
        let records = self
            .engine
            .load_entity(EntityKind::RecordFormats, &self.business_id)
            .await;
        parse_all(EntityKind::RecordFormats, records)
    }

    /// Saves a record format, replacing one with the same name.
    pub async fn save_format(&self, format: &RecordFormat) -> SyncResult<()> {
        let record = to_record(format)?;
        if let Some(key) = self.key_for(EntityKind::RecordFormats, &format.name) {
            self.engine
                .update_entity(EntityKind::RecordFormats, &self.business_id, &key, record)
                .await?;
        } else {
            self.engine
                .add_entity(EntityKind::RecordFormats, &self.business_id, record)
                .await?;
        }
        Ok(())
    }

    fn key_for(&self, kind: EntityKind, name: &str) -> Option<String> {
        key_for_name(&self.engine.cache().read(kind, &self.business_id), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryLocalStore, MemoryRemoteStore};
    use goreceipt_core::{Layout, Section};

    fn library() -> (Arc<SyncEngine>, DesignLibrary) {
        let engine = Arc::new(SyncEngine::new(
            Arc::new(MemoryRemoteStore::new()),
            Arc::new(MemoryLocalStore::new()),
            "dev-1",
            100,
        ));
        (engine.clone(), DesignLibrary::new(engine, "B1"))
    }

    #[tokio::test]
    async fn test_save_and_select() {
        let (_engine, library) = library();
        assert_eq!(library.select(Some("Shop")).await.name, BillDesign::DEFAULT_NAME);

        let mut design = BillDesign::standard().with_layout(Layout::Thermal);
        design.name = "Shop".into();
        library.save(&design).await.unwrap();

        let selected = library.select(Some("shop")).await;
        assert_eq!(selected.layout, Layout::Thermal);
        assert_eq!(library.select(Some("missing")).await.name, "Shop");
    }

    #[tokio::test]
    async fn test_save_replaces_same_name() {
        let (_engine, library) = library();
        let mut design = BillDesign::standard();
        design.name = "Shop".into();
        library.save(&design).await.unwrap();

        design.toggle_element(Section::QrCode);
        library.save(&design).await.unwrap();

        let catalog = library.catalog().await;
        assert_eq!(catalog.designs().len(), 1);
        assert!(catalog.designs()[0].elements.qr_code);
    }

    #[tokio::test]
    async fn test_remove_is_undoable() {
        let (engine, library) = library();
        let mut design = BillDesign::standard();
        design.name = "Shop".into();
        library.save(&design).await.unwrap();

        library.remove("SHOP").await.unwrap();
        assert!(library.catalog().await.designs().is_empty());
        assert!(library.remove("Shop").await.is_err());

        engine.undo_last().await.unwrap();
        assert_eq!(library.catalog().await.designs().len(), 1);
    }

    #[tokio::test]
    async fn test_record_formats() {
        let (_engine, library) = library();
        let format = RecordFormat::new("customers", vec![("name", true), ("phone", true)]).unwrap();
        library.save_format(&format).await.unwrap();

        let mut format = format;
        format.fields.set_enabled("phone", false);
        library.save_format(&format).await.unwrap();

        let formats = library.formats().await;
        assert_eq!(formats.len(), 1);
        assert!(!formats[0].fields.is_enabled("phone"));
    }
}
