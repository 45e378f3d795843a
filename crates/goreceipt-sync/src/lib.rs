//! # goreceipt-sync: Local/Remote Sync for GoReceipt
//!
//! This crate keeps the on-device cache and the hosted record store in step,
//! and builds the receipt lifecycle (numbering, drafts, finalize, undo) on top.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sync Layer Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────┐     ┌──────────────────────────────────┐ │
//! │  │ ReceiptBook              │     │ DesignLibrary                    │ │
//! │  │ next_number, save_draft, │     │ catalog, select, save, remove,   │ │
//! │  │ finalize, delete_receipt │     │ record formats                   │ │
//! │  └────────────┬─────────────┘     └────────────────┬─────────────────┘ │
//! │               └───────────────┬────────────────────┘                   │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                           SyncEngine                              │  │
//! │  │  load_entity (read-through)     sync_entity (merge, local wins)   │  │
//! │  │  add / update / delete: stage ──► remote write ──► commit         │  │
//! │  │  undo_last                       UndoJournal + AuditLog           │  │
//! │  └────────────┬────────────────────────────────────┬─────────────────┘  │
//! │               ▼                                    ▼                    │
//! │  ┌──────────────────────────┐     ┌──────────────────────────────────┐ │
//! │  │ LocalCache               │     │ RemoteStore (async trait)        │ │
//! │  │ <table>_<business> JSON  │     │ select / insert / upsert /       │ │
//! │  │ over a LocalStore        │     │ update / delete                  │ │
//! │  │ (memory or files)        │     │ (MemoryRemoteStore in-process)   │ │
//! │  └──────────────────────────┘     └──────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`engine`] - `SyncEngine`, staged two-phase mutations, undo
//! - [`receipts`] - `ReceiptBook`, the receipt lifecycle
//! - [`designs`] - `DesignLibrary`, saved bill designs and record formats
//! - [`cache`] - typed access to the device cache
//! - [`merge`] - record identity and the local-wins merge
//! - [`journal`] - undo stack and audit log
//! - [`store`] - `RemoteStore` and `LocalStore` traits
//! - [`memory`] / [`file_store`] - store implementations
//! - [`config`] - device, business, storage and audit settings
//! - [`entity`] - synchronized tables and cache keys
//! - [`error`] - sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use goreceipt_sync::{MemoryLocalStore, MemoryRemoteStore, ReceiptBook, SyncConfig, SyncEngine};
//! use std::sync::Arc;
//!
//! let config = SyncConfig::load_or_default(None);
//! let engine = Arc::new(SyncEngine::from_config(
//!     Arc::new(MemoryRemoteStore::new()),
//!     Arc::new(MemoryLocalStore::new()),
//!     &config,
//! ));
//!
//! let book = ReceiptBook::new(engine.clone(), config.business_id());
//! let mut receipt = book.new_receipt(&design, chrono::Utc::now()).await?;
//! receipt.add_item(item);
//! book.finalize(&receipt).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod designs;
pub mod engine;
pub mod entity;
pub mod error;
pub mod file_store;
pub mod journal;
pub mod memory;
pub mod merge;
pub mod receipts;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::LocalCache;
pub use config::SyncConfig;
pub use designs::DesignLibrary;
pub use engine::{Mutation, StagedMutation, SyncEngine};
pub use entity::EntityKind;
pub use error::{SyncError, SyncResult};
pub use file_store::FileLocalStore;
pub use journal::{AuditEntry, AuditLog, UndoAction, UndoEntry, UndoJournal};
pub use memory::{MemoryLocalStore, MemoryRemoteStore, RemoteOp};
pub use merge::merge;
pub use receipts::ReceiptBook;
pub use store::{Filter, LocalStore, RemoteStore, StoreError};
