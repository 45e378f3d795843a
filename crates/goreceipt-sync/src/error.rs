//! # Sync Error Types
//!
//! Error types for cache, remote store and journal operations.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Validation    │  │  Remote Write   │  │  Remote Read            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  no name/id     │  │  insert/update/ │  │  select failed; callers │ │
//! │  │  bad line item  │  │  delete refused │  │  fall back to the cache │ │
//! │  │  → shown to the │  │  → cache left   │  │  → logged, not shown    │ │
//! │  │    user         │  │    untouched    │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │ Malformed Data  │  │  Configuration  │  │      Internal           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  bad cached JSON│  │  empty ids      │  │  local store failure    │ │
//! │  │  → read as empty│  │  bad TOML       │  │  serialization          │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is fatal to the process. Validation and remote-write errors
//! reach the user as messages; the others degrade to cached data.

use goreceipt_core::{CoreError, ValidationError};
use thiserror::Error;

use crate::store::StoreError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Input rejected before any I/O.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The record to update or delete is not in the cache.
    #[error("{table} record '{key}' not found")]
    NotFound { table: String, key: String },

    // =========================================================================
    // Remote Store Errors
    // =========================================================================
    /// Remote fetch failed.
    #[error("Could not load {table} from the server: {message}")]
    RemoteRead { table: String, message: String },

    /// Remote insert/upsert/update/delete failed.
    #[error("Could not save {table} to the server: {message}")]
    RemoteWrite { table: String, message: String },

    // =========================================================================
    // Data Errors
    // =========================================================================
    /// Cached or remote data could not be parsed.
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// Failed to serialize a record.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing device ID.
    #[error("Device ID not configured. Run initial setup first.")]
    MissingDeviceId,

    /// Missing business ID.
    #[error("Business ID not configured. Register a business first.")]
    MissingBusinessId,

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Device-local store failed.
    #[error("Local storage error: {0}")]
    LocalStore(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    pub fn remote_read(table: &str, err: StoreError) -> Self {
        SyncError::RemoteRead {
            table: table.to_string(),
            message: err.to_string(),
        }
    }

    pub fn remote_write(table: &str, err: StoreError) -> Self {
        SyncError::RemoteWrite {
            table: table.to_string(),
            message: err.to_string(),
        }
    }

    /// Returns true if re-invoking the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteRead { .. } | SyncError::RemoteWrite { .. } | SyncError::LocalStore(_)
        )
    }

    /// Returns true if the error should be shown to the user rather than
    /// only logged.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            SyncError::Validation(_)
                | SyncError::NotFound { .. }
                | SyncError::RemoteWrite { .. }
                | SyncError::MissingBusinessId
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingDeviceId
                | SyncError::MissingBusinessId
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for SyncError {
    fn from(err: CoreError) -> Self {
        SyncError::Validation(err.to_string())
    }
}

impl From<ValidationError> for SyncError {
    fn from(err: ValidationError) -> Self {
        SyncError::Validation(err.to_string())
    }
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::LocalStore(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let write = SyncError::remote_write("customers", StoreError::Unavailable("offline".into()));
        assert!(write.is_retryable());
        assert!(write.is_user_visible());

        let read = SyncError::remote_read("customers", StoreError::Unavailable("offline".into()));
        assert!(read.is_retryable());
        assert!(!read.is_user_visible());

        let invalid = SyncError::Validation("name is required".into());
        assert!(!invalid.is_retryable());
        assert!(invalid.is_user_visible());

        assert!(SyncError::MissingDeviceId.is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::remote_write("receipts", StoreError::Rejected("duplicate key".into()));
        assert_eq!(
            err.to_string(),
            "Could not save receipts to the server: Rejected by store: duplicate key"
        );
    }

    #[test]
    fn test_core_errors_become_validation() {
        let err: SyncError = ValidationError::required("name").into();
        assert!(matches!(err, SyncError::Validation(ref m) if m == "name is required"));

        let err: SyncError = CoreError::DesignNotFound("Festive".into()).into();
        assert!(matches!(err, SyncError::Validation(_)));
    }
}
