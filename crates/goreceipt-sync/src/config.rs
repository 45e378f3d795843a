//! # Sync Configuration
//!
//! Configuration for the sync engine and the device cache.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GORECEIPT_DEVICE_ID=abc-123                                        │
//! │     GORECEIPT_BUSINESS_ID=B1                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/goreceipt/goreceipt.toml (Linux)                         │
//! │     ~/Library/Application Support/in.goreceipt.goreceipt/… (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     auto-generated device id, 500 audit entries                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Counter 1"
//!
//! [business]
//! id = "B1"
//! name = "Sharma Stores"
//!
//! [storage]
//! cache_dir = "/var/lib/goreceipt/cache"
//!
//! [audit]
//! max_entries = 500
//! ```

use goreceipt_core::validation::validate_business_id;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Sections
// =============================================================================

/// Configuration for this device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier (UUID v4), stamped on audit entries.
    #[serde(default = "default_device_id")]
    pub id: String,

    /// Human-readable device name.
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_device_name() -> String {
    "GoReceipt Device".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: default_device_id(),
            name: default_device_name(),
        }
    }
}

/// The business this device issues receipts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessConfig {
    #[serde(default = "default_business_id")]
    pub id: String,

    #[serde(default)]
    pub name: String,
}

fn default_business_id() -> String {
    "default-business".to_string()
}

impl Default for BusinessConfig {
    fn default() -> Self {
        BusinessConfig {
            id: default_business_id(),
            name: "My Business".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the file-backed cache; platform data dir when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// The configured cache directory, or `<data dir>/cache`.
    pub fn resolve_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone().or_else(|| {
            project_dirs().map(|dirs| dirs.data_dir().join("cache"))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Entries kept in the audit log; oldest are dropped first.
    #[serde(default = "default_audit_max")]
    pub max_entries: usize,
}

fn default_audit_max() -> usize {
    500
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            max_entries: default_audit_max(),
        }
    }
}

// =============================================================================
// Sync Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub business: BusinessConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("in", "goreceipt", "goreceipt")
}

impl SyncConfig {
    /// Creates a new config with defaults and a generated device ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (goreceipt.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.device.id.trim().is_empty() {
            return Err(SyncError::MissingDeviceId);
        }

        if self.business.id.trim().is_empty() {
            return Err(SyncError::MissingBusinessId);
        }
        validate_business_id(&self.business.id)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;

        if self.audit.max_entries == 0 {
            return Err(SyncError::InvalidConfig(
                "audit.max_entries must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("GORECEIPT_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }

        if let Some(name) = lookup("GORECEIPT_DEVICE_NAME") {
            self.device.name = name;
        }

        if let Some(id) = lookup("GORECEIPT_BUSINESS_ID") {
            debug!(business_id = %id, "Overriding business ID from environment");
            self.business.id = id;
        }

        if let Some(dir) = lookup("GORECEIPT_CACHE_DIR") {
            self.storage.cache_dir = Some(PathBuf::from(dir));
        }

        if let Some(max) = lookup("GORECEIPT_AUDIT_MAX") {
            match max.parse::<usize>() {
                Ok(n) => self.audit.max_entries = n,
                Err(_) => warn!(value = %max, "Ignoring non-numeric GORECEIPT_AUDIT_MAX"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("goreceipt.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    pub fn business_id(&self) -> &str {
        &self.business.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert!(!config.device.id.is_empty());
        assert_eq!(config.business_id(), "default-business");
        assert_eq!(config.audit.max_entries, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();

        config.device.id = String::new();
        assert!(matches!(config.validate(), Err(SyncError::MissingDeviceId)));

        config.device.id = "dev-1".into();
        config.business.id = "  ".into();
        assert!(matches!(config.validate(), Err(SyncError::MissingBusinessId)));

        config.business.id = "has space".into();
        assert!(config.validate().is_err());

        config.business.id = "B1".into();
        config.audit.max_entries = 0;
        assert!(config.validate().is_err());

        config.audit.max_entries = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("GORECEIPT_DEVICE_ID", "dev-9"),
            ("GORECEIPT_BUSINESS_ID", "B7"),
            ("GORECEIPT_CACHE_DIR", "/tmp/goreceipt"),
            ("GORECEIPT_AUDIT_MAX", "nope"),
        ]
        .into_iter()
        .collect();

        let mut config = SyncConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.device_id(), "dev-9");
        assert_eq!(config.business_id(), "B7");
        assert_eq!(config.storage.cache_dir, Some(PathBuf::from("/tmp/goreceipt")));
        assert_eq!(config.audit.max_entries, 500);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SyncConfig = toml::from_str("[business]\nid = \"B1\"\n").unwrap();
        assert_eq!(config.business_id(), "B1");
        assert!(!config.device.id.is_empty());
        assert_eq!(config.audit.max_entries, 500);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("goreceipt-config-{}", Uuid::new_v4()));
        let path = dir.join("goreceipt.toml");

        let mut config = SyncConfig::default();
        config.business.id = "B1".into();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[device]"));
        assert!(contents.contains("[business]"));

        let loaded: SyncConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.business_id(), "B1");
        assert_eq!(loaded.device_id(), config.device_id());

        std::fs::remove_dir_all(dir).ok();
    }
}
