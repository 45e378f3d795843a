//! Synchronized tables and their cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SyncError;

/// Field that scopes every record to a business.
pub const BUSINESS_FIELD: &str = "businessId";

/// A synchronized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Customers,
    Products,
    Receipts,
    /// Kept on this device only.
    Drafts,
    BillDesigns,
    RecordFormats,
    BusinessProfiles,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Customers,
        EntityKind::Products,
        EntityKind::Receipts,
        EntityKind::Drafts,
        EntityKind::BillDesigns,
        EntityKind::RecordFormats,
        EntityKind::BusinessProfiles,
    ];

    /// Remote table name, also the cache key prefix.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Customers => "customers",
            EntityKind::Products => "products",
            EntityKind::Receipts => "receipts",
            EntityKind::Drafts => "drafts",
            EntityKind::BillDesigns => "bill_designs",
            EntityKind::RecordFormats => "record_formats",
            EntityKind::BusinessProfiles => "business_profiles",
        }
    }

    /// Whether the remote store is never consulted for this table.
    pub fn is_local_only(&self) -> bool {
        matches!(self, EntityKind::Drafts)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for EntityKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.table() == s.trim())
            .ok_or_else(|| SyncError::Validation(format!("Unknown entity type: '{}'", s)))
    }
}

/// Cache key of a table for one business: `<table>_<businessId>`.
pub fn cache_key(kind: EntityKind, business_id: &str) -> String {
    format!("{}_{}", kind.table(), business_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key(EntityKind::Customers, "B1"), "customers_B1");
        assert_eq!(cache_key(EntityKind::BillDesigns, "B1"), "bill_designs_B1");
    }

    #[test]
    fn test_parse_round_trips_table_names() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.table().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("invoices".parse::<EntityKind>().is_err());
        assert!(EntityKind::Drafts.is_local_only());
        assert!(!EntityKind::Receipts.is_local_only());
    }
}
