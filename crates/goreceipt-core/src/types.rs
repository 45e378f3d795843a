//! # Domain Types
//!
//! Small value types shared by the design model, the renderer and the
//! receipt model.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ BusinessProfile │   │  CustomerInfo   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  id, name       │   │  name, phone    │       │
//! │  │  1800 = 18%     │   │  address, gstin │   │  email, address │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Record = JSON object (customer/product rows with user-defined fields) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A free-form record as stored in the local cache and the remote store.
///
/// Customers and products have user-defined field sets, so they are kept as
/// JSON objects rather than fixed structs.
pub type Record = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax (GST) rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage as typed on a form (`18`, `2.5`).
    ///
    /// Negative and non-finite inputs collapse to zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return TaxRate(0);
        }
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Formats the rate for a receipt column: `18%`, `2.5%`.
    pub fn label(&self) -> String {
        if self.0 % 100 == 0 {
            format!("{}%", self.0 / 100)
        } else if self.0 % 10 == 0 {
            format!("{}.{}%", self.0 / 100, (self.0 % 100) / 10)
        } else {
            format!("{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Business Profile
// =============================================================================

/// The registered business printed in the receipt header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BusinessProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// GST identification number.
    #[serde(default)]
    pub gstin: Option<String>,
    /// Logo image as a URL or data URI.
    #[serde(default)]
    pub logo: Option<String>,
}

impl BusinessProfile {
    /// Lines of the business-info block, skipping empty fields.
    pub fn info_lines(&self) -> Vec<String> {
        let mut lines = vec![self.name.clone()];
        if let Some(address) = non_empty(&self.address) {
            lines.push(address.to_string());
        }
        if let Some(phone) = non_empty(&self.phone) {
            lines.push(format!("Ph: {}", phone));
        }
        if let Some(email) = non_empty(&self.email) {
            lines.push(email.to_string());
        }
        if let Some(gstin) = non_empty(&self.gstin) {
            lines.push(format!("GSTIN: {}", gstin));
        }
        lines
    }
}

// =============================================================================
// Customer Info
// =============================================================================

/// Customer details printed in the customer-info block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CustomerInfo {
    /// Builds customer info from a free-form customer record.
    ///
    /// Returns `None` when the record has no name.
    pub fn from_record(record: &Record) -> Option<Self> {
        let text = |key: &str| {
            record
                .get(key)
                .map(value_to_text)
                .filter(|s| !s.trim().is_empty())
        };

        Some(CustomerInfo {
            name: text("name")?,
            phone: text("phone"),
            email: text("email"),
            address: text("address"),
        })
    }

    /// Lines of the customer-info block, skipping empty fields.
    pub fn info_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Bill to: {}", self.name)];
        if let Some(phone) = non_empty(&self.phone) {
            lines.push(format!("Ph: {}", phone));
        }
        if let Some(email) = non_empty(&self.email) {
            lines.push(email.to_string());
        }
        if let Some(address) = non_empty(&self.address) {
            lines.push(address.to_string());
        }
        lines
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Renders a JSON value the way a form field would show it.
pub fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(18.0).bps(), 1800);
        assert_eq!(TaxRate::from_percentage(2.5).bps(), 250);
        assert_eq!(TaxRate::from_percentage(-3.0).bps(), 0);
        assert_eq!(TaxRate::from_percentage(f64::NAN).bps(), 0);
        assert!((TaxRate::from_bps(1800).percentage() - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_label() {
        assert_eq!(TaxRate::from_bps(1800).label(), "18%");
        assert_eq!(TaxRate::from_bps(250).label(), "2.5%");
        assert_eq!(TaxRate::from_bps(1825).label(), "18.25%");
        assert_eq!(TaxRate::zero().label(), "0%");
    }

    #[test]
    fn test_business_info_lines_skip_empty() {
        let business = BusinessProfile {
            id: "B1".into(),
            name: "Sharma Stores".into(),
            address: Some("  ".into()),
            phone: Some("98100 00000".into()),
            gstin: Some("07ABCDE1234F1Z5".into()),
            ..Default::default()
        };
        assert_eq!(
            business.info_lines(),
            vec![
                "Sharma Stores".to_string(),
                "Ph: 98100 00000".to_string(),
                "GSTIN: 07ABCDE1234F1Z5".to_string(),
            ]
        );
    }

    #[test]
    fn test_customer_from_record() {
        let record = json!({"id": 1, "name": "Asha", "phone": 9876543210u64})
            .as_object()
            .cloned()
            .unwrap();
        let customer = CustomerInfo::from_record(&record).unwrap();
        assert_eq!(customer.name, "Asha");
        assert_eq!(customer.phone.as_deref(), Some("9876543210"));

        let nameless = json!({"id": 2}).as_object().cloned().unwrap();
        assert!(CustomerInfo::from_record(&nameless).is_none());
    }
}
