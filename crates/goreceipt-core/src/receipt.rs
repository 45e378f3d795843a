//! # Receipt Model
//!
//! Line items and receipts. Amounts on both are derived: every mutation goes
//! through a method that recomputes them, so a stored receipt never carries
//! totals that disagree with its items.
//!
//! ## Lifecycle
//! ```text
//! Receipt::new ──► add_item / update_item / remove_item ──► apply_design
//!      │                    │ (recompute)                       │ (recompute)
//!      ▼                    ▼                                   ▼
//!   empty, totals 0    line amounts + totals          tax on/off follows design
//!                                                           │
//!                                 ┌─────────────────────────┴──────┐
//!                                 ▼                                ▼
//!                          saved as draft                     finalized
//!                          (local cache only)          (remote + local cache)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::design::BillDesign;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::totals::{compute_totals, line_amount, Totals};
use crate::types::{CustomerInfo, TaxRate};
use crate::validation::{
    validate_business_id, validate_name, validate_price_minor, validate_quantity,
    validate_tax_rate_bps, ValidationResult,
};

// =============================================================================
// Line Item
// =============================================================================

/// One product/quantity/price/tax row of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub tax_rate: TaxRate,
    /// Derived; see [`crate::totals`].
    #[serde(default)]
    pub line_amount: Money,
    /// Values of user-defined columns, keyed by column key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl LineItem {
    /// Creates a validated line item. The amount is computed without tax
    /// until the item is placed on a receipt.
    pub fn new(name: &str, unit_price: Money, quantity: i64, tax_rate: TaxRate) -> ValidationResult<Self> {
        validate_name("item name", name)?;
        validate_price_minor(unit_price.minor())?;
        validate_quantity(quantity)?;
        validate_tax_rate_bps(tax_rate.bps())?;

        let mut item = LineItem {
            name: name.trim().to_string(),
            unit_price,
            quantity,
            tax_rate,
            line_amount: Money::zero(),
            fields: BTreeMap::new(),
        };
        item.recompute(false);
        Ok(item)
    }

    /// Sets an ad-hoc column value.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Value of an ad-hoc column.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Price × quantity, before tax.
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Amount with or without tax, per the design's tax column.
    pub fn amount(&self, tax_enabled: bool) -> Money {
        line_amount(self.unit_price, self.quantity, self.tax_rate, tax_enabled)
    }

    pub fn recompute(&mut self, tax_enabled: bool) {
        self.line_amount = self.amount(tax_enabled);
    }
}

/// A partial edit of a line item. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub tax_rate: Option<TaxRate>,
    /// Merged into the item's ad-hoc fields; an empty value removes the key.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl LineItemPatch {
    fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("item name", name)?;
        }
        if let Some(price) = self.unit_price {
            validate_price_minor(price.minor())?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(rate) = self.tax_rate {
            validate_tax_rate_bps(rate.bps())?;
        }
        Ok(())
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// A receipt or draft. Drafts and finalized receipts share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    /// `<businessId>-<millis>-<8 hex>`; sorts roughly by creation time.
    pub id: String,
    pub business_id: String,
    /// Human-facing serial, `GR-<businessId>-<n>`.
    pub receipt_number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default)]
    pub customer_ref: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
    /// Name of the bill design used to print this receipt.
    #[serde(default)]
    pub design_ref: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub subtotal: Money,
    #[serde(default)]
    pub tax_total: Money,
    #[serde(default)]
    pub total: Money,
    /// Whether the design's tax column was on at the last recomputation.
    #[serde(default)]
    pub tax_applied: bool,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub warranty: Option<String>,
    #[serde(default)]
    pub return_period: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Receipt {
    /// Creates an empty receipt printed with `design`.
    pub fn new(
        business_id: &str,
        receipt_number: &str,
        design: &BillDesign,
        now: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        validate_business_id(business_id)?;
        validate_name("receipt number", receipt_number)?;

        Ok(Receipt {
            id: receipt_id(business_id, now),
            business_id: business_id.to_string(),
            receipt_number: receipt_number.to_string(),
            date: now.date_naive(),
            customer_ref: None,
            customer: None,
            design_ref: Some(design.name.clone()),
            line_items: Vec::new(),
            subtotal: Money::zero(),
            tax_total: Money::zero(),
            total: Money::zero(),
            tax_applied: design.tax_enabled(),
            terms: None,
            warranty: None,
            return_period: None,
            notes: None,
            draft: false,
            created_at: now,
        })
    }

    /// Appends an item and returns its index.
    pub fn add_item(&mut self, item: LineItem) -> usize {
        self.line_items.push(item);
        self.recompute();
        self.line_items.len() - 1
    }

    /// Applies a partial edit to the item at `index`.
    pub fn update_item(&mut self, index: usize, patch: LineItemPatch) -> CoreResult<()> {
        patch.validate()?;
        let len = self.line_items.len();
        let item = self
            .line_items
            .get_mut(index)
            .ok_or(CoreError::LineItemNotFound { index, len })?;

        if let Some(name) = patch.name {
            item.name = name.trim().to_string();
        }
        if let Some(price) = patch.unit_price {
            item.unit_price = price;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(rate) = patch.tax_rate {
            item.tax_rate = rate;
        }
        for (key, value) in patch.fields {
            if value.is_empty() {
                item.fields.remove(&key);
            } else {
                item.fields.insert(key, value);
            }
        }

        self.recompute();
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> CoreResult<LineItem> {
        let len = self.line_items.len();
        if index >= len {
            return Err(CoreError::LineItemNotFound { index, len });
        }
        let item = self.line_items.remove(index);
        self.recompute();
        Ok(item)
    }

    /// Switches the receipt to another design; tax follows its tax column.
    pub fn apply_design(&mut self, design: &BillDesign) {
        self.design_ref = Some(design.name.clone());
        self.tax_applied = design.tax_enabled();
        self.recompute();
    }

    /// Recomputes every line amount and the receipt totals.
    pub fn recompute(&mut self) {
        let tax = self.tax_applied;
        for item in &mut self.line_items {
            item.recompute(tax);
        }
        let totals = compute_totals(&self.line_items, tax);
        self.subtotal = totals.subtotal;
        self.tax_total = totals.tax_total;
        self.total = totals.total;
    }

    pub fn totals(&self) -> Totals {
        compute_totals(&self.line_items, self.tax_applied)
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// Builds a receipt id: `<businessId>-<millis>-<8 hex>`.
pub fn receipt_id(business_id: &str, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", business_id, now.timestamp_millis(), &suffix[..8])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    fn item(price: i64, qty: i64) -> LineItem {
        LineItem::new("Item", Money::from_minor(price), qty, TaxRate::from_bps(1800)).unwrap()
    }

    #[test]
    fn test_price_ceiling() {
        let gst = TaxRate::from_bps(1800);
        assert!(LineItem::new("Gold", Money::from_minor(i64::MAX / 2), 3, gst).is_err());

        let item = LineItem::new(
            "Gold",
            Money::from_minor(crate::MAX_UNIT_PRICE_MINOR),
            crate::MAX_ITEM_QUANTITY,
            TaxRate::from_bps(10000),
        )
        .unwrap();
        let subtotal = crate::MAX_UNIT_PRICE_MINOR * crate::MAX_ITEM_QUANTITY;
        assert_eq!(item.line_subtotal().minor(), subtotal);
        assert_eq!(item.amount(true).minor(), subtotal * 2);

        let mut receipt = Receipt::new("B1", "GR-B1-1", &BillDesign::standard(), now()).unwrap();
        receipt.add_item(item.clone());
        receipt.add_item(item);
        assert_eq!(receipt.total.minor(), subtotal * 4);
    }

    #[test]
    fn test_line_item_validation() {
        assert!(LineItem::new("", Money::from_minor(100), 1, TaxRate::zero()).is_err());
        assert!(LineItem::new("Tea", Money::from_minor(-1), 1, TaxRate::zero()).is_err());
        assert!(LineItem::new("Tea", Money::from_minor(100), 0, TaxRate::zero()).is_err());
        assert!(LineItem::new("Tea", Money::from_minor(100), 1, TaxRate::from_bps(20000)).is_err());
    }

    #[test]
    fn test_new_receipt_is_empty() {
        let receipt = Receipt::new("B1", "GR-B1-1", &BillDesign::standard(), now()).unwrap();
        assert!(receipt.is_empty());
        assert!(receipt.total.is_zero());
        assert!(receipt.tax_applied);
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(receipt.id.starts_with(&format!("B1-{}-", now().timestamp_millis())));
    }

    #[test]
    fn test_item_mutations_recompute_totals() {
        let mut receipt = Receipt::new("B1", "GR-B1-1", &BillDesign::standard(), now()).unwrap();
        receipt.add_item(item(10000, 2));
        receipt.add_item(item(5000, 1));
        assert_eq!(receipt.total, Money::from_minor(29500));
        assert_eq!(receipt.line_items[0].line_amount, Money::from_minor(23600));

        receipt
            .update_item(
                1,
                LineItemPatch {
                    quantity: Some(3),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(receipt.subtotal, Money::from_minor(35000));
        assert_eq!(receipt.tax_total, Money::from_minor(6300));

        receipt.remove_item(0).unwrap();
        assert_eq!(receipt.subtotal, Money::from_minor(15000));
        assert!(receipt.remove_item(5).is_err());
    }

    #[test]
    fn test_update_rejects_invalid_patch_unchanged() {
        let mut receipt = Receipt::new("B1", "GR-B1-1", &BillDesign::standard(), now()).unwrap();
        receipt.add_item(item(10000, 2));
        let before = receipt.clone();

        let bad = LineItemPatch {
            quantity: Some(0),
            ..Default::default()
        };
        assert!(receipt.update_item(0, bad).is_err());
        assert_eq!(receipt, before);
    }

    #[test]
    fn test_apply_design_toggles_tax() {
        let mut design = BillDesign::standard();
        let mut receipt = Receipt::new("B1", "GR-B1-1", &design, now()).unwrap();
        receipt.add_item(item(10000, 2));
        receipt.add_item(item(5000, 1));
        assert_eq!(receipt.total, Money::from_minor(29500));

        design.set_column_enabled("gst", false);
        receipt.apply_design(&design);
        assert!(!receipt.tax_applied);
        assert_eq!(receipt.total, Money::from_minor(25000));
        assert_eq!(receipt.line_items[0].line_amount, Money::from_minor(20000));
    }

    #[test]
    fn test_patch_fields_merge() {
        let mut receipt = Receipt::new("B1", "GR-B1-1", &BillDesign::standard(), now()).unwrap();
        receipt.add_item(item(100, 1).with_field("hsn", "0902").with_field("batch", "A1"));

        let mut fields = BTreeMap::new();
        fields.insert("batch".to_string(), String::new());
        fields.insert("color".to_string(), "green".to_string());
        receipt
            .update_item(
                0,
                LineItemPatch {
                    fields,
                    ..Default::default()
                },
            )
            .unwrap();

        let item = &receipt.line_items[0];
        assert_eq!(item.field("hsn"), Some("0902"));
        assert_eq!(item.field("batch"), None);
        assert_eq!(item.field("color"), Some("green"));
    }

    #[test]
    fn test_receipt_serializes_camel_case() {
        let receipt = Receipt::new("B1", "GR-B1-1", &BillDesign::standard(), now()).unwrap();
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["receiptNumber"], "GR-B1-1");
        assert_eq!(value["businessId"], "B1");
        assert_eq!(value["date"], "2024-03-15");

        let back: Receipt = serde_json::from_value(value).unwrap();
        assert_eq!(back, receipt);
    }
}
