//! # Sales Analytics
//!
//! Summaries over finalized receipts for the dashboard. Drafts are ignored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::money::Money;
use crate::receipt::Receipt;

/// Sales of one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyTotal {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub receipts: usize,
    pub total: Money,
}

/// Sales of one product across receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSales {
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub receipt_count: usize,
    pub revenue: Money,
    pub tax_collected: Money,
    /// Revenue / receipt count, rounded down to the paisa.
    pub average_receipt: Money,
    /// Oldest day first.
    pub by_day: Vec<DailyTotal>,
    /// Best sellers first (quantity, then revenue, then name).
    pub products: Vec<ProductSales>,
}

impl SalesSummary {
    pub fn from_receipts(receipts: &[Receipt]) -> Self {
        let mut summary = SalesSummary::default();
        let mut days: BTreeMap<NaiveDate, DailyTotal> = BTreeMap::new();
        let mut products: HashMap<String, ProductSales> = HashMap::new();

        for receipt in receipts.iter().filter(|r| !r.draft) {
            let totals = receipt.totals();
            summary.receipt_count += 1;
            summary.revenue += totals.total;
            summary.tax_collected += totals.tax_total;

            let day = days.entry(receipt.date).or_insert_with(|| DailyTotal {
                date: receipt.date,
                receipts: 0,
                total: Money::zero(),
            });
            day.receipts += 1;
            day.total += totals.total;

            for item in &receipt.line_items {
                let entry = products
                    .entry(item.name.clone())
                    .or_insert_with(|| ProductSales {
                        name: item.name.clone(),
                        quantity: 0,
                        revenue: Money::zero(),
                    });
                entry.quantity += item.quantity;
                entry.revenue += item.amount(receipt.tax_applied);
            }
        }

        if summary.receipt_count > 0 {
            summary.average_receipt =
                Money::from_minor(summary.revenue.minor() / summary.receipt_count as i64);
        }

        summary.by_day = days.into_values().collect();
        summary.products = products.into_values().collect();
        summary.products.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then(b.revenue.cmp(&a.revenue))
                .then_with(|| a.name.cmp(&b.name))
        });
        summary
    }

    /// The `n` best-selling products.
    pub fn top_products(&self, n: usize) -> &[ProductSales] {
        &self.products[..n.min(self.products.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::BillDesign;
    use crate::receipt::LineItem;
    use crate::types::TaxRate;
    use chrono::{TimeZone, Utc};

    fn receipt(day: u32, items: &[(&str, i64, i64)], draft: bool) -> Receipt {
        let now = Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap();
        let mut receipt = Receipt::new("B1", "GR-B1-1", &BillDesign::standard(), now).unwrap();
        for (name, price, qty) in items {
            receipt.add_item(
                LineItem::new(name, Money::from_minor(*price), *qty, TaxRate::from_bps(1800)).unwrap(),
            );
        }
        receipt.draft = draft;
        receipt
    }

    #[test]
    fn test_summary_excludes_drafts() {
        let receipts = vec![
            receipt(1, &[("Tea", 10000, 2), ("Biscuits", 5000, 1)], false),
            receipt(1, &[("Tea", 10000, 1)], false),
            receipt(2, &[("Salt", 2000, 5)], false),
            receipt(2, &[("Tea", 10000, 50)], true),
        ];
        let summary = SalesSummary::from_receipts(&receipts);

        assert_eq!(summary.receipt_count, 3);
        // 295.00 + 118.00 + 118.00
        assert_eq!(summary.revenue, Money::from_minor(53100));
        assert_eq!(summary.tax_collected, Money::from_minor(8100));
        assert_eq!(summary.average_receipt, Money::from_minor(17700));

        assert_eq!(summary.by_day.len(), 2);
        assert_eq!(summary.by_day[0].receipts, 2);
        assert_eq!(summary.by_day[1].total, Money::from_minor(11800));

        let top = summary.top_products(2);
        assert_eq!(top[0].name, "Salt");
        assert_eq!(top[1].name, "Tea");
        assert_eq!(top[1].quantity, 3);
    }

    #[test]
    fn test_empty_summary() {
        let summary = SalesSummary::from_receipts(&[]);
        assert_eq!(summary, SalesSummary::default());
        assert!(summary.top_products(5).is_empty());
    }
}
