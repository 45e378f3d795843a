//! # Totals Calculator
//!
//! Derives line amounts, subtotal, GST total and grand total.
//!
//! ## Formula
//! ```text
//!   line subtotal = unit_price × quantity
//!   line tax      = tax_enabled ? round_half_up(line subtotal × bps / 10000) : 0
//!   line amount   = line subtotal + line tax
//!
//!   subtotal  = Σ line subtotal
//!   tax_total = Σ line tax
//!   total     = subtotal + tax_total
//! ```
//!
//! Tax is rounded per line and the totals are sums of the rounded lines, so
//! the amount column of a rendered receipt always adds up to its total.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::receipt::LineItem;
use crate::types::TaxRate;

/// Derived totals of a receipt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
    /// Sum of quantities.
    pub item_count: i64,
}

/// Tax on one line; zero when the design's tax column is off.
pub fn line_tax(unit_price: Money, quantity: i64, rate: TaxRate, tax_enabled: bool) -> Money {
    if !tax_enabled {
        return Money::zero();
    }
    unit_price.multiply_quantity(quantity).calculate_tax(rate)
}

/// Amount of one line as shown in the amount column.
pub fn line_amount(unit_price: Money, quantity: i64, rate: TaxRate, tax_enabled: bool) -> Money {
    unit_price.multiply_quantity(quantity) + line_tax(unit_price, quantity, rate, tax_enabled)
}

/// Computes the totals of a list of line items.
///
/// An empty list yields all-zero totals.
pub fn compute_totals(items: &[LineItem], tax_enabled: bool) -> Totals {
    items.iter().fold(Totals::default(), |mut acc, item| {
        let subtotal = item.line_subtotal();
        let tax = line_tax(item.unit_price, item.quantity, item.tax_rate, tax_enabled);
        acc.subtotal += subtotal;
        acc.tax_total += tax;
        acc.total += subtotal + tax;
        acc.item_count += item.quantity;
        acc
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<LineItem> {
        vec![
            LineItem::new("Tea", Money::from_minor(10000), 2, TaxRate::from_percentage(18.0)).unwrap(),
            LineItem::new("Biscuits", Money::from_minor(5000), 1, TaxRate::from_percentage(18.0))
                .unwrap(),
        ]
    }

    #[test]
    fn test_totals_without_tax_column() {
        let totals = compute_totals(&items(), false);
        assert_eq!(totals.subtotal, Money::from_minor(25000));
        assert_eq!(totals.tax_total, Money::zero());
        assert_eq!(totals.total, Money::from_minor(25000));
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_totals_with_tax_column() {
        let totals = compute_totals(&items(), true);
        assert_eq!(totals.subtotal, Money::from_minor(25000));
        assert_eq!(totals.tax_total, Money::from_minor(4500));
        assert_eq!(totals.total, Money::from_minor(29500));
    }

    #[test]
    fn test_empty_items_yield_zero() {
        assert_eq!(compute_totals(&[], true), Totals::default());
    }

    #[test]
    fn test_total_never_below_subtotal() {
        let mut list = items();
        list.push(LineItem::new("Salt", Money::from_minor(1999), 7, TaxRate::from_bps(500)).unwrap());
        list.push(LineItem::new("Free bag", Money::zero(), 1, TaxRate::from_bps(1200)).unwrap());

        let taxed = compute_totals(&list, true);
        assert!(taxed.total >= taxed.subtotal);

        let untaxed = compute_totals(&list, false);
        assert_eq!(untaxed.total, untaxed.subtotal);
    }

    #[test]
    fn test_line_amounts_sum_to_total() {
        let mut list = items();
        list.push(LineItem::new("Odd", Money::from_minor(333), 3, TaxRate::from_bps(1250)).unwrap());

        let sum: Money = list
            .iter()
            .map(|i| line_amount(i.unit_price, i.quantity, i.tax_rate, true))
            .sum();
        assert_eq!(sum, compute_totals(&list, true).total);
    }
}
