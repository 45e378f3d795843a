//! # Receipt Numbering
//!
//! Computes the next human-facing receipt number for a business.
//!
//! ```text
//!   receipts: GR-B1-3, GR-B1-7        drafts: GR-B1-5, GR-B2-40, "bogus"
//!               │        │                      │        │         │
//!               3        7                      5     (other     0
//!                                                   business)
//!                                max = 7  ──►  GR-B1-8
//! ```
//!
//! Receipts and drafts share one counter. The pool is filtered to the given
//! business here, not by callers: a record that names another business is
//! skipped, and the pattern itself only matches this business's prefix.
//! Unparsable numbers count as 0.

use regex::Regex;
use std::cmp::Ordering;

use crate::receipt::Receipt;
use crate::types::Record;
use crate::RECEIPT_NUMBER_PREFIX;

/// Anything that may carry a receipt number.
pub trait NumberedRecord {
    fn receipt_number(&self) -> Option<&str>;

    /// The owning business, when the record says.
    fn business_id(&self) -> Option<&str>;
}

impl NumberedRecord for Receipt {
    fn receipt_number(&self) -> Option<&str> {
        Some(&self.receipt_number)
    }

    fn business_id(&self) -> Option<&str> {
        Some(&self.business_id)
    }
}

/// Cached records use the camelCase field names of [`Receipt`].
impl NumberedRecord for Record {
    fn receipt_number(&self) -> Option<&str> {
        self.get("receiptNumber").and_then(|v| v.as_str())
    }

    fn business_id(&self) -> Option<&str> {
        self.get("businessId").and_then(|v| v.as_str())
    }
}

/// Formats a receipt number.
pub fn format_receipt_number(business_id: &str, serial: u64) -> String {
    format!("{}-{}-{}", RECEIPT_NUMBER_PREFIX, business_id, serial)
}

/// Extracts the serial of a number issued to `business_id`.
///
/// Returns `None` for numbers of other businesses, malformed numbers and
/// serials beyond `u64`.
pub fn parse_serial(business_id: &str, receipt_number: &str) -> Option<u64> {
    serial_pattern(business_id)
        .and_then(|re| re.captures(receipt_number.trim()))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn serial_pattern(business_id: &str) -> Option<Regex> {
    let pattern = format!(
        r"^{}-{}-(\d+)$",
        regex::escape(RECEIPT_NUMBER_PREFIX),
        regex::escape(business_id)
    );
    Regex::new(&pattern).ok()
}

/// Serial digits with leading zeros removed (`"007"` -> `"7"`, `"000"` -> `"0"`).
fn canonical_digits(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

/// Orders canonical decimal strings numerically, without a width limit.
fn cmp_decimal(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Adds one to a canonical decimal string.
fn increment_decimal(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    for d in out.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return String::from_utf8_lossy(&out).into_owned();
        }
    }
    out.insert(0, b'1');
    String::from_utf8_lossy(&out).into_owned()
}

/// Next receipt number for `business_id`, one above the highest serial found
/// among its receipts and drafts. An empty pool yields serial 1.
///
/// Serials are compared and incremented as digit strings, so the result is
/// greater than every serial in the pool however long it is.
pub fn next_receipt_number<R, D>(business_id: &str, receipts: &[R], drafts: &[D]) -> String
where
    R: NumberedRecord,
    D: NumberedRecord,
{
    let pattern = serial_pattern(business_id);

    let serial_of = |number: Option<&str>, owner: Option<&str>| -> Option<String> {
        if owner.is_some_and(|id| id != business_id) {
            return None;
        }
        let re = pattern.as_ref()?;
        let caps = re.captures(number?.trim())?;
        caps.get(1).map(|m| canonical_digits(m.as_str()).to_string())
    };

    let max = receipts
        .iter()
        .filter_map(|r| serial_of(r.receipt_number(), r.business_id()))
        .chain(
            drafts
                .iter()
                .filter_map(|d| serial_of(d.receipt_number(), d.business_id())),
        )
        .max_by(|a, b| cmp_decimal(a, b))
        .unwrap_or_else(|| "0".to_string());

    format!(
        "{}-{}-{}",
        RECEIPT_NUMBER_PREFIX,
        business_id,
        increment_decimal(&max)
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn numbered(number: &str) -> Record {
        record(json!({ "businessId": "B1", "receiptNumber": number }))
    }

    #[test]
    fn test_next_number_scans_receipts_and_drafts() {
        let receipts = vec![numbered("GR-B1-3"), numbered("GR-B1-7")];
        let drafts = vec![numbered("GR-B1-5")];
        assert_eq!(next_receipt_number("B1", &receipts, &drafts), "GR-B1-8");
    }

    #[test]
    fn test_empty_pool_starts_at_one() {
        let none: Vec<Record> = Vec::new();
        assert_eq!(next_receipt_number("B1", &none, &none), "GR-B1-1");
    }

    #[test]
    fn test_malformed_numbers_count_as_zero() {
        let receipts = vec![
            numbered("bogus"),
            numbered("GR-B1-"),
            numbered("GR-B1-x9"),
            record(json!({ "businessId": "B1" })),
            record(json!({ "businessId": "B1", "receiptNumber": 12 })),
        ];
        let none: Vec<Record> = Vec::new();
        assert_eq!(next_receipt_number("B1", &receipts, &none), "GR-B1-1");
    }

    #[test]
    fn test_other_businesses_are_ignored() {
        let receipts = vec![
            numbered("GR-B1-2"),
            record(json!({ "businessId": "B2", "receiptNumber": "GR-B2-40" })),
            // Mislabelled row: number of B1 but owned by B10.
            record(json!({ "businessId": "B10", "receiptNumber": "GR-B1-99" })),
            record(json!({ "receiptNumber": "GR-B10-50" })),
        ];
        let none: Vec<Record> = Vec::new();
        assert_eq!(next_receipt_number("B1", &receipts, &none), "GR-B1-3");
    }

    #[test]
    fn test_business_id_is_matched_literally() {
        let receipts = vec![record(json!({ "receiptNumber": "GR-AxB-9" }))];
        let none: Vec<Record> = Vec::new();
        assert_eq!(next_receipt_number("A.B", &receipts, &none), "GR-A.B-1");
        assert_eq!(parse_serial("A.B", "GR-A.B-4"), Some(4));
        assert_eq!(parse_serial("A.B", "GR-AxB-4"), None);
    }

    #[test]
    fn test_result_exceeds_every_serial() {
        let receipts: Vec<Record> = [4u64, 19, 2, 11]
            .iter()
            .map(|n| numbered(&format_receipt_number("B1", *n)))
            .collect();
        let drafts = vec![numbered("GR-B1-20")];
        let next = next_receipt_number("B1", &receipts, &drafts);
        let serial = parse_serial("B1", &next).unwrap();
        assert!(serial > 20);
    }

    #[test]
    fn test_serials_beyond_u64() {
        let none: Vec<Record> = Vec::new();

        let at_max = vec![numbered(&format_receipt_number("B1", u64::MAX))];
        assert_eq!(
            next_receipt_number("B1", &at_max, &none),
            "GR-B1-18446744073709551616"
        );

        let huge = vec![
            numbered("GR-B1-99999999999999999999999"),
            numbered("GR-B1-7"),
        ];
        assert_eq!(
            next_receipt_number("B1", &huge, &none),
            "GR-B1-100000000000000000000000"
        );
        assert_eq!(parse_serial("B1", "GR-B1-99999999999999999999999"), None);
    }

    #[test]
    fn test_leading_zeros_compare_numerically() {
        let receipts = vec![numbered("GR-B1-0009"), numbered("GR-B1-10")];
        let none: Vec<Record> = Vec::new();
        assert_eq!(next_receipt_number("B1", &receipts, &none), "GR-B1-11");
        assert_eq!(increment_decimal("0"), "1");
        assert_eq!(increment_decimal("199"), "200");
    }
}
