//! # Validation Module
//!
//! Input validation for design and receipt forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend form                                                │
//! │  └── Immediate feedback (empty fields, number inputs)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Rejects bad input before any cache or remote write                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Remote store                                                 │
//! │  └── Constraints of the hosted database                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_NAME_LENGTH, MAX_UNIT_PRICE_MINOR};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (design, customer, product, line item).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use goreceipt_core::validation::validate_name;
///
/// assert!(validate_name("design name", "Festive").is_ok());
/// assert!(validate_name("design name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a business id.
///
/// The id is embedded in receipt numbers (`GR-<businessId>-<n>`), so it must
/// be non-empty and free of whitespace.
pub fn validate_business_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("business id"));
    }

    if id.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "business id".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates a column or field key.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
pub fn validate_column_key(key: &str) -> ValidationResult<()> {
    let key = key.trim();

    if key.is_empty() {
        return Err(ValidationError::required("column key"));
    }

    if key.chars().count() > 64 {
        return Err(ValidationError::TooLong {
            field: "column key".to_string(),
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in minor units. Zero is allowed (free items).
pub fn validate_price_minor(minor: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE_MINOR).contains(&minor) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_MINOR,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Classic").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_business_id() {
        assert!(validate_business_id("B1").is_ok());
        assert!(validate_business_id("shop_42-north").is_ok());
        assert!(validate_business_id("").is_err());
        assert!(validate_business_id("has space").is_err());
    }

    #[test]
    fn test_validate_column_key() {
        assert!(validate_column_key("hsn").is_ok());
        assert!(validate_column_key(" ").is_err());
        assert!(validate_column_key(&"k".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_and_tax() {
        assert!(validate_price_minor(0).is_ok());
        assert!(validate_price_minor(-100).is_err());
        assert!(validate_price_minor(MAX_UNIT_PRICE_MINOR).is_ok());
        assert!(validate_price_minor(MAX_UNIT_PRICE_MINOR + 1).is_err());
        assert!(validate_price_minor(i64::MAX / 2).is_err());
        assert!(validate_tax_rate_bps(2800).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }
}
