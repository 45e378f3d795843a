//! # Error Types
//!
//! Domain-specific error types for goreceipt-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  goreceipt-core errors (this file)                                     │
//! │  ├── CoreError        - Receipt/design rule violations                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  goreceipt-sync errors (separate crate)                                │
//! │  └── SyncError        - Cache, remote store and journal failures       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → UI message            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation errors are raised before any I/O happens. Nothing in this
//! crate is fatal: callers turn every error into a visible message.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item index does not exist on the receipt.
    #[error("Line item {index} not found (receipt has {len} items)")]
    LineItemNotFound { index: usize, len: usize },

    /// Column key is not part of the design.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// The identity column cannot be disabled, removed or renamed.
    #[error("Column '{0}' is the identity column and cannot be changed")]
    IdentityColumn(String),

    /// Bill design is not in the catalog.
    #[error("Design not found: {0}")]
    DesignNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., non-numeric price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate design name or column key).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Shorthand for a `Required` error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for a `Duplicate` error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        ValidationError::Duplicate {
            field: field.into(),
            value: value.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::LineItemNotFound { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Line item 4 not found (receipt has 2 items)");

        let err = CoreError::IdentityColumn("product".to_string());
        assert_eq!(
            err.to_string(),
            "Column 'product' is the identity column and cannot be changed"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");
        assert_eq!(
            ValidationError::duplicate("design name", "Classic").to_string(),
            "design name 'Classic' already exists"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
