//! # goreceipt-core: Pure Receipt Logic for GoReceipt
//!
//! This crate holds the receipt composition engine: the bill design model,
//! GST totals, receipt numbering, the layout renderer and sales analytics.
//! Every function is pure; nothing here touches the network, the disk or
//! the clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GoReceipt Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend forms                               │   │
//! │  │   Design editor ──► Receipt form ──► Preview ──► Print/Share   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ goreceipt-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐ │   │
//! │  │   │  design  │ │  totals  │ │numbering │ │      layout      │ │   │
//! │  │   │ columns  │ │ subtotal │ │ GR-B1-8  │ │ 7 styles, one    │ │   │
//! │  │   │ elements │ │ GST      │ │          │ │ template         │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO REMOTE STORE • NO CLOCK • PURE FUNCTIONS         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                goreceipt-sync (Sync Layer)                      │   │
//! │  │      local cache, remote store, merge, undo/audit journal      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`design`] - Bill designs, column sets, elements, layouts
//! - [`receipt`] - Line items and receipts with derived totals
//! - [`totals`] - Subtotal / GST / total calculation
//! - [`numbering`] - `GR-<businessId>-<n>` receipt numbers
//! - [`layout`] - Renders a design plus receipt data
//! - [`analytics`] - Sales summaries over finalized receipts
//! - [`money`] - Integer money (paise)
//! - [`types`] - Tax rate, business and customer profiles
//! - [`error`] / [`validation`] - Typed errors and input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use goreceipt_core::money::Money;
//! use goreceipt_core::receipt::LineItem;
//! use goreceipt_core::totals::compute_totals;
//! use goreceipt_core::types::TaxRate;
//!
//! let items = vec![
//!     LineItem::new("Tea", Money::from_minor(10000), 2, TaxRate::from_bps(1800)).unwrap(),
//!     LineItem::new("Biscuits", Money::from_minor(5000), 1, TaxRate::from_bps(1800)).unwrap(),
//! ];
//!
//! let totals = compute_totals(&items, true);
//! assert_eq!(totals.subtotal.minor(), 25000);
//! assert_eq!(totals.tax_total.minor(), 4500);
//! assert_eq!(totals.total.minor(), 29500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod design;
pub mod error;
pub mod layout;
pub mod money;
pub mod numbering;
pub mod receipt;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use design::{BillDesign, Column, ColumnSet, DesignCatalog, Elements, Layout, RecordFormat, Section};
pub use error::{CoreError, CoreResult, ValidationError};
pub use layout::{render, ReceiptContext, RenderedReceipt};
pub use money::Money;
pub use numbering::next_receipt_number;
pub use receipt::{LineItem, LineItemPatch, Receipt};
pub use totals::{compute_totals, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of every human-facing receipt number.
pub const RECEIPT_NUMBER_PREFIX: &str = "GR";

/// Maximum quantity of a single line item.
///
/// Catches typos such as 10000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9999;

/// Maximum unit price in minor units (₹10 crore).
///
/// At the maximum quantity and a 100% tax rate a line still stays far inside
/// `i64`, including the `amount * bps` step of the tax calculation.
pub const MAX_UNIT_PRICE_MINOR: i64 = 10_000_000_000;

/// Maximum length of names (designs, customers, products, line items).
pub const MAX_NAME_LENGTH: usize = 200;
