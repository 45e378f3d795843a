//! # Design Model
//!
//! A bill design describes what a receipt looks like: which table columns
//! are shown and in what order, which optional sections are printed, and
//! the presentation attributes (font, color, layout variant).
//!
//! ## Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BillDesign "Festive"                                                   │
//! │                                                                         │
//! │  columns (ColumnSet, order is significant)                             │
//! │    serial ✓ │ product ✓ (identity) │ quantity ✓ │ price ✓ │ gst ✗ │ …  │
//! │                                                                         │
//! │  elements (Elements)                                                   │
//! │    logo ✓  businessInfo ✓  customerInfo ✓  table ✓  totals ✓  qrCode ✗ │
//! │                                                                         │
//! │  font "Inter"   color "#1f2937"   layout Modern                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The column list is a single ordered `Vec<(key, enabled)>`, so the key
//! order and the enabled flags cannot drift apart when a column is added,
//! removed, renamed or moved.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{validate_column_key, validate_name, ValidationResult};

// =============================================================================
// Column Keys
// =============================================================================

/// Row number column.
pub const COL_SERIAL: &str = "serial";
/// Product name column; the identity column of bill designs.
pub const COL_PRODUCT: &str = "product";
/// Quantity column.
pub const COL_QUANTITY: &str = "quantity";
/// Unit price column.
pub const COL_PRICE: &str = "price";
/// GST rate column. Enabling it turns on tax in every amount.
pub const COL_GST: &str = "gst";
/// Line amount column.
pub const COL_AMOUNT: &str = "amount";
/// Discount column, filled from the line item's `discount` field.
pub const COL_DISCOUNT: &str = "discount";

/// Column keys that switch tax on when enabled.
pub const TAX_COLUMN_KEYS: &[&str] = &[COL_GST, "tax"];

/// Identity field of customer and product record formats.
pub const FIELD_NAME: &str = "name";

// =============================================================================
// Column Set
// =============================================================================

/// One configurable column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Column {
    pub key: String,
    pub enabled: bool,
}

/// Ordered, user-editable list of columns with one protected identity key.
///
/// ## Invariants
/// - Keys are unique.
/// - The identity key is always present and always enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ColumnSet {
    identity: String,
    columns: Vec<Column>,
}

impl ColumnSet {
    /// Creates a column set.
    ///
    /// The identity key is forced on; if it is missing from `columns` it is
    /// inserted first. Duplicate keys are rejected.
    pub fn new<K, I>(identity: &str, columns: I) -> ValidationResult<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
    {
        let identity = identity.trim();
        validate_column_key(identity)?;

        let mut set = ColumnSet {
            identity: identity.to_string(),
            columns: Vec::new(),
        };

        for (key, enabled) in columns {
            let key: String = key.into();
            let key = key.trim().to_string();
            validate_column_key(&key)?;
            if set.contains(&key) {
                return Err(ValidationError::duplicate("column", key));
            }
            set.columns.push(Column { key, enabled });
        }

        set.enforce_identity();
        Ok(set)
    }

    /// Restores the identity invariant (present and enabled).
    fn enforce_identity(&mut self) {
        match self.columns.iter_mut().find(|c| c.key == self.identity) {
            Some(column) => column.enabled = true,
            None => self.columns.insert(
                0,
                Column {
                    key: self.identity.clone(),
                    enabled: true,
                },
            ),
        }
    }

    /// The protected identity key.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// All columns in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// All keys in display order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    /// Enabled keys in display order.
    pub fn enabled_keys(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.enabled)
            .map(|c| c.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Index of `key` in display order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key == key)
    }

    /// Whether `key` exists and is enabled.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c.key == key && c.enabled)
    }

    /// Enables or disables a column.
    ///
    /// Returns `false` without changing anything when the key is unknown or
    /// when asked to disable the identity column.
    pub fn set_enabled(&mut self, key: &str, enabled: bool) -> bool {
        if key == self.identity && !enabled {
            return false;
        }
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(column) => {
                column.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Appends a new column at the end.
    pub fn add(&mut self, key: &str, enabled: bool) -> CoreResult<()> {
        let key = key.trim();
        validate_column_key(key)?;
        if self.contains(key) {
            return Err(ValidationError::duplicate("column", key).into());
        }
        self.columns.push(Column {
            key: key.to_string(),
            enabled,
        });
        Ok(())
    }

    /// Removes a column. The identity column cannot be removed.
    pub fn remove(&mut self, key: &str) -> CoreResult<Column> {
        if key == self.identity {
            return Err(CoreError::IdentityColumn(key.to_string()));
        }
        let index = self
            .position(key)
            .ok_or_else(|| CoreError::ColumnNotFound(key.to_string()))?;
        Ok(self.columns.remove(index))
    }

    /// Renames a column in place, keeping its position and enabled flag.
    ///
    /// Fails without changes when the new key is empty or already present.
    pub fn rename(&mut self, old_key: &str, new_key: &str) -> CoreResult<()> {
        let new_key = new_key.trim();
        validate_column_key(new_key)?;
        if old_key == self.identity {
            return Err(CoreError::IdentityColumn(old_key.to_string()));
        }
        if self.contains(new_key) {
            return Err(ValidationError::duplicate("column", new_key).into());
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.key == old_key)
            .ok_or_else(|| CoreError::ColumnNotFound(old_key.to_string()))?;
        column.key = new_key.to_string();
        Ok(())
    }

    /// Moves the column at `from` to index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> CoreResult<()> {
        let len = self.columns.len();
        if from >= len || to >= len {
            return Err(ValidationError::OutOfRange {
                field: "column index".to_string(),
                min: 0,
                max: len.saturating_sub(1) as i64,
            }
            .into());
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        Ok(())
    }
}

/// Wire shape of a column set; normalized on the way in.
#[derive(Deserialize)]
struct ColumnSetRepr {
    identity: String,
    #[serde(default)]
    columns: Vec<Column>,
}

impl<'de> Deserialize<'de> for ColumnSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = ColumnSetRepr::deserialize(deserializer)?;
        let mut set = ColumnSet {
            identity: repr.identity.trim().to_string(),
            columns: Vec::with_capacity(repr.columns.len()),
        };
        if set.identity.is_empty() {
            return Err(serde::de::Error::custom("column set identity is empty"));
        }
        // Stored data may predate validation; keep the first of any duplicates.
        for column in repr.columns {
            if !column.key.trim().is_empty() && !set.contains(&column.key) {
                set.columns.push(column);
            }
        }
        set.enforce_identity();
        Ok(set)
    }
}

// =============================================================================
// Sections (Elements)
// =============================================================================

/// An optional receipt section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Section {
    Logo,
    BusinessInfo,
    CustomerInfo,
    Table,
    Totals,
    QrCode,
    TermsAndConditions,
    Warranty,
    ReturnPeriod,
    Signature,
    Notes,
}

impl Section {
    /// Every section, in classic print order.
    pub const ALL: [Section; 11] = [
        Section::Logo,
        Section::BusinessInfo,
        Section::CustomerInfo,
        Section::Table,
        Section::Totals,
        Section::QrCode,
        Section::TermsAndConditions,
        Section::Warranty,
        Section::ReturnPeriod,
        Section::Signature,
        Section::Notes,
    ];

    /// The element key used in stored designs.
    pub fn key(&self) -> &'static str {
        match self {
            Section::Logo => "logo",
            Section::BusinessInfo => "businessInfo",
            Section::CustomerInfo => "customerInfo",
            Section::Table => "table",
            Section::Totals => "totals",
            Section::QrCode => "qrCode",
            Section::TermsAndConditions => "termsAndConditions",
            Section::Warranty => "warranty",
            Section::ReturnPeriod => "returnPeriod",
            Section::Signature => "signature",
            Section::Notes => "notes",
        }
    }
}

/// Which optional sections a design prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct Elements {
    pub logo: bool,
    pub business_info: bool,
    pub customer_info: bool,
    pub table: bool,
    pub totals: bool,
    pub qr_code: bool,
    pub terms_and_conditions: bool,
    pub warranty: bool,
    pub return_period: bool,
    pub signature: bool,
    pub notes: bool,
}

impl Default for Elements {
    fn default() -> Self {
        Elements {
            logo: true,
            business_info: true,
            customer_info: true,
            table: true,
            totals: true,
            qr_code: false,
            terms_and_conditions: true,
            warranty: false,
            return_period: false,
            signature: true,
            notes: true,
        }
    }
}

impl Elements {
    /// All sections switched off.
    pub fn none() -> Self {
        Elements {
            logo: false,
            business_info: false,
            customer_info: false,
            table: false,
            totals: false,
            qr_code: false,
            terms_and_conditions: false,
            warranty: false,
            return_period: false,
            signature: false,
            notes: false,
        }
    }

    /// All sections switched on.
    pub fn all() -> Self {
        let mut elements = Self::none();
        for section in Section::ALL {
            elements.set(section, true);
        }
        elements
    }

    fn slot(&mut self, section: Section) -> &mut bool {
        match section {
            Section::Logo => &mut self.logo,
            Section::BusinessInfo => &mut self.business_info,
            Section::CustomerInfo => &mut self.customer_info,
            Section::Table => &mut self.table,
            Section::Totals => &mut self.totals,
            Section::QrCode => &mut self.qr_code,
            Section::TermsAndConditions => &mut self.terms_and_conditions,
            Section::Warranty => &mut self.warranty,
            Section::ReturnPeriod => &mut self.return_period,
            Section::Signature => &mut self.signature,
            Section::Notes => &mut self.notes,
        }
    }

    pub fn is_enabled(&self, section: Section) -> bool {
        let mut copy = *self;
        *copy.slot(section)
    }

    pub fn set(&mut self, section: Section, enabled: bool) {
        *self.slot(section) = enabled;
    }

    /// Flips a section and returns its new state.
    pub fn toggle(&mut self, section: Section) -> bool {
        let slot = self.slot(section);
        *slot = !*slot;
        *slot
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Named visual variant of a receipt.
///
/// Unknown or missing values deserialize to `Classic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Layout {
    #[default]
    Classic,
    Modern,
    Compact,
    Elegant,
    Bold,
    Minimal,
    Thermal,
}

impl Layout {
    pub const ALL: [Layout; 7] = [
        Layout::Classic,
        Layout::Modern,
        Layout::Compact,
        Layout::Elegant,
        Layout::Bold,
        Layout::Minimal,
        Layout::Thermal,
    ];

    /// Case-insensitive parse; anything unrecognized is `Classic`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "modern" => Layout::Modern,
            "compact" => Layout::Compact,
            "elegant" => Layout::Elegant,
            "bold" => Layout::Bold,
            "minimal" => Layout::Minimal,
            "thermal" => Layout::Thermal,
            _ => Layout::Classic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Classic => "classic",
            Layout::Modern => "modern",
            Layout::Compact => "compact",
            Layout::Elegant => "elegant",
            Layout::Bold => "bold",
            Layout::Minimal => "minimal",
            Layout::Thermal => "thermal",
        }
    }

    /// Every accepted layout name, comma separated, for help text.
    pub fn names() -> String {
        let names: Vec<&str> = Layout::ALL.iter().map(Layout::as_str).collect();
        names.join(", ")
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Layout::parse(&s)).unwrap_or_default())
    }
}

// =============================================================================
// Bill Design
// =============================================================================

/// A saved receipt design, selected by name when a receipt is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillDesign {
    pub name: String,
    pub columns: ColumnSet,
    #[serde(default)]
    pub elements: Elements,
    #[serde(default)]
    pub font: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub layout: Layout,
}

impl BillDesign {
    /// Name of the built-in design used when nothing else is selected.
    pub const DEFAULT_NAME: &'static str = "Default";

    /// Creates a design. Rejects an empty name; the product column is
    /// always present and enabled.
    pub fn new<K, I>(name: &str, columns: I, elements: Elements) -> ValidationResult<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
    {
        validate_name("design name", name)?;
        Ok(BillDesign {
            name: name.trim().to_string(),
            columns: ColumnSet::new(COL_PRODUCT, columns)?,
            elements,
            font: String::new(),
            color: String::new(),
            layout: Layout::Classic,
        })
    }

    /// The standard column list offered by the design editor.
    pub fn default_columns() -> Vec<(&'static str, bool)> {
        vec![
            (COL_SERIAL, true),
            (COL_PRODUCT, true),
            (COL_QUANTITY, true),
            (COL_PRICE, true),
            (COL_GST, true),
            (COL_AMOUNT, true),
            (COL_DISCOUNT, false),
        ]
    }

    /// The built-in classic design.
    pub fn standard() -> Self {
        BillDesign {
            name: Self::DEFAULT_NAME.to_string(),
            columns: ColumnSet {
                identity: COL_PRODUCT.to_string(),
                columns: Self::default_columns()
                    .into_iter()
                    .map(|(key, enabled)| Column {
                        key: key.to_string(),
                        enabled,
                    })
                    .collect(),
            },
            elements: Elements::default(),
            font: String::new(),
            color: String::new(),
            layout: Layout::Classic,
        }
    }

    /// Builder-style layout setter.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Enables or disables a column; disabling `product` is a no-op.
    pub fn set_column_enabled(&mut self, key: &str, enabled: bool) -> bool {
        self.columns.set_enabled(key, enabled)
    }

    /// Flips an optional section and returns its new state.
    pub fn toggle_element(&mut self, section: Section) -> bool {
        self.elements.toggle(section)
    }

    /// Whether a tax column is enabled, which switches GST on in every amount.
    pub fn tax_enabled(&self) -> bool {
        TAX_COLUMN_KEYS.iter().any(|key| self.columns.is_enabled(key))
    }
}

impl Default for BillDesign {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Record Format
// =============================================================================

/// The user-selected field list of a customer or product form.
///
/// `name` is the identity field and cannot be removed or disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecordFormat {
    pub name: String,
    pub fields: ColumnSet,
}

impl RecordFormat {
    pub fn new<K, I>(name: &str, fields: I) -> ValidationResult<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
    {
        validate_name("format name", name)?;
        Ok(RecordFormat {
            name: name.trim().to_string(),
            fields: ColumnSet::new(FIELD_NAME, fields)?,
        })
    }

    /// Keeps only the enabled fields of a record (plus `id`, if present).
    pub fn project(&self, record: &crate::types::Record) -> crate::types::Record {
        let mut out = crate::types::Record::new();
        if let Some(id) = record.get("id") {
            out.insert("id".to_string(), id.clone());
        }
        for key in self.fields.enabled_keys() {
            if let Some(value) = record.get(key) {
                out.insert(key.to_string(), value.clone());
            }
        }
        out
    }
}

// =============================================================================
// Design Catalog
// =============================================================================

/// The designs saved by one business. Names are unique, case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignCatalog {
    designs: Vec<BillDesign>,
}

impl DesignCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from stored designs, keeping the first of any
    /// duplicate names.
    pub fn from_designs(designs: impl IntoIterator<Item = BillDesign>) -> Self {
        let mut catalog = Self::new();
        for design in designs {
            if catalog.get(&design.name).is_none() {
                catalog.designs.push(design);
            }
        }
        catalog
    }

    pub fn designs(&self) -> &[BillDesign] {
        &self.designs
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.designs.iter().map(|d| d.name.as_str())
    }

    /// Adds a design; fails if the name is already taken.
    pub fn add(&mut self, design: BillDesign) -> CoreResult<()> {
        validate_name("design name", &design.name)?;
        if self.get(&design.name).is_some() {
            return Err(ValidationError::duplicate("design name", design.name).into());
        }
        self.designs.push(design);
        Ok(())
    }

    /// Replaces the design with the same name.
    pub fn update(&mut self, design: BillDesign) -> CoreResult<()> {
        let slot = self
            .designs
            .iter_mut()
            .find(|d| d.name.eq_ignore_ascii_case(&design.name))
            .ok_or_else(|| CoreError::DesignNotFound(design.name.clone()))?;
        *slot = design;
        Ok(())
    }

    /// Removes a design by name.
    pub fn remove(&mut self, name: &str) -> CoreResult<BillDesign> {
        let index = self
            .designs
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CoreError::DesignNotFound(name.to_string()))?;
        Ok(self.designs.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&BillDesign> {
        let name = name.trim();
        self.designs.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Picks the design for a receipt: the named one if it exists, else the
    /// first saved design, else the built-in classic design.
    pub fn select(&self, name: Option<&str>) -> BillDesign {
        name.and_then(|n| self.get(n))
            .or_else(|| self.designs.first())
            .cloned()
            .unwrap_or_default()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
