//! # Layout Renderer
//!
//! Turns a bill design plus receipt data into a rendered receipt.
//!
//! ## One Template, Seven Styles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   BillDesign ──► LayoutStyle::for_layout(design.layout)                │
//! │       │               border, spacing, header case, totals form,       │
//! │       │               section order                                    │
//! │       ▼                     │                                           │
//! │   render(design, ctx) ◄─────┘                                           │
//! │       │                                                                 │
//! │       │  for section in style.order:                                   │
//! │       │      skip unless design.elements has it on                     │
//! │       │      table: enabled columns in design order                    │
//! │       │      amounts: totals::line_amount (same rule as totals)        │
//! │       ▼                                                                 │
//! │   RenderedReceipt { sections: [...] } ──► to_text(width)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The layout variant only changes presentation. Which sections appear,
//! which columns appear, and every amount are decided once, here, for all
//! layouts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::design::{
    BillDesign, Layout, Section, COL_AMOUNT, COL_DISCOUNT, COL_GST, COL_PRICE, COL_PRODUCT,
    COL_QUANTITY, COL_SERIAL,
};
use crate::money::Money;
use crate::receipt::{LineItem, Receipt};
use crate::totals::compute_totals;
use crate::types::{BusinessProfile, CustomerInfo, TaxRate};

// =============================================================================
// Layout Style
// =============================================================================

const CLASSIC_ORDER: [Section; 11] = Section::ALL;

const MODERN_ORDER: [Section; 11] = [
    Section::Logo,
    Section::BusinessInfo,
    Section::CustomerInfo,
    Section::Table,
    Section::Totals,
    Section::Notes,
    Section::TermsAndConditions,
    Section::Warranty,
    Section::ReturnPeriod,
    Section::QrCode,
    Section::Signature,
];

const ELEGANT_ORDER: [Section; 11] = [
    Section::Logo,
    Section::BusinessInfo,
    Section::CustomerInfo,
    Section::Table,
    Section::Totals,
    Section::Notes,
    Section::TermsAndConditions,
    Section::Warranty,
    Section::ReturnPeriod,
    Section::Signature,
    Section::QrCode,
];

const THERMAL_ORDER: [Section; 11] = [
    Section::Logo,
    Section::BusinessInfo,
    Section::CustomerInfo,
    Section::Table,
    Section::Totals,
    Section::TermsAndConditions,
    Section::Warranty,
    Section::ReturnPeriod,
    Section::Notes,
    Section::Signature,
    Section::QrCode,
];

/// Presentation parameters of one layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutStyle {
    pub layout: Layout,
    /// Character of horizontal rules; `None` prints no rules.
    pub border: Option<char>,
    /// Blank lines between sections.
    pub spacing: usize,
    /// Uppercase table headers and business name.
    pub bold_headers: bool,
    /// Totals on a single line.
    pub compact_totals: bool,
    /// Center the business and customer blocks.
    pub centered_header: bool,
    /// Print order of the optional sections.
    pub order: &'static [Section; 11],
}

impl LayoutStyle {
    pub fn for_layout(layout: Layout) -> Self {
        let base = LayoutStyle {
            layout,
            border: Some('='),
            spacing: 1,
            bold_headers: false,
            compact_totals: false,
            centered_header: true,
            order: &CLASSIC_ORDER,
        };

        match layout {
            Layout::Classic => base,
            Layout::Modern => LayoutStyle {
                border: Some('-'),
                bold_headers: true,
                centered_header: false,
                order: &MODERN_ORDER,
                ..base
            },
            Layout::Compact => LayoutStyle {
                border: Some('-'),
                spacing: 0,
                compact_totals: true,
                centered_header: false,
                ..base
            },
            Layout::Elegant => LayoutStyle {
                border: Some('~'),
                spacing: 1,
                order: &ELEGANT_ORDER,
                ..base
            },
            Layout::Bold => LayoutStyle {
                border: Some('#'),
                bold_headers: true,
                ..base
            },
            Layout::Minimal => LayoutStyle {
                border: None,
                centered_header: false,
                ..base
            },
            Layout::Thermal => LayoutStyle {
                border: Some('-'),
                spacing: 0,
                bold_headers: true,
                compact_totals: false,
                order: &THERMAL_ORDER,
                ..base
            },
        }
    }
}

// =============================================================================
// Input
// =============================================================================

/// Everything a receipt needs besides its design.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptContext {
    pub business: BusinessProfile,
    pub receipt: Receipt,
    /// Signature image as a URL or data URI.
    pub signature: Option<String>,
    /// QR payload; defaults to the receipt number.
    pub qr_payload: Option<String>,
}

impl ReceiptContext {
    pub fn new(business: BusinessProfile, receipt: Receipt) -> Self {
        ReceiptContext {
            business,
            receipt,
            signature: None,
            qr_payload: None,
        }
    }

    /// Preview data for the design editor.
    pub fn sample(design: &BillDesign, now: DateTime<Utc>) -> Self {
        let business = BusinessProfile {
            id: "SAMPLE".to_string(),
            name: "Sample Store".to_string(),
            address: Some("12 Market Road, Pune".to_string()),
            phone: Some("+91 98765 43210".to_string()),
            email: Some("hello@samplestore.in".to_string()),
            gstin: Some("27ABCDE1234F1Z5".to_string()),
            logo: None,
        };

        let mut receipt = Receipt {
            id: format!("SAMPLE-{}-00000000", now.timestamp_millis()),
            business_id: business.id.clone(),
            receipt_number: "GR-SAMPLE-1".to_string(),
            date: now.date_naive(),
            customer_ref: None,
            customer: Some(CustomerInfo {
                name: "Asha Verma".to_string(),
                phone: Some("+91 90000 00001".to_string()),
                email: None,
                address: None,
            }),
            design_ref: Some(design.name.clone()),
            line_items: sample_items(),
            subtotal: Money::zero(),
            tax_total: Money::zero(),
            total: Money::zero(),
            tax_applied: design.tax_enabled(),
            terms: Some("Goods once sold will not be taken back.".to_string()),
            warranty: Some("6 months on electronics.".to_string()),
            return_period: Some("7 days with bill.".to_string()),
            notes: Some("Thank you for shopping with us!".to_string()),
            draft: true,
            created_at: now,
        };
        receipt.recompute();

        ReceiptContext::new(business, receipt)
    }
}

fn sample_items() -> Vec<LineItem> {
    let item = |name: &str, price: i64, quantity: i64| LineItem {
        name: name.to_string(),
        unit_price: Money::from_minor(price),
        quantity,
        tax_rate: TaxRate::from_bps(1800),
        line_amount: Money::zero(),
        fields: Default::default(),
    };
    vec![item("Product A", 10000, 2), item("Product B", 5000, 1)]
}

// =============================================================================
// Output
// =============================================================================

/// One line of the totals block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TotalLine {
    pub label: String,
    pub amount: Money,
    pub emphasize: bool,
}

/// A rendered section, in print order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "camelCase")]
#[ts(export)]
pub enum RenderedSection {
    Logo { source: Option<String>, alt: String },
    BusinessInfo { lines: Vec<String> },
    /// Receipt number and date; not an optional element.
    Meta { receipt_number: String, date: String },
    CustomerInfo { lines: Vec<String> },
    Table { headers: Vec<String>, rows: Vec<Vec<String>>, numeric: Vec<bool> },
    Totals { lines: Vec<TotalLine> },
    QrCode { payload: String },
    Terms { text: Option<String> },
    Warranty { text: Option<String> },
    ReturnPeriod { text: Option<String> },
    /// `image` is `None` when only the placeholder line is printed.
    Signature { image: Option<String> },
    Notes { text: Option<String> },
}

impl RenderedSection {
    /// The design element behind this section; `None` for `Meta`.
    pub fn section(&self) -> Option<Section> {
        Some(match self {
            RenderedSection::Logo { .. } => Section::Logo,
            RenderedSection::BusinessInfo { .. } => Section::BusinessInfo,
            RenderedSection::Meta { .. } => return None,
            RenderedSection::CustomerInfo { .. } => Section::CustomerInfo,
            RenderedSection::Table { .. } => Section::Table,
            RenderedSection::Totals { .. } => Section::Totals,
            RenderedSection::QrCode { .. } => Section::QrCode,
            RenderedSection::Terms { .. } => Section::TermsAndConditions,
            RenderedSection::Warranty { .. } => Section::Warranty,
            RenderedSection::ReturnPeriod { .. } => Section::ReturnPeriod,
            RenderedSection::Signature { .. } => Section::Signature,
            RenderedSection::Notes { .. } => Section::Notes,
        })
    }
}

/// A receipt rendered under one design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RenderedReceipt {
    pub layout: Layout,
    pub font: String,
    pub color: String,
    pub sections: Vec<RenderedSection>,
}

impl RenderedReceipt {
    pub fn table(&self) -> Option<(&[String], &[Vec<String>])> {
        self.sections.iter().find_map(|s| match s {
            RenderedSection::Table { headers, rows, .. } => Some((headers.as_slice(), rows.as_slice())),
            _ => None,
        })
    }

    /// Design elements present, in print order.
    pub fn element_order(&self) -> Vec<Section> {
        self.sections.iter().filter_map(RenderedSection::section).collect()
    }

    pub fn contains(&self, section: Section) -> bool {
        self.sections.iter().any(|s| s.section() == Some(section))
    }
}

// =============================================================================
// Render
// =============================================================================

/// Header label of a column key. Unknown keys get their first letter
/// uppercased.
pub fn column_label(key: &str) -> String {
    match key {
        COL_SERIAL => "S.No".to_string(),
        COL_PRODUCT => "Product".to_string(),
        COL_QUANTITY => "Qty".to_string(),
        COL_PRICE => "Price".to_string(),
        COL_GST | "tax" => "GST %".to_string(),
        COL_AMOUNT => "Amount".to_string(),
        COL_DISCOUNT => "Discount".to_string(),
        other => capitalize(other),
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_numeric_column(key: &str) -> bool {
    matches!(
        key,
        COL_SERIAL | COL_QUANTITY | COL_PRICE | COL_GST | "tax" | COL_AMOUNT | COL_DISCOUNT
    )
}

fn cell(key: &str, index: usize, item: &LineItem, tax_enabled: bool) -> String {
    match key {
        COL_SERIAL => (index + 1).to_string(),
        COL_PRODUCT => item.name.clone(),
        COL_QUANTITY => item.quantity.to_string(),
        COL_PRICE => item.unit_price.to_plain_string(),
        COL_GST | "tax" => item.tax_rate.label(),
        COL_AMOUNT => item.amount(tax_enabled).to_plain_string(),
        other => item.field(other).unwrap_or_default().to_string(),
    }
}

/// Renders `ctx` under `design`.
pub fn render(design: &BillDesign, ctx: &ReceiptContext) -> RenderedReceipt {
    let style = LayoutStyle::for_layout(design.layout);
    let tax_enabled = design.tax_enabled();
    let receipt = &ctx.receipt;
    let mut sections = Vec::new();

    for &section in style.order.iter() {
        if section == Section::CustomerInfo {
            sections.push(RenderedSection::Meta {
                receipt_number: receipt.receipt_number.clone(),
                date: receipt.date.format("%d-%m-%Y").to_string(),
            });
        }
        if !design.elements.is_enabled(section) {
            continue;
        }

        let rendered = match section {
            Section::Logo => RenderedSection::Logo {
                source: ctx.business.logo.clone(),
                alt: ctx.business.name.clone(),
            },
            Section::BusinessInfo => {
                let mut lines = ctx.business.info_lines();
                if style.bold_headers {
                    if let Some(first) = lines.first_mut() {
                        *first = first.to_uppercase();
                    }
                }
                RenderedSection::BusinessInfo { lines }
            }
            Section::CustomerInfo => RenderedSection::CustomerInfo {
                lines: receipt
                    .customer
                    .as_ref()
                    .map(CustomerInfo::info_lines)
                    .unwrap_or_else(|| vec!["Bill to: Walk-in customer".to_string()]),
            },
            Section::Table => {
                let keys: Vec<&str> = design.columns.enabled_keys().collect();
                let headers = keys
                    .iter()
                    .map(|k| {
                        let label = column_label(k);
                        if style.bold_headers {
                            label.to_uppercase()
                        } else {
                            label
                        }
                    })
                    .collect();
                let rows = receipt
                    .line_items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| keys.iter().map(|k| cell(k, i, item, tax_enabled)).collect())
                    .collect();
                let numeric = keys.iter().map(|k| is_numeric_column(k)).collect();
                RenderedSection::Table {
                    headers,
                    rows,
                    numeric,
                }
            }
            Section::Totals => {
                let totals = compute_totals(&receipt.line_items, tax_enabled);
                let mut lines = vec![TotalLine {
                    label: "Subtotal".to_string(),
                    amount: totals.subtotal,
                    emphasize: false,
                }];
                if tax_enabled {
                    lines.push(TotalLine {
                        label: "GST".to_string(),
                        amount: totals.tax_total,
                        emphasize: false,
                    });
                }
                lines.push(TotalLine {
                    label: "Total".to_string(),
                    amount: totals.total,
                    emphasize: true,
                });
                RenderedSection::Totals { lines }
            }
            Section::QrCode => RenderedSection::QrCode {
                payload: ctx
                    .qr_payload
                    .clone()
                    .unwrap_or_else(|| receipt.receipt_number.clone()),
            },
            Section::TermsAndConditions => RenderedSection::Terms {
                text: receipt.terms.clone(),
            },
            Section::Warranty => RenderedSection::Warranty {
                text: receipt.warranty.clone(),
            },
            Section::ReturnPeriod => RenderedSection::ReturnPeriod {
                text: receipt.return_period.clone(),
            },
            Section::Signature => RenderedSection::Signature {
                image: ctx.signature.clone(),
            },
            Section::Notes => RenderedSection::Notes {
                text: receipt.notes.clone(),
            },
        };
        sections.push(rendered);
    }

    RenderedReceipt {
        layout: design.layout,
        font: design.font.clone(),
        color: design.color.clone(),
        sections,
    }
}

// =============================================================================
// Plain Text Backend
// =============================================================================

/// Default width of a 58mm thermal roll.
pub const THERMAL_WIDTH: usize = 32;

impl RenderedReceipt {
    /// Prints the receipt as fixed-width text (thermal printers, previews).
    pub fn to_text(&self, width: usize) -> String {
        let width = width.max(16);
        let style = LayoutStyle::for_layout(self.layout);
        let mut out = TextBuilder::new(width);

        if let Some(border) = style.border {
            out.rule(border);
        }

        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.blank(style.spacing);
            }
            match section {
                RenderedSection::Logo { source, alt } => {
                    let label = match source {
                        Some(_) => format!("[logo: {}]", alt),
                        None => "[ LOGO ]".to_string(),
                    };
                    out.center(&label);
                }
                RenderedSection::BusinessInfo { lines } | RenderedSection::CustomerInfo { lines } => {
                    for line in lines {
                        if style.centered_header {
                            out.center(line);
                        } else {
                            out.wrap(line);
                        }
                    }
                }
                RenderedSection::Meta {
                    receipt_number,
                    date,
                } => {
                    out.left_right(&format!("No: {}", receipt_number), date);
                }
                RenderedSection::Table {
                    headers,
                    rows,
                    numeric,
                } => {
                    if let Some(border) = style.border {
                        out.rule(border);
                    }
                    out.table(headers, rows, numeric);
                    if let Some(border) = style.border {
                        out.rule(border);
                    }
                }
                RenderedSection::Totals { lines } => {
                    if style.compact_totals {
                        let joined = lines
                            .iter()
                            .map(|l| format!("{} {}", l.label, l.amount))
                            .collect::<Vec<_>>()
                            .join(" | ");
                        out.wrap(&joined);
                    } else {
                        for line in lines {
                            let label = if line.emphasize && style.bold_headers {
                                line.label.to_uppercase()
                            } else {
                                line.label.clone()
                            };
                            out.left_right(&label, &line.amount.to_string());
                        }
                    }
                }
                RenderedSection::QrCode { payload } => {
                    out.center("[QR]");
                    out.center(payload);
                }
                RenderedSection::Terms { text } => out.labelled("Terms", text.as_deref()),
                RenderedSection::Warranty { text } => out.labelled("Warranty", text.as_deref()),
                RenderedSection::ReturnPeriod { text } => out.labelled("Returns", text.as_deref()),
                RenderedSection::Notes { text } => out.labelled("Notes", text.as_deref()),
                RenderedSection::Signature { image } => {
                    out.blank(1);
                    match image {
                        Some(_) => out.right("[signature]"),
                        None => out.right(&"_".repeat(18usize.min(width))),
                    }
                    out.right("Authorised Signatory");
                }
            }
        }

        if let Some(border) = style.border {
            out.rule(border);
        }
        out.finish()
    }
}

/// Fixed-width line builder. Widths count chars, not bytes.
struct TextBuilder {
    width: usize,
    lines: Vec<String>,
}

impl TextBuilder {
    fn new(width: usize) -> Self {
        TextBuilder {
            width,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, line: String) {
        self.lines.push(line.trim_end().to_string());
    }

    fn rule(&mut self, c: char) {
        self.push(c.to_string().repeat(self.width));
    }

    fn blank(&mut self, count: usize) {
        for _ in 0..count {
            self.lines.push(String::new());
        }
    }

    fn center(&mut self, text: &str) {
        for line in wrap(text, self.width) {
            let pad = (self.width - len(&line)) / 2;
            self.push(format!("{}{}", " ".repeat(pad), line));
        }
    }

    fn right(&mut self, text: &str) {
        let text = truncate(text, self.width);
        self.push(format!("{}{}", " ".repeat(self.width - len(&text)), text));
    }

    fn wrap(&mut self, text: &str) {
        for line in wrap(text, self.width) {
            self.push(line);
        }
    }

    fn labelled(&mut self, label: &str, text: Option<&str>) {
        match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => self.wrap(&format!("{}: {}", label, text)),
            None => self.push(format!("{}:", label)),
        }
    }

    fn left_right(&mut self, left: &str, right: &str) {
        let right = truncate(right, self.width);
        let room = self.width.saturating_sub(len(&right) + 1);
        let left = truncate(left, room);
        let gap = self.width - len(&left) - len(&right);
        self.push(format!("{}{}{}", left, " ".repeat(gap), right));
    }

    fn table(&mut self, headers: &[String], rows: &[Vec<String>], numeric: &[bool]) {
        if headers.is_empty() {
            return;
        }
        let mut widths: Vec<usize> = headers.iter().map(|h| len(h)).collect();
        for row in rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(len(cell));
            }
        }

        // Shrink the widest column until the row fits.
        let available = self.width.saturating_sub(headers.len() - 1);
        while widths.iter().sum::<usize>() > available {
            let Some((i, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 1 {
                break;
            }
            widths[i] -= 1;
        }

        let format_row = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .zip(numeric)
                .map(|((cell, &w), &right)| {
                    let cell = truncate(cell, w);
                    let pad = " ".repeat(w - len(&cell));
                    if right {
                        format!("{}{}", pad, cell)
                    } else {
                        format!("{}{}", cell, pad)
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        };

        self.push(format_row(headers));
        for row in rows {
            self.push(format_row(row));
        }
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

fn len(s: &str) -> usize {
    s.chars().count()
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let word = truncate(word, width);
        if current.is_empty() {
            current = word;
        } else if len(&current) + 1 + len(&word) <= width {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

// =============================================================================
// Unit Tests
// =============================================================================
