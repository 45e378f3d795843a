//! # Receipt Preview
//!
//! Walks one receipt through its lifecycle against in-process stores and
//! prints it as plain text.
//!
//! ## Usage
//! ```bash
//! # Classic layout, 48 columns (default)
//! cargo run -p goreceipt-sync --bin preview
//!
//! # Thermal layout at printer width
//! cargo run -p goreceipt-sync --bin preview -- --layout thermal --width 32
//!
//! # Keep the device cache on disk between runs
//! cargo run -p goreceipt-sync --bin preview -- --persist ./preview-cache
//! ```
//!
//! ## Steps
//! - saves a bill design
//! - creates, drafts and finalizes a receipt
//! - renders it with the chosen layout
//! - shows a rejected delete (remote offline), then a delete and its undo
//! - prints the sales summary

use chrono::Utc;
use goreceipt_core::layout::THERMAL_WIDTH;
use goreceipt_core::{
    render, BillDesign, BusinessProfile, CustomerInfo, Layout, LineItem, Money, ReceiptContext,
    Section, TaxRate,
};
use goreceipt_sync::{
    DesignLibrary, FileLocalStore, LocalStore, MemoryLocalStore, MemoryRemoteStore, ReceiptBook,
    SyncConfig, SyncEngine,
};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,goreceipt=debug")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut layout = Layout::Classic;
    let mut width: Option<usize> = None;
    let mut persist: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--layout" | "-l" => {
                if i + 1 < args.len() {
                    layout = Layout::parse(&args[i + 1]);
                    i += 1;
                }
            }
            "--width" | "-w" => {
                if i + 1 < args.len() {
                    width = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--persist" | "-p" => {
                if i + 1 < args.len() {
                    persist = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("GoReceipt Preview");
                println!();
                println!("Usage: preview [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -l, --layout <NAME>  {}", Layout::names());
                println!("  -w, --width <N>      Text width (default: 48, thermal: 32)");
                println!("  -p, --persist <DIR>  Keep the device cache in DIR");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let width = width.unwrap_or(if layout == Layout::Thermal { THERMAL_WIDTH } else { 48 });
    let config = SyncConfig::load_or_default(None);
    let business_id = config.business_id().to_string();

    println!("GoReceipt Preview");
    println!("=================");
    println!("Business: {}", business_id);
    println!("Layout:   {}", layout);
    println!();

    let remote = Arc::new(MemoryRemoteStore::new());
    let local: Arc<dyn LocalStore> = match &persist {
        Some(dir) => {
            println!("✓ Device cache at {}", dir);
            Arc::new(FileLocalStore::open(dir)?)
        }
        None => Arc::new(MemoryLocalStore::new()),
    };
    let engine = Arc::new(SyncEngine::from_config(remote.clone(), local, &config));

    // Design
    let library = DesignLibrary::new(engine.clone(), &business_id);
    let mut design = BillDesign::standard().with_layout(layout);
    design.name = "Counter".to_string();
    design.toggle_element(Section::QrCode);
    library.save(&design).await?;
    println!("✓ Saved design '{}'", design.name);

    // Receipt
    let book = ReceiptBook::new(engine.clone(), &business_id);
    let now = Utc::now();
    let mut receipt = book.new_receipt(&design, now).await?;
    receipt.customer = Some(CustomerInfo {
        name: "Asha Verma".to_string(),
        phone: Some("98200 00000".to_string()),
        ..CustomerInfo::default()
    });
    let gst = TaxRate::from_bps(1800);
    receipt.add_item(LineItem::new("Masala Tea", Money::from_minor(10000), 2, gst)?);
    receipt.add_item(LineItem::new("Butter Biscuit", Money::from_minor(5000), 1, gst)?);
    receipt.terms = Some("Goods once sold will not be taken back.".to_string());

    book.save_draft(&receipt).await?;
    println!("✓ Draft {} saved on device", receipt.receipt_number);

    let receipt = book.finalize(&receipt).await?;
    println!("✓ Finalized {} ({})", receipt.receipt_number, receipt.total);
    println!();

    let business = BusinessProfile {
        id: business_id.clone(),
        name: if config.business.name.is_empty() {
            "Sample Store".to_string()
        } else {
            config.business.name.clone()
        },
        address: Some("12 Market Road".to_string()),
        gstin: Some("27AAAAA0000A1Z5".to_string()),
        ..BusinessProfile::default()
    };
    let mut ctx = ReceiptContext::new(business, receipt.clone());
    ctx.qr_payload = Some(receipt.receipt_number.clone());
    println!("{}", render(&design, &ctx).to_text(width));
    println!();

    // Delete with the remote offline, then for real, then undo
    remote.go_offline();
    match book.delete_receipt(&receipt.id).await {
        Ok(_) => println!("⚠ Delete went through while offline"),
        Err(e) => println!("✓ Offline delete rejected: {}", e),
    }
    remote.heal();

    book.delete_receipt(&receipt.id).await?;
    println!("✓ Deleted {} ({} receipts left)", receipt.receipt_number, book.list_receipts().await.len());

    if let Some(entry) = engine.undo_last().await? {
        println!("✓ Undid {:?} of {}", entry.action, entry.entity);
    }

    let summary = book.summary().await;
    println!();
    println!("Receipts:  {}", summary.receipt_count);
    println!("Revenue:   {}", summary.revenue);
    println!("Tax:       {}", summary.tax_collected);
    println!("Next no.:  {}", book.next_number().await);
    println!("Audit log: {} entries", engine.audit().len());

    Ok(())
}
