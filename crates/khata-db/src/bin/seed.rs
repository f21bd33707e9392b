//! # Seed Data Generator
//!
//! Populates a database with a small building-materials shop for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p khata-db --bin seed
//! cargo run -p khata-db --bin seed -- --db ./data/khata.db
//! ```
//!
//! ## Generated Data
//! - One purchase (and stock lot) per product in [`PRODUCTS`]
//! - Two invoices: one partly paid by bank, one unpaid
//! - Two khata accounts with a few months of sales and payments

use chrono::{Duration, NaiveDate, Utc};
use khata_core::{
    DraftInvoice, InvoiceDetails, KhataAccount, LineItem, Money, PaymentSubmission, Purchase,
};
use khata_db::{Database, DbConfig};
use std::env;

/// (product, supplier, quantity, unit price in rupees)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("Cement bag 50kg", "Lucky Cement Depot", 400, 1_150),
    ("Sand (cubic ft)", "Indus Sand Co", 2_000, 45),
    ("Crush (cubic ft)", "Indus Sand Co", 1_500, 60),
    ("Steel bar 12mm", "Amreli Steels", 300, 2_600),
    ("Brick", "Kiln No. 7", 9_000, 16),
    ("Floor tile 2x2", "Master Tiles", 800, 340),
    ("Emulsion paint 4L", "Berger Traders", 120, 3_900),
];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Haji Bashir", "0300-1234567", "Gulberg III"),
    ("Rashid Builders", "0321-7654321", "Main Bazaar"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./khata_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Khata Ledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./khata_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Khata Ledger Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if !db.purchases().list().await?.is_empty() {
        println!("⚠ Database already has purchases");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let start = today - Duration::days(90);

    // Stock
    for (product, supplier, qty, price) in PRODUCTS {
        let purchase = Purchase::new(supplier, product, *qty, Money::from_major(*price), start)?;
        db.purchases().insert(&purchase).await?;
    }
    println!("✓ {} purchases stocked", PRODUCTS.len());

    // Invoices
    seed_invoices(&db, start).await?;
    println!("✓ 2 invoices saved");

    // Khata
    for (name, phone, address) in CUSTOMERS {
        let account = KhataAccount::new(name, phone, Some(*address))?;
        db.khata().create_account(&account).await?;
        seed_khata(&db, &account, start).await?;
    }
    println!("✓ {} khata accounts opened", CUSTOMERS.len());

    db.close().await;
    println!();
    println!("Done.");
    Ok(())
}

async fn seed_invoices(db: &Database, start: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let mut draft = DraftInvoice::new(db.stock().list_available().await?);

    let lots = draft.available().to_vec();
    let cement = lots
        .iter()
        .find(|l| l.product_name.starts_with("Cement"))
        .ok_or("no cement in stock")?;
    let steel = lots
        .iter()
        .find(|l| l.product_name.starts_with("Steel"))
        .ok_or("no steel in stock")?;

    draft.add_line(&cement.id, 20, Money::from_major(1_300))?;
    draft.add_line(&steel.id, 5, Money::from_major(4_200))?;
    let details = InvoiceDetails {
        customer_name: "Tariq Contractor".to_string(),
        phone: "0333-5550101".to_string(),
        sale_date: start + Duration::days(10),
        bill_type: Default::default(),
    };
    let saved = draft.lines().to_vec();
    let invoice = db
        .invoices()
        .create(&details, &saved, &PaymentSubmission::bank(Money::from_major(30_000), "Meezan Bank"))
        .await?;
    draft.mark_saved(&saved);
    println!("  {} {} ({})", invoice.customer_name, invoice.total_bill_amount, invoice.status());

    draft.add_line(&cement.id, 10, Money::from_major(1_300))?;
    let details = InvoiceDetails {
        customer_name: "Walk-in customer".to_string(),
        phone: "0345-0000000".to_string(),
        sale_date: start + Duration::days(30),
        bill_type: Default::default(),
    };
    let saved = draft.lines().to_vec();
    let invoice = db
        .invoices()
        .create(&details, &saved, &PaymentSubmission::default())
        .await?;
    draft.mark_saved(&saved);
    println!("  {} {} ({})", invoice.customer_name, invoice.total_bill_amount, invoice.status());

    Ok(())
}

async fn seed_khata(
    db: &Database,
    account: &KhataAccount,
    start: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let khata = db.khata();

    khata
        .record_sale(
            &account.id,
            start + Duration::days(5),
            &[LineItem::new("Cement bag 50kg", 20, Money::from_major(1_250))?],
        )
        .await?;
    khata
        .record_sale(
            &account.id,
            start + Duration::days(12),
            &[
                LineItem::new("Sand (cubic ft)", 100, Money::from_major(50))?,
                LineItem::new("Brick", 1_000, Money::from_major(17))?,
            ],
        )
        .await?;
    khata
        .record_payment(
            &account.id,
            &PaymentSubmission::cash(Money::from_major(20_000)),
            start + Duration::days(30),
        )
        .await?;
    khata
        .record_payment(
            &account.id,
            &PaymentSubmission::check(Money::from_major(15_000), "000417"),
            start + Duration::days(60),
        )
        .await?;

    let statement = khata.statement(&account.id).await?;
    println!("  {} owes {}", account.customer_name, statement.closing_balance);
    Ok(())
}
