//! # Repository Module
//!
//! Database repository implementations for the khata ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command                                                               │
//! │       │                                                                 │
//! │       │  db.invoices().record_payment(id, &submission, today)          │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── BEGIN                                                             │
//! │  ├── re-read invoice                                                   │
//! │  ├── khata_core gate (Invoice::apply_payment)                          │
//! │  ├── UPDATE amounts, INSERT payment events                             │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read into `*Record` structs (`sqlx::FromRow`) and converted into
//! khata-core types at the repository boundary. Amounts are stored as paisa.
//!
//! ## Available Repositories
//!
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - Supplier purchases
//! - [`StockRepository`](stock::StockRepository) - Sellable stock lots
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoices and payments
//! - [`KhataRepository`](khata::KhataRepository) - Credit accounts and statements

pub mod invoice;
pub mod khata;
pub mod purchase;
pub mod stock;

use khata_core::{LineItem, Money};

/// A stored line item, tagged with the invoice or khata sale it belongs to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct LineItemRecord {
    pub owner_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_total: i64,
}

impl From<LineItemRecord> for LineItem {
    fn from(r: LineItemRecord) -> Self {
        LineItem {
            product_name: r.product_name,
            quantity: r.quantity,
            unit_price: Money::from_minor(r.unit_price),
            line_total: Money::from_minor(r.line_total),
        }
    }
}

/// Shared setup for repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use khata_core::{Money, Purchase, StockLot};

    use crate::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    pub fn rs(major: i64) -> Money {
        Money::from_major(major)
    }

    /// Buys `qty` of `product` and returns the lot it created.
    pub async fn stocked(db: &Database, product: &str, qty: i64) -> StockLot {
        let purchase = Purchase::new("Lucky Cement Depot", product, qty, rs(400), date(1, 2)).unwrap();
        db.purchases().insert(&purchase).await.unwrap()
    }
}
