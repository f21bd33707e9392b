//! # Invoice Repository
//!
//! Database operations for invoices, their lines and payment history.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Invoice Lifecycle                                 │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     └── INSERT invoice                                                 │
//! │     └── per line: decrement lot, INSERT invoice_item                   │
//! │     └── INSERT invoice_payments for the counter payment                │
//! │                                                                         │
//! │  2. RECORD PAYMENT (one transaction, any number of times)             │
//! │     └── re-read invoice → gate → UPDATE amounts → INSERT events        │
//! │                                                                         │
//! │  3. DELETE (one transaction)                                           │
//! │     └── restore every line's quantity → DELETE invoice (cascades)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error inside a transaction drops it without committing, so a rejected
//! payment or an oversold lot leaves nothing behind.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use super::stock;
use super::LineItemRecord;
use crate::error::{DbError, DbResult};
use khata_core::{
    BillType, DraftLine, Invoice, InvoiceDetails, LineItem, Money, PaymentEvent,
    PaymentInstruments, PaymentSubmission, PaymentType,
};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct InvoiceRecord {
    id: String,
    customer_name: String,
    phone: String,
    sale_date: NaiveDate,
    total_bill_amount: i64,
    payment_types: String,
    cash_amount: i64,
    bank_amount: i64,
    bank_name: Option<String>,
    check_amount: i64,
    check_number: Option<String>,
    bill_type: BillType,
    created_at: DateTime<Utc>,
}

impl InvoiceRecord {
    fn into_invoice(self, items: Vec<LineItem>) -> DbResult<Invoice> {
        let payment_types: BTreeSet<PaymentType> = serde_json::from_str(&self.payment_types)
            .map_err(|e| DbError::corrupt("invoices.payment_types", e))?;

        Ok(Invoice {
            id: self.id,
            customer_name: self.customer_name,
            phone: self.phone,
            sale_date: self.sale_date,
            items,
            total_bill_amount: Money::from_minor(self.total_bill_amount),
            payment_types,
            instruments: PaymentInstruments {
                cash: Money::from_minor(self.cash_amount),
                bank: Money::from_minor(self.bank_amount),
                bank_name: self.bank_name,
                check: Money::from_minor(self.check_amount),
                check_number: self.check_number,
            },
            bill_type: self.bill_type,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PaymentRecord {
    id: String,
    paid_on: NaiveDate,
    amount: i64,
    instrument: PaymentType,
    bank_name: Option<String>,
    check_number: Option<String>,
}

impl From<PaymentRecord> for PaymentEvent {
    fn from(r: PaymentRecord) -> Self {
        PaymentEvent {
            id: r.id,
            paid_on: r.paid_on,
            amount: Money::from_minor(r.amount),
            instrument: r.instrument,
            bank_name: r.bank_name,
            check_number: r.check_number,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SoldLineRecord {
    lot_id: Option<String>,
    quantity: i64,
}

const INVOICE_COLUMNS: &str = r#"
    id, customer_name, phone, sale_date, total_bill_amount, payment_types,
    cash_amount, bank_amount, bank_name, check_amount, check_number,
    bill_type, created_at
"#;

fn payment_types_json(types: &BTreeSet<PaymentType>) -> DbResult<String> {
    serde_json::to_string(types).map_err(|e| DbError::Internal(e.to_string()))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Saves a finished draft as an invoice.
    ///
    /// ## What This Does
    /// 1. Builds the invoice, gating the counter payment against the total
    /// 2. Inserts it with its lines, taking each line's quantity off its lot
    /// 3. Inserts one payment event per instrument paid at the counter
    ///
    /// ## Errors
    /// - `Domain(PaymentExceedsRemaining)` for an overpaid counter payment
    /// - `Domain(InsufficientStock | LotNotFound)` when a lot ran short since
    ///   the draft was built
    pub async fn create(
        &self,
        details: &InvoiceDetails,
        lines: &[DraftLine],
        initial_payment: &PaymentSubmission,
    ) -> DbResult<Invoice> {
        let items = lines.iter().map(|l| l.item.clone()).collect();
        let invoice = Invoice::create(details, items, initial_payment)?;
        let events = initial_payment.events(invoice.sale_date);

        debug!(id = %invoice.id, lines = lines.len(), total = %invoice.total_bill_amount, "Creating invoice");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, customer_name, phone, sale_date, total_bill_amount, payment_types,
                cash_amount, bank_amount, bank_name, check_amount, check_number,
                bill_type, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.customer_name)
        .bind(&invoice.phone)
        .bind(invoice.sale_date)
        .bind(invoice.total_bill_amount.minor())
        .bind(payment_types_json(&invoice.payment_types)?)
        .bind(invoice.instruments.cash.minor())
        .bind(invoice.instruments.bank.minor())
        .bind(&invoice.instruments.bank_name)
        .bind(invoice.instruments.check.minor())
        .bind(&invoice.instruments.check_number)
        .bind(invoice.bill_type)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in lines.iter().enumerate() {
            stock::take(&mut *tx, &line.lot_id, line.item.quantity).await?;

            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    invoice_id, position, lot_id, product_name,
                    quantity, unit_price, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&invoice.id)
            .bind(position as i64)
            .bind(&line.lot_id)
            .bind(&line.item.product_name)
            .bind(line.item.quantity)
            .bind(line.item.unit_price.minor())
            .bind(line.item.line_total.minor())
            .execute(&mut *tx)
            .await?;
        }

        insert_events(&mut *tx, &invoice.id, &events).await?;

        tx.commit().await?;

        info!(
            id = %invoice.id,
            customer = %invoice.customer_name,
            total = %invoice.total_bill_amount,
            status = %invoice.status(),
            "Invoice saved"
        );
        Ok(invoice)
    }

    /// Gets an invoice with its lines.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut *conn, id).await
    }

    /// All invoices, newest sale first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let records = sqlx::query_as::<_, InvoiceRecord>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY sale_date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let item_records = sqlx::query_as::<_, LineItemRecord>(
            r#"
            SELECT invoice_id AS owner_id, product_name, quantity, unit_price, line_total
            FROM invoice_items
            ORDER BY invoice_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<LineItem>> = HashMap::new();
        for record in item_records {
            items
                .entry(record.owner_id.clone())
                .or_default()
                .push(record.into());
        }

        records
            .into_iter()
            .map(|r| {
                let lines = items.remove(&r.id).unwrap_or_default();
                r.into_invoice(lines)
            })
            .collect()
    }

    /// Payment history of an invoice, oldest first.
    pub async fn payments(&self, invoice_id: &str) -> DbResult<Vec<PaymentEvent>> {
        let records = sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT id, paid_on, amount, instrument, bank_name, check_number
            FROM invoice_payments
            WHERE invoice_id = ?1
            ORDER BY paid_on, rowid
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(PaymentEvent::from).collect())
    }

    /// Records a later payment against an invoice.
    ///
    /// The invoice is re-read inside the transaction so the gate always sees
    /// the amounts as stored, not whatever the dashboard last displayed.
    ///
    /// ## Returns
    /// The updated invoice and the events that were appended.
    pub async fn record_payment(
        &self,
        invoice_id: &str,
        submission: &PaymentSubmission,
        paid_on: NaiveDate,
    ) -> DbResult<(Invoice, Vec<PaymentEvent>)> {
        let submitted = submission.total()?;
        debug!(invoice_id = %invoice_id, %submitted, "Recording invoice payment");

        let mut tx = self.pool.begin().await?;

        let mut invoice = fetch_invoice(&mut *tx, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

        let events = invoice.apply_payment(submission, paid_on)?;

        sqlx::query(
            r#"
            UPDATE invoices SET
                payment_types = ?2,
                cash_amount = ?3,
                bank_amount = ?4,
                bank_name = ?5,
                check_amount = ?6,
                check_number = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&invoice.id)
        .bind(payment_types_json(&invoice.payment_types)?)
        .bind(invoice.instruments.cash.minor())
        .bind(invoice.instruments.bank.minor())
        .bind(&invoice.instruments.bank_name)
        .bind(invoice.instruments.check.minor())
        .bind(&invoice.instruments.check_number)
        .execute(&mut *tx)
        .await?;

        insert_events(&mut *tx, &invoice.id, &events).await?;

        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            paid = %submitted,
            remaining = %invoice.remaining(),
            status = %invoice.status(),
            "Invoice payment recorded"
        );
        Ok((invoice, events))
    }

    /// Deletes an invoice and returns its quantities to their lots.
    pub async fn delete(&self, invoice_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sold = sqlx::query_as::<_, SoldLineRecord>(
            "SELECT lot_id, quantity FROM invoice_items WHERE invoice_id = ?1",
        )
        .bind(invoice_id)
        .fetch_all(&mut *tx)
        .await?;

        for line in &sold {
            if let Some(lot_id) = &line.lot_id {
                stock::restore(&mut *tx, lot_id, line.quantity).await?;
            }
        }

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(invoice_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", invoice_id));
        }

        tx.commit().await?;

        info!(invoice_id = %invoice_id, lines = sold.len(), "Invoice deleted, stock restored");
        Ok(())
    }
}

async fn fetch_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
    let record = sqlx::query_as::<_, InvoiceRecord>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(record) = record else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, LineItemRecord>(
        r#"
        SELECT invoice_id AS owner_id, product_name, quantity, unit_price, line_total
        FROM invoice_items
        WHERE invoice_id = ?1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    record
        .into_invoice(items.into_iter().map(LineItem::from).collect())
        .map(Some)
}

async fn insert_events(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    events: &[PaymentEvent],
) -> DbResult<()> {
    for event in events {
        sqlx::query(
            r#"
            INSERT INTO invoice_payments (
                id, invoice_id, paid_on, amount, instrument, bank_name, check_number
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&event.id)
        .bind(invoice_id)
        .bind(event.paid_on)
        .bind(event.amount.minor())
        .bind(event.instrument)
        .bind(&event.bank_name)
        .bind(&event.check_number)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, date, rs, stocked};
    use crate::Database;
    use khata_core::{CoreError, LineItem, PaymentStatus, StockLot};

    fn details() -> InvoiceDetails {
        InvoiceDetails {
            customer_name: "Haji Bashir".to_string(),
            phone: "0300-1234567".to_string(),
            sale_date: date(1, 10),
            bill_type: BillType::Perfect,
        }
    }

    fn line(lot: &StockLot, qty: i64, price: i64) -> DraftLine {
        DraftLine::new(
            lot.id.clone(),
            LineItem::new(lot.product_name.clone(), qty, rs(price)).unwrap(),
        )
    }

    async fn quantity(db: &Database, lot: &StockLot) -> i64 {
        db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_create_decrements_and_round_trips() {
        let db = database().await;
        let cement = stocked(&db, "Cement", 100).await;
        let sand = stocked(&db, "Sand", 5).await;

        let lines = vec![line(&cement, 50, 500), line(&sand, 3, 3_000)];
        let invoice = db
            .invoices()
            .create(&details(), &lines, &PaymentSubmission::bank(rs(20_000), "HBL"))
            .await
            .unwrap();

        assert_eq!(invoice.total_bill_amount, rs(34_000));
        assert_eq!(invoice.status(), PaymentStatus::PartiallyPaid);
        assert_eq!(quantity(&db, &cement).await, 50);
        assert_eq!(quantity(&db, &sand).await, 2);

        let stored = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.items, invoice.items);
        assert_eq!(stored.instruments, invoice.instruments);
        assert_eq!(stored.payment_types, invoice.payment_types);

        let payments = db.invoices().payments(&invoice.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].instrument, PaymentType::Bank);
        assert_eq!(payments[0].bank_name.as_deref(), Some("HBL"));
    }

    #[tokio::test]
    async fn test_create_oversell_rolls_back() {
        let db = database().await;
        let cement = stocked(&db, "Cement", 10).await;
        let sand = stocked(&db, "Sand", 1).await;

        let lines = vec![line(&cement, 4, 500), line(&sand, 2, 3_000)];
        let err = db
            .invoices()
            .create(&details(), &lines, &PaymentSubmission::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(quantity(&db, &cement).await, 10);
        assert!(db.invoices().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_overpaid_counter_payment() {
        let db = database().await;
        let lot = stocked(&db, "Paint", 2).await;

        let err = db
            .invoices()
            .create(&details(), &[line(&lot, 1, 100)], &PaymentSubmission::cash(rs(150)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::PaymentExceedsRemaining { .. })
        ));
        assert_eq!(quantity(&db, &lot).await, 2);
    }

    #[tokio::test]
    async fn test_record_payment_gate() {
        let db = database().await;
        let lot = stocked(&db, "Marble", 10).await;
        let invoice = db
            .invoices()
            .create(&details(), &[line(&lot, 1, 34_000)], &PaymentSubmission::default())
            .await
            .unwrap();
        let repo = db.invoices();

        let (updated, events) = repo
            .record_payment(&invoice.id, &PaymentSubmission::bank(rs(20_000), "MCB"), date(1, 12))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(updated.remaining(), rs(14_000));

        let err = repo
            .record_payment(&invoice.id, &PaymentSubmission::check(rs(15_000), "000981"), date(1, 13))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::PaymentExceedsRemaining { .. })
        ));

        let stored = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.instruments.total_paid(), rs(20_000));
        assert_eq!(repo.payments(&invoice.id).await.unwrap().len(), 1);

        let (paid, _) = repo
            .record_payment(&invoice.id, &PaymentSubmission::check(rs(14_000), "000981"), date(1, 13))
            .await
            .unwrap();
        assert_eq!(paid.status(), PaymentStatus::FullyPaid);
        assert_eq!(
            paid.payment_types,
            BTreeSet::from([PaymentType::Bank, PaymentType::Check])
        );

        let stored = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.status(), PaymentStatus::FullyPaid);
        assert_eq!(stored.instruments.check_number.as_deref(), Some("000981"));
    }

    #[tokio::test]
    async fn test_record_payment_unknown_invoice() {
        let db = database().await;
        let err = db
            .invoices()
            .record_payment("nope", &PaymentSubmission::cash(rs(1)), date(1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let db = database().await;
        let lot = stocked(&db, "Steel", 6).await;
        let invoice = db
            .invoices()
            .create(&details(), &[line(&lot, 6, 900)], &PaymentSubmission::cash(rs(1_000)))
            .await
            .unwrap();
        assert!(db.stock().list_available().await.unwrap().is_empty());

        db.invoices().delete(&invoice.id).await.unwrap();

        assert_eq!(quantity(&db, &lot).await, 6);
        assert!(db.invoices().get_by_id(&invoice.id).await.unwrap().is_none());
        assert!(db.invoices().payments(&invoice.id).await.unwrap().is_empty());
        assert!(matches!(
            db.invoices().delete(&invoice.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_groups_items() {
        let db = database().await;
        let lot = stocked(&db, "Bricks", 1_000).await;
        let repo = db.invoices();

        let mut first = details();
        first.sale_date = date(1, 1);
        let mut second = details();
        second.sale_date = date(2, 1);

        repo.create(&first, &[line(&lot, 100, 12), line(&lot, 50, 12)], &PaymentSubmission::default())
            .await
            .unwrap();
        repo.create(&second, &[line(&lot, 10, 12)], &PaymentSubmission::default())
            .await
            .unwrap();

        let invoices = repo.list().await.unwrap();
        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[0].sale_date, date(2, 1));
        assert_eq!(invoices[0].items.len(), 1);
        assert_eq!(invoices[1].items.len(), 2);
        assert_eq!(quantity(&db, &lot).await, 840);
    }
}
