//! # Khata Repository
//!
//! Customer credit accounts and their transaction history.
//!
//! ## Ordering
//! ```text
//! khata_transactions
//!   (account_id, entry_date, seq)
//!        │           │       └── per-account insertion counter
//!        │           └────────── primary sort
//!        └────────────────────── one statement per account
//! ```
//!
//! Two entries on the same day come back in the order they were recorded,
//! which is what the running balance needs.
//!
//! Khata payments are not gated against the balance. A customer may pay in
//! advance, leaving the balance negative.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::LineItemRecord;
use crate::error::{DbError, DbResult};
use khata_core::{
    summarize, CoreError, KhataAccount, LedgerSummary, LedgerTransaction, LineItem, Money,
    PaymentSubmission, PaymentType, MAX_INVOICE_LINES,
};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct AccountRecord {
    id: String,
    customer_name: String,
    phone: String,
    address: Option<String>,
}

impl From<AccountRecord> for KhataAccount {
    fn from(r: AccountRecord) -> Self {
        KhataAccount {
            id: r.id,
            customer_name: r.customer_name,
            phone: r.phone,
            address: r.address,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TransactionRecord {
    id: String,
    kind: String,
    entry_date: NaiveDate,
    amount: i64,
    instrument: Option<PaymentType>,
    bank_name: Option<String>,
    check_number: Option<String>,
}

impl TransactionRecord {
    fn into_transaction(
        self,
        items: &mut HashMap<String, Vec<LineItem>>,
    ) -> DbResult<LedgerTransaction> {
        match self.kind.as_str() {
            "sale" => Ok(LedgerTransaction::Sale {
                date: self.entry_date,
                items: items.remove(&self.id).unwrap_or_default(),
            }),
            "payment" => Ok(LedgerTransaction::Payment {
                date: self.entry_date,
                amount: Money::from_minor(self.amount),
                instrument: self.instrument.ok_or_else(|| {
                    DbError::corrupt("khata_transactions.instrument", "missing on payment")
                })?,
                bank_name: self.bank_name,
                check_number: self.check_number,
            }),
            other => Err(DbError::corrupt("khata_transactions.kind", other)),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for khata accounts and statements.
#[derive(Debug, Clone)]
pub struct KhataRepository {
    pool: SqlitePool,
}

impl KhataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        KhataRepository { pool }
    }

    pub async fn create_account(&self, account: &KhataAccount) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO khata_accounts (id, customer_name, phone, address)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&account.id)
        .bind(&account.customer_name)
        .bind(&account.phone)
        .bind(&account.address)
        .execute(&self.pool)
        .await?;

        info!(account_id = %account.id, customer = %account.customer_name, "Khata account opened");
        Ok(())
    }

    pub async fn get_account(&self, id: &str) -> DbResult<Option<KhataAccount>> {
        let mut conn = self.pool.acquire().await?;
        fetch_account(&mut *conn, id).await
    }

    /// All accounts, alphabetically.
    pub async fn list_accounts(&self) -> DbResult<Vec<KhataAccount>> {
        let records = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, customer_name, phone, address
            FROM khata_accounts
            ORDER BY customer_name COLLATE NOCASE, created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(KhataAccount::from).collect())
    }

    /// Records goods taken on credit.
    pub async fn record_sale(
        &self,
        account_id: &str,
        date: NaiveDate,
        items: &[LineItem],
    ) -> DbResult<LedgerTransaction> {
        if items.is_empty() {
            return Err(CoreError::EmptyInvoice.into());
        }
        if items.len() > MAX_INVOICE_LINES {
            return Err(CoreError::TooManyLines {
                max: MAX_INVOICE_LINES,
            }
            .into());
        }

        let total: Money = items.iter().map(|i| i.line_total).sum();
        debug!(account_id = %account_id, lines = items.len(), total = %total, "Recording khata sale");

        let mut tx = self.pool.begin().await?;
        let id = insert_transaction(&mut *tx, account_id, date, "sale", total, None).await?;

        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO khata_items (
                    transaction_id, position, product_name, quantity, unit_price, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&id)
            .bind(position as i64)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price.minor())
            .bind(item.line_total.minor())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(account_id = %account_id, total = %total, "Khata sale recorded");
        Ok(LedgerTransaction::Sale {
            date,
            items: items.to_vec(),
        })
    }

    /// Records money received, one transaction per instrument used.
    pub async fn record_payment(
        &self,
        account_id: &str,
        submission: &PaymentSubmission,
        paid_on: NaiveDate,
    ) -> DbResult<Vec<LedgerTransaction>> {
        if submission.is_empty() {
            return Err(CoreError::EmptyPayment.into());
        }

        let submitted = submission.total()?;
        debug!(account_id = %account_id, %submitted, "Recording khata payment");

        let events = submission.events(paid_on);
        let mut tx = self.pool.begin().await?;

        for event in &events {
            insert_transaction(
                &mut *tx,
                account_id,
                event.paid_on,
                "payment",
                event.amount,
                Some((event.instrument, event.bank_name.as_deref(), event.check_number.as_deref())),
            )
            .await?;
        }

        tx.commit().await?;

        info!(account_id = %account_id, paid = %submitted, "Khata payment recorded");
        Ok(events
            .into_iter()
            .map(|e| LedgerTransaction::Payment {
                date: e.paid_on,
                amount: e.amount,
                instrument: e.instrument,
                bank_name: e.bank_name,
                check_number: e.check_number,
            })
            .collect())
    }

    /// An account's history, by date then recording order.
    pub async fn transactions(&self, account_id: &str) -> DbResult<Vec<LedgerTransaction>> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, kind, entry_date, amount, instrument, bank_name, check_number
            FROM khata_transactions
            WHERE account_id = ?1
            ORDER BY entry_date, seq
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let item_records = sqlx::query_as::<_, LineItemRecord>(
            r#"
            SELECT i.transaction_id AS owner_id, i.product_name, i.quantity, i.unit_price, i.line_total
            FROM khata_items i
            JOIN khata_transactions t ON t.id = i.transaction_id
            WHERE t.account_id = ?1
            ORDER BY i.transaction_id, i.position
            "#,
        )
        .bind(account_id)
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
            .map(|r| r.into_transaction(&mut items))
            .collect()
    }

    /// The account's running-balance statement.
    pub async fn statement(&self, account_id: &str) -> DbResult<LedgerSummary> {
        if self.get_account(account_id).await?.is_none() {
            return Err(DbError::not_found("Khata account", account_id));
        }

        let transactions = self.transactions(account_id).await?;
        Ok(summarize(&transactions))
    }
}

async fn fetch_account(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<KhataAccount>> {
    let record = sqlx::query_as::<_, AccountRecord>(
        "SELECT id, customer_name, phone, address FROM khata_accounts WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record.map(KhataAccount::from))
}

/// Inserts one transaction row with the account's next sequence number.
async fn insert_transaction(
    conn: &mut SqliteConnection,
    account_id: &str,
    date: NaiveDate,
    kind: &str,
    amount: Money,
    payment: Option<(PaymentType, Option<&str>, Option<&str>)>,
) -> DbResult<String> {
    if fetch_account(&mut *conn, account_id).await?.is_none() {
        return Err(DbError::not_found("Khata account", account_id));
    }

    let seq: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM khata_transactions WHERE account_id = ?1",
    )
    .bind(account_id)
    .fetch_one(&mut *conn)
    .await?;

    let id = Uuid::new_v4().to_string();
    let (instrument, bank_name, check_number) = match payment {
        Some((instrument, bank_name, check_number)) => (Some(instrument), bank_name, check_number),
        None => (None, None, None),
    };

    sqlx::query(
        r#"
        INSERT INTO khata_transactions (
            id, account_id, seq, kind, entry_date, amount, instrument, bank_name, check_number
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&id)
    .bind(account_id)
    .bind(seq)
    .bind(kind)
    .bind(date)
    .bind(amount.minor())
    .bind(instrument)
    .bind(bank_name)
    .bind(check_number)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================
