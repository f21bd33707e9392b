//! # Khata Commands
//!
//! Credit accounts: goods taken on credit, money received, and the
//! statement with its running balance.
//!
//! ## Statement Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Haji Bashir                                  0300-1234567             │
//! ├────────────┬──────────────────────────┬──────────┬─────────┬──────────┤
//! │ Date       │ Description              │ Debit    │ Credit  │ Balance  │
//! ├────────────┼──────────────────────────┼──────────┼─────────┼──────────┤
//! │ 2024-01-05 │ Cement bag x 20          │ 25,000   │         │ 25,000   │
//! │ 2024-01-12 │ Sand x 100               │  5,000   │         │ 30,000   │
//! │ 2024-02-01 │ Payment (cash)           │          │ 20,000  │ 10,000   │
//! ├────────────┴──────────────────────────┴──────────┴─────────┴──────────┤
//! │ Closing balance                                            10,000     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payments are not checked against the balance: an account can run into
//! credit (negative balance).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parse_amount;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use khata_core::{
    KhataAccount, LedgerEntry, LedgerRow, LedgerTransaction, LineItem, Money, PaymentForm,
    PaymentSubmission,
};

/// Input for opening an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountInput {
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// One line of a credit sale, as typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KhataLineInput {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: String,
}

/// One statement row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRowDto {
    pub date: NaiveDate,
    pub description: String,
    pub debit: Option<Money>,
    pub credit: Option<Money>,
    pub balance: Money,
    pub balance_display: String,
}

impl StatementRowDto {
    fn new(row: &LedgerRow, config: &ConfigState) -> Self {
        let (description, debit, credit) = match &row.entry {
            LedgerEntry::Sale(item) => (
                format!("{} x {}", item.product_name, item.quantity),
                Some(item.line_total),
                None,
            ),
            LedgerEntry::Payment { amount, instrument } => {
                (format!("Payment ({})", instrument), None, Some(*amount))
            }
        };

        StatementRowDto {
            date: row.date,
            description,
            debit,
            credit,
            balance: row.balance,
            balance_display: config.format_currency(row.balance),
        }
    }
}

/// A khata statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementDto {
    pub shop_name: String,
    pub account: KhataAccount,
    pub rows: Vec<StatementRowDto>,
    pub total_sales: Money,
    pub total_paid: Money,
    pub closing_balance: Money,
    pub closing_balance_display: String,
}

pub async fn open_khata_account(
    db: &DbState,
    input: NewAccountInput,
) -> Result<KhataAccount, ApiError> {
    debug!(customer = %input.customer_name, "open_khata_account command");

    let account = KhataAccount::new(&input.customer_name, &input.phone, input.address.as_deref())?;
    db.inner().khata().create_account(&account).await?;
    Ok(account)
}

pub async fn list_khata_accounts(db: &DbState) -> Result<Vec<KhataAccount>, ApiError> {
    debug!("list_khata_accounts command");
    Ok(db.inner().khata().list_accounts().await?)
}

/// Records goods taken on credit. Raises the balance by the sale total.
pub async fn record_khata_sale(
    db: &DbState,
    account_id: &str,
    date: NaiveDate,
    lines: Vec<KhataLineInput>,
) -> Result<LedgerTransaction, ApiError> {
    debug!(account_id = %account_id, lines = lines.len(), "record_khata_sale command");

    let items = lines
        .iter()
        .map(|l| -> Result<LineItem, ApiError> {
            let unit_price = parse_amount("unit price", &l.unit_price)?;
            Ok(LineItem::new(l.product_name.as_str(), l.quantity, unit_price)?)
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(db.inner().khata().record_sale(account_id, date, &items).await?)
}

/// Records money received. Lowers the balance by the amounts paid.
pub async fn record_khata_payment(
    db: &DbState,
    account_id: &str,
    form: PaymentForm,
    paid_on: NaiveDate,
) -> Result<Vec<LedgerTransaction>, ApiError> {
    debug!(account_id = %account_id, types = ?form.payment_types, "record_khata_payment command");

    let submission = PaymentSubmission::from_form(&form)?;
    Ok(db
        .inner()
        .khata()
        .record_payment(account_id, &submission, paid_on)
        .await?)
}

/// The account's statement, one row per sale line and per payment.
pub async fn get_khata_statement(
    db: &DbState,
    config: &ConfigState,
    account_id: &str,
) -> Result<StatementDto, ApiError> {
    debug!(account_id = %account_id, "get_khata_statement command");

    let account = db
        .inner()
        .khata()
        .get_account(account_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Khata account", account_id))?;
    let summary = db.inner().khata().statement(account_id).await?;

    Ok(StatementDto {
        shop_name: config.shop_name.clone(),
        account,
        rows: summary
            .rows
            .iter()
            .map(|r| StatementRowDto::new(r, config))
            .collect(),
        total_sales: summary.total_sales,
        total_paid: summary.total_paid,
        closing_balance: summary.closing_balance,
        closing_balance_display: config.format_currency(summary.closing_balance),
    })
}
