//! # khata-app: Application Layer for the Khata Ledger
//!
//! Wires the database, the shared state and the command functions together,
//! and backs the `khata` binary.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Khata Ledger                                  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Rust Backend (this crate)                     │  │
//! │  │                                                                  │  │
//! │  │  lib.rs ─────► Sets up logging, database, state                 │  │
//! │  │                                                                  │  │
//! │  │  commands/ ──► save_invoice, record_invoice_payment,            │  │
//! │  │                get_khata_statement, record_purchase, ...        │  │
//! │  │                                                                  │  │
//! │  │  state/ ─────► DbState, DraftInvoiceState, ConfigState          │  │
//! │  │                                                                  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  khata.db (local file, WAL mode)                                 │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration from the environment
//! 3. Determine database path (app data directory)
//! 4. Connect to database & run migrations
//! 5. Create state objects (DbState, DraftInvoiceState, ConfigState)
//! 6. Run the requested command

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use khata_db::{Database, DbConfig};

use crate::commands::invoice::InvoiceDto;
use crate::commands::ledger::StatementDto;
use crate::state::{ConfigState, DbState, DraftInvoiceState};

const USAGE: &str = "\
Khata Ledger

Usage: khata [COMMAND]

Commands:
  invoices              List invoices with paid, remaining and status (default)
  invoice <ID>          Show one invoice and its payment history
  accounts              List khata accounts
  statement <ID>        Print a khata statement with running balance
  stock                 List stock lots with quantity left

Environment:
  KHATA_DB_PATH         Database file (default: platform data directory)
  KHATA_SHOP_NAME       Shop name on statements
  KHATA_CURRENCY_SYMBOL Currency symbol (default: Rs)
  KHATA_NUMBER_LOCALE   Digit grouping locale (default: en)
  RUST_LOG              Log filter (default: info,khata=debug,sqlx=warn)";

/// Runs the `khata` binary with its arguments (program name excluded).
pub async fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let command = args.first().map(String::as_str).unwrap_or("invoices");
    if matches!(command, "--help" | "-h" | "help") {
        println!("{}", USAGE);
        return Ok(());
    }

    init_tracing();

    let config = ConfigState::from_env();
    info!(shop = %config.shop_name, "Starting Khata Ledger");

    let db_path = database_path()?;
    info!(?db_path, "Database path determined");

    let db = DbState::new(Database::new(DbConfig::new(db_path)).await?);
    let draft = DraftInvoiceState::default();

    let result = dispatch(command, args.get(1).map(String::as_str), &db, &draft, &config).await;
    db.inner().close().await;
    result
}

async fn dispatch(
    command: &str,
    id: Option<&str>,
    db: &DbState,
    draft: &DraftInvoiceState,
    config: &ConfigState,
) -> Result<(), Box<dyn std::error::Error>> {
    match (command, id) {
        ("invoices", _) => {
            let invoices = commands::list_invoices(db, config).await?;
            print!("{}", render_invoice_table(&invoices));
        }
        ("invoice", Some(id)) => {
            let detail = commands::get_invoice(db, config, id).await?;
            print!("{}", render_invoice_table(std::slice::from_ref(&detail.invoice)));
            for payment in &detail.payments {
                println!(
                    "  {}  {:<6} {:>14}",
                    payment.paid_on,
                    payment.instrument.as_str(),
                    config.format_currency(payment.amount)
                );
            }
        }
        ("accounts", _) => {
            for account in commands::list_khata_accounts(db).await? {
                println!("{}  {:<30} {}", account.id, account.customer_name, account.phone);
            }
        }
        ("statement", Some(id)) => {
            let statement = commands::get_khata_statement(db, config, id).await?;
            print!("{}", render_statement(&statement));
        }
        ("stock", _) => {
            commands::load_draft(db, draft, config).await?;
            for lot in commands::get_draft(draft, config).available {
                println!("{:<30} {:>6}  {}", lot.product_name, lot.quantity, lot.unit_price_display);
            }
        }
        ("invoice" | "statement", None) => {
            return Err(format!("'{}' needs an id\n\n{}", command, USAGE).into());
        }
        _ => {
            return Err(format!("unknown command '{}'\n\n{}", command, USAGE).into());
        }
    }
    Ok(())
}

/// One line per invoice: customer, date, bill, paid, remaining, status.
pub fn render_invoice_table(invoices: &[InvoiceDto]) -> String {
    let mut out = format!(
        "{:<24} {:<10} {:>14} {:>14} {:>14}  {}\n",
        "Customer", "Date", "Bill", "Paid", "Remaining", "Status"
    );
    for invoice in invoices {
        out.push_str(&format!(
            "{:<24} {:<10} {:>14} {:>14} {:>14}  {}\n",
            invoice.customer_name,
            invoice.sale_date.to_string(),
            invoice.display.total_bill,
            invoice.display.total_paid,
            invoice.display.remaining,
            invoice.status,
        ));
    }
    out
}

/// Statement header, one row per ledger row, closing balance.
pub fn render_statement(statement: &StatementDto) -> String {
    let mut out = format!(
        "{}\n{}  {}\n\n{:<10} {:<30} {:>12} {:>12} {:>14}\n",
        statement.shop_name,
        statement.account.customer_name,
        statement.account.phone,
        "Date",
        "Description",
        "Debit",
        "Credit",
        "Balance"
    );
    for row in &statement.rows {
        let debit = row.debit.map(|m| m.to_string()).unwrap_or_default();
        let credit = row.credit.map(|m| m.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "{:<10} {:<30} {:>12} {:>12} {:>14}\n",
            row.date.to_string(),
            row.description,
            debit,
            credit,
            row.balance_display
        ));
    }
    out.push_str(&format!("\nClosing balance: {}\n", statement.closing_balance_display));
    out
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=khata=trace` - Show trace for khata crates only
/// - Default: INFO, with DEBUG for the khata crates
///
/// Logs go to stderr so printed reports stay clean.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_filter());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_LOG_FILTER)
}

const DEFAULT_LOG_FILTER: &str = "info,khata=debug,sqlx=warn";

/// Determines the database file path based on the platform.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.khata.ledger/khata.db`
/// - **Windows**: `%APPDATA%\khata\ledger\data\khata.db`
/// - **Linux**: `~/.local/share/ledger/khata.db`
///
/// ## Development Override
/// Set `KHATA_DB_PATH` environment variable to use a custom path.
pub fn database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Ok(path) = std::env::var("KHATA_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("com", "khata", "ledger")
        .ok_or("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("khata.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ledger::{NewAccountInput, KhataLineInput};
    use crate::commands::test_support::{date, fixture};
    use khata_core::{PaymentForm, PaymentType};
    use tracing::Level;
    use tracing_subscriber::prelude::*;

    #[test]
    fn test_default_log_filter_levels() {
        let subscriber = tracing_subscriber::registry().with(default_log_filter());

        tracing::subscriber::with_default(subscriber, || {
            assert!(!tracing::enabled!(target: "sqlx::query", Level::DEBUG));
            assert!(tracing::enabled!(target: "sqlx::query", Level::WARN));
            assert!(!tracing::enabled!(target: "hyper", Level::TRACE));
            assert!(tracing::enabled!(target: "hyper", Level::INFO));
            assert!(tracing::enabled!(target: "khata_db::repository", Level::DEBUG));
            assert!(!tracing::enabled!(target: "khata_db::repository", Level::TRACE));
        });
    }

    #[tokio::test]
    async fn test_render_statement() {
        let fx = fixture().await;
        let account = commands::open_khata_account(
            &fx.db,
            NewAccountInput {
                customer_name: "Rashid Builders".to_string(),
                phone: "0321-7654321".to_string(),
                address: None,
            },
        )
        .await
        .unwrap();
        commands::record_khata_sale(
            &fx.db,
            &account.id,
            date(1, 5),
            vec![KhataLineInput {
                product_name: "Cement bag".to_string(),
                quantity: 20,
                unit_price: "1250".to_string(),
            }],
        )
        .await
        .unwrap();
        commands::record_khata_payment(
            &fx.db,
            &account.id,
            PaymentForm {
                payment_types: vec![PaymentType::Cash],
                cash_amount: Some("10000".to_string()),
                ..Default::default()
            },
            date(1, 20),
        )
        .await
        .unwrap();

        let statement = commands::get_khata_statement(&fx.db, &fx.config, &account.id)
            .await
            .unwrap();
        let text = render_statement(&statement);

        assert!(text.starts_with("Khata Ledger\nRashid Builders  0321-7654321\n"));
        assert!(text.contains("Cement bag x 20"));
        assert!(text.contains("Payment (cash)"));
        assert!(text.ends_with("Closing balance: Rs 15,000\n"));
    }

    #[tokio::test]
    async fn test_render_empty_invoice_table() {
        let fx = fixture().await;
        let invoices = commands::list_invoices(&fx.db, &fx.config).await.unwrap();

        let text = render_invoice_table(&invoices);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Customer"));
    }
}
