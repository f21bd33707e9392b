//! # Commands Module
//!
//! All commands exposed to the dashboard.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports, shared helpers)
//! ├── stock.rs     ◄─── Sellable stock lots
//! ├── draft.rs     ◄─── Draft invoice lines
//! ├── invoice.rs   ◄─── Save, list, view, delete invoices
//! ├── payment.rs   ◄─── Top-up payments through the gate
//! ├── ledger.rs    ◄─── Khata accounts and statements
//! └── purchase.rs  ◄─── Supplier purchases
//! ```
//!
//! ## State Injection
//! Each command takes only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn list_purchases(db: &DbState)
//!
//! // Only needs the draft
//! fn remove_draft_line(draft: &DraftInvoiceState, config: &ConfigState, index: usize)
//!
//! // Needs both
//! async fn save_invoice(db: &DbState, draft: &DraftInvoiceState, config: &ConfigState, ..)
//! ```
//!
//! Every command returns `Result<Dto, ApiError>`; DTOs serialize in
//! camelCase for the dashboard.

pub mod draft;
pub mod invoice;
pub mod ledger;
pub mod payment;
pub mod purchase;
pub mod stock;

pub use draft::{add_draft_line, clear_draft, get_draft, load_draft, remove_draft_line};
pub use invoice::{delete_invoice, get_invoice, list_invoices, save_invoice};
pub use ledger::{
    get_khata_statement, list_khata_accounts, open_khata_account, record_khata_payment,
    record_khata_sale,
};
pub use payment::{list_invoice_payments, record_invoice_payment};
pub use purchase::{delete_purchase, list_purchases, record_purchase};
pub use stock::list_stock;

use khata_core::Money;
use tracing::warn;

use crate::error::ApiError;
use crate::state::{DbState, DraftInvoiceState};

/// Parses an amount typed into a form field.
pub(crate) fn parse_amount(field: &str, input: &str) -> Result<Money, ApiError> {
    Money::parse(field, input).map_err(|e| ApiError::validation(e.to_string()))
}

/// Re-reads the sellable lots into the draft after stock changed underneath it.
pub(crate) async fn refresh_draft_stock(
    db: &DbState,
    draft: &DraftInvoiceState,
) -> Result<(), ApiError> {
    let lots = db.inner().stock().list_available().await?;
    draft.with_draft_mut(|d| d.reload_stock(lots));
    Ok(())
}

/// [`refresh_draft_stock`] for commands whose own write has already
/// committed. A failed reload is logged; the draft keeps its old lot list.
pub(crate) async fn refresh_draft_stock_after_write(db: &DbState, draft: &DraftInvoiceState) {
    if let Err(err) = refresh_draft_stock(db, draft).await {
        warn!(error = %err, "Draft stock could not be reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{fixture, stocked};
    use super::*;

    #[tokio::test]
    async fn test_reload_failure_after_write_is_not_an_error() {
        let fx = fixture().await;
        stocked(&fx, "Cement", 10).await;
        refresh_draft_stock(&fx.db, &fx.draft).await.unwrap();

        fx.db.inner().close().await;

        assert!(refresh_draft_stock(&fx.db, &fx.draft).await.is_err());
        refresh_draft_stock_after_write(&fx.db, &fx.draft).await;
        assert_eq!(fx.draft.with_draft(|d| d.available().len()), 1);
    }
}
