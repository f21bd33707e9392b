//! # Invoice Commands
//!
//! Saving the draft as an invoice, and the invoice list.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Save Invoice Flow                                    │
//! │                                                                         │
//! │  Customer, phone, date, bill type + payment fields                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentSubmission::from_form ── bad amount / missing bank name ──► ✗  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  InvoiceRepository::create (one transaction)                           │
//! │    • gate: initial payment <= bill total ──────────────────────────► ✗  │
//! │    • lots decremented ── lot sold out elsewhere ───────────────────► ✗  │
//! │    • invoice, items, payment events stored                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Saved draft lines forgotten, lots reloaded                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  InvoiceDto (paid, remaining, status)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::refresh_draft_stock_after_write;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState, DraftInvoiceState};
use chrono::NaiveDate;
use khata_core::{
    BillType, Invoice, InvoiceDetails, LineItem, Money, PaymentEvent, PaymentForm,
    PaymentStatus, PaymentSubmission, PaymentType,
};

/// Invoice DTO for the invoice table and detail view.
///
/// Carries the stored instrument amounts plus the derived reconciliation,
/// both raw and formatted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDto {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub sale_date: NaiveDate,
    pub bill_type: BillType,
    pub items: Vec<LineItem>,
    pub payment_types: Vec<PaymentType>,
    pub cash_amount: Money,
    pub bank_amount: Money,
    pub bank_name: Option<String>,
    pub check_amount: Money,
    pub check_number: Option<String>,
    pub total_bill: Money,
    pub total_paid: Money,
    pub remaining: Money,
    pub status: PaymentStatus,
    pub display: InvoiceAmountsDisplay,
}

/// Pre-formatted amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceAmountsDisplay {
    pub total_bill: String,
    pub total_paid: String,
    pub remaining: String,
}

impl InvoiceDto {
    pub fn new(invoice: &Invoice, config: &ConfigState) -> Self {
        let summary = invoice.reconciliation();
        InvoiceDto {
            id: invoice.id.clone(),
            customer_name: invoice.customer_name.clone(),
            phone: invoice.phone.clone(),
            sale_date: invoice.sale_date,
            bill_type: invoice.bill_type,
            items: invoice.items.clone(),
            payment_types: invoice.payment_types.iter().copied().collect(),
            cash_amount: invoice.instruments.cash,
            bank_amount: invoice.instruments.bank,
            bank_name: invoice.instruments.bank_name.clone(),
            check_amount: invoice.instruments.check,
            check_number: invoice.instruments.check_number.clone(),
            total_bill: summary.total_bill,
            total_paid: summary.total_paid,
            remaining: summary.remaining,
            status: summary.status,
            display: InvoiceAmountsDisplay {
                total_bill: config.format_currency(summary.total_bill),
                total_paid: config.format_currency(summary.total_paid),
                remaining: config.format_currency(summary.remaining),
            },
        }
    }
}

/// An invoice with its payment history, oldest payment first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetailResponse {
    pub invoice: InvoiceDto,
    pub payments: Vec<PaymentEvent>,
}

/// Saves the draft as an invoice with an optional initial payment.
///
/// ## Errors
/// - `DRAFT_ERROR` when the draft has no lines
/// - `PAYMENT_ERROR` when the initial payment exceeds the bill
/// - `VALIDATION_ERROR` for bad customer fields or payment amounts
/// - `INSUFFICIENT_STOCK` when a lot sold out since it was picked
///
/// On error the draft keeps its lines. Lines added while the save was in
/// flight stay on the draft. Once the invoice is stored, a failed lot
/// reload is only logged.
pub async fn save_invoice(
    db: &DbState,
    draft: &DraftInvoiceState,
    config: &ConfigState,
    details: InvoiceDetails,
    payment: PaymentForm,
) -> Result<InvoiceDto, ApiError> {
    debug!(customer = %details.customer_name, "save_invoice command");

    let submission = PaymentSubmission::from_form(&payment)?;
    let lines = draft.with_draft(|d| d.lines().to_vec());

    let invoice = db
        .inner()
        .invoices()
        .create(&details, &lines, &submission)
        .await?;

    draft.with_draft_mut(|d| d.mark_saved(&lines));
    refresh_draft_stock_after_write(db, draft).await;

    Ok(InvoiceDto::new(&invoice, config))
}

/// All invoices, newest sale first.
pub async fn list_invoices(db: &DbState, config: &ConfigState) -> Result<Vec<InvoiceDto>, ApiError> {
    debug!("list_invoices command");

    let invoices = db.inner().invoices().list().await?;
    Ok(invoices.iter().map(|i| InvoiceDto::new(i, config)).collect())
}

pub async fn get_invoice(
    db: &DbState,
    config: &ConfigState,
    invoice_id: &str,
) -> Result<InvoiceDetailResponse, ApiError> {
    debug!(invoice_id = %invoice_id, "get_invoice command");

    let invoice = db
        .inner()
        .invoices()
        .get_by_id(invoice_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", invoice_id))?;
    let payments = db.inner().invoices().payments(invoice_id).await?;

    Ok(InvoiceDetailResponse {
        invoice: InvoiceDto::new(&invoice, config),
        payments,
    })
}

/// Deletes an invoice. Its quantities go back to their lots.
pub async fn delete_invoice(
    db: &DbState,
    draft: &DraftInvoiceState,
    invoice_id: &str,
) -> Result<(), ApiError> {
    debug!(invoice_id = %invoice_id, "delete_invoice command");

    db.inner().invoices().delete(invoice_id).await?;
    refresh_draft_stock_after_write(db, draft).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::draft::{add_draft_line, get_draft, load_draft, AddLineInput};
    use crate::commands::test_support::{date, fixture, rs, stocked, Fixture};
    use crate::error::ErrorCode;

    fn details(customer: &str) -> InvoiceDetails {
        InvoiceDetails {
            customer_name: customer.to_string(),
            phone: "0300-1234567".to_string(),
            sale_date: date(3, 15),
            bill_type: BillType::Perfect,
        }
    }

    fn bank_form(amount: &str) -> PaymentForm {
        PaymentForm {
            payment_types: vec![PaymentType::Bank],
            bank_amount: Some(amount.to_string()),
            bank_name: Some("HBL".to_string()),
            ..Default::default()
        }
    }

    async fn draft_cement(fx: &Fixture, qty: i64) -> String {
        let lot = stocked(fx, "Cement", 100).await;
        load_draft(&fx.db, &fx.draft, &fx.config).await.unwrap();
        add_draft_line(
            &fx.draft,
            &fx.config,
            AddLineInput {
                lot_id: lot.id.clone(),
                quantity: qty,
                unit_price: "1000".to_string(),
            },
        )
        .unwrap();
        lot.id
    }

    #[tokio::test]
    async fn test_save_partially_paid() {
        let fx = fixture().await;
        draft_cement(&fx, 34).await;

        let saved = save_invoice(&fx.db, &fx.draft, &fx.config, details("Haji Bashir"), bank_form("20,000"))
            .await
            .unwrap();

        assert_eq!(saved.total_bill, rs(34_000));
        assert_eq!(saved.total_paid, rs(20_000));
        assert_eq!(saved.remaining, rs(14_000));
        assert_eq!(saved.status, PaymentStatus::PartiallyPaid);
        assert_eq!(saved.payment_types, vec![PaymentType::Bank]);
        assert_eq!(saved.display.remaining, "Rs 14,000");

        let draft = get_draft(&fx.draft, &fx.config);
        assert!(draft.lines.is_empty());
        assert_eq!(draft.available[0].quantity, 66);

        let detail = get_invoice(&fx.db, &fx.config, &saved.id).await.unwrap();
        assert_eq!(detail.invoice.items.len(), 1);
        assert_eq!(detail.payments.len(), 1);
        assert_eq!(detail.payments[0].bank_name.as_deref(), Some("HBL"));
    }

    #[tokio::test]
    async fn test_line_added_during_save_stays_on_draft() {
        let fx = fixture().await;
        let cement = stocked(&fx, "Cement", 100).await;
        let sand = stocked(&fx, "Sand", 50).await;
        load_draft(&fx.db, &fx.draft, &fx.config).await.unwrap();
        add_draft_line(
            &fx.draft,
            &fx.config,
            AddLineInput {
                lot_id: cement.id.clone(),
                quantity: 10,
                unit_price: "1000".to_string(),
            },
        )
        .unwrap();

        let (saved, added) = tokio::join!(
            save_invoice(&fx.db, &fx.draft, &fx.config, details("Haji Bashir"), PaymentForm::default()),
            async {
                add_draft_line(
                    &fx.draft,
                    &fx.config,
                    AddLineInput {
                        lot_id: sand.id.clone(),
                        quantity: 5,
                        unit_price: "300".to_string(),
                    },
                )
            }
        );
        let saved = saved.unwrap();
        added.unwrap();

        assert_eq!(saved.items.len(), 1);
        assert_eq!(saved.items[0].product_name, "Cement");

        let draft = get_draft(&fx.draft, &fx.config);
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].lot_id, sand.id);
        assert_eq!(draft.total, rs(1_500));

        let quantity_of = |id: &str| draft.available.iter().find(|l| l.id == id).map(|l| l.quantity);
        assert_eq!(quantity_of(&cement.id), Some(90));
        assert_eq!(quantity_of(&sand.id), Some(45));
    }

    #[tokio::test]
    async fn test_save_rejects_overpayment_and_keeps_draft() {
        let fx = fixture().await;
        draft_cement(&fx, 10).await;

        let err = save_invoice(&fx.db, &fx.draft, &fx.config, details("Rashid"), bank_form("10,001"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        assert_eq!(get_draft(&fx.draft, &fx.config).lines.len(), 1);
        assert!(list_invoices(&fx.db, &fx.config).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_empty_draft() {
        let fx = fixture().await;

        let err = save_invoice(&fx.db, &fx.draft, &fx.config, details("Rashid"), PaymentForm::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DraftError);
    }

    #[tokio::test]
    async fn test_unpaid_then_delete_restores_stock() {
        let fx = fixture().await;
        draft_cement(&fx, 25).await;

        let saved = save_invoice(&fx.db, &fx.draft, &fx.config, details("Walk-in"), PaymentForm::default())
            .await
            .unwrap();
        assert_eq!(saved.status, PaymentStatus::Unpaid);
        assert_eq!(saved.remaining, rs(25_000));

        delete_invoice(&fx.db, &fx.draft, &saved.id).await.unwrap();

        assert_eq!(get_draft(&fx.draft, &fx.config).available[0].quantity, 100);
        let err = get_invoice(&fx.db, &fx.config, &saved.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
