//! # Payment Commands
//!
//! Top-up payments against a saved invoice.
//!
//! ## Payment Dialog Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Bill 34,000 │ Paid 20,000 │ Remaining 14,000 │ Partially Paid         │
//! │                                                                         │
//! │  [x] Check   amount [15,000]  number [000417]                          │
//! │                                                                         │
//! │  record_invoice_payment(..)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  15,000 > 14,000 ──► PAYMENT_ERROR, nothing stored                     │
//! │                                                                         │
//! │  [x] Check   amount [14,000]  number [000417]                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Stored ──► Paid 34,000 │ Remaining 0 │ Fully Paid                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::invoice::InvoiceDto;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use khata_core::{PaymentEvent, PaymentForm, PaymentSubmission};

/// The invoice after the payment, and what was appended to its history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub invoice: InvoiceDto,
    pub recorded: Vec<PaymentEvent>,
}

/// Records a payment against an invoice's remaining balance.
///
/// ## Errors
/// - `PAYMENT_ERROR` when no instrument is selected or the amounts add up
///   to more than the remaining balance
/// - `VALIDATION_ERROR` for unreadable amounts or a missing bank name or
///   check number
/// - `NOT_FOUND` when the invoice does not exist
pub async fn record_invoice_payment(
    db: &DbState,
    config: &ConfigState,
    invoice_id: &str,
    form: PaymentForm,
    paid_on: NaiveDate,
) -> Result<PaymentResponse, ApiError> {
    debug!(invoice_id = %invoice_id, types = ?form.payment_types, "record_invoice_payment command");

    let submission = PaymentSubmission::from_form(&form)?;
    let (invoice, recorded) = db
        .inner()
        .invoices()
        .record_payment(invoice_id, &submission, paid_on)
        .await?;

    Ok(PaymentResponse {
        invoice: InvoiceDto::new(&invoice, config),
        recorded,
    })
}

/// Payment history of an invoice, oldest first.
pub async fn list_invoice_payments(
    db: &DbState,
    invoice_id: &str,
) -> Result<Vec<PaymentEvent>, ApiError> {
    debug!(invoice_id = %invoice_id, "list_invoice_payments command");

    if db.inner().invoices().get_by_id(invoice_id).await?.is_none() {
        return Err(ApiError::not_found("Invoice", invoice_id));
    }
    Ok(db.inner().invoices().payments(invoice_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::draft::{add_draft_line, load_draft, AddLineInput};
    use crate::commands::invoice::save_invoice;
    use crate::commands::test_support::{date, fixture, rs, stocked, Fixture};
    use crate::error::ErrorCode;
    use khata_core::{BillType, InvoiceDetails, PaymentStatus, PaymentType};

    fn form(instrument: PaymentType, amount: &str) -> PaymentForm {
        let amount = Some(amount.to_string());
        match instrument {
            PaymentType::Cash => PaymentForm {
                payment_types: vec![PaymentType::Cash],
                cash_amount: amount,
                ..Default::default()
            },
            PaymentType::Bank => PaymentForm {
                payment_types: vec![PaymentType::Bank],
                bank_amount: amount,
                bank_name: Some("Meezan Bank".to_string()),
                ..Default::default()
            },
            PaymentType::Check => PaymentForm {
                payment_types: vec![PaymentType::Check],
                check_amount: amount,
                check_number: Some("000417".to_string()),
                ..Default::default()
            },
        }
    }

    /// Saves a Rs 34,000 invoice with Rs 20,000 paid by bank.
    async fn invoice_34k(fx: &Fixture) -> String {
        let lot = stocked(fx, "Cement", 50).await;
        load_draft(&fx.db, &fx.draft, &fx.config).await.unwrap();
        add_draft_line(
            &fx.draft,
            &fx.config,
            AddLineInput {
                lot_id: lot.id,
                quantity: 34,
                unit_price: "1000".to_string(),
            },
        )
        .unwrap();

        let details = InvoiceDetails {
            customer_name: "Tariq Contractor".to_string(),
            phone: "0333-5550101".to_string(),
            sale_date: date(3, 1),
            bill_type: BillType::Perfect,
        };
        save_invoice(&fx.db, &fx.draft, &fx.config, details, form(PaymentType::Bank, "20000"))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_gate_then_settle() {
        let fx = fixture().await;
        let id = invoice_34k(&fx).await;

        let err = record_invoice_payment(&fx.db, &fx.config, &id, form(PaymentType::Check, "15,000"), date(3, 10))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
        assert_eq!(
            err.message,
            "Payment of 15,000 exceeds the remaining balance of 14,000"
        );

        let response = record_invoice_payment(&fx.db, &fx.config, &id, form(PaymentType::Check, "14,000"), date(3, 10))
            .await
            .unwrap();
        assert_eq!(response.invoice.total_paid, rs(34_000));
        assert_eq!(response.invoice.remaining, rs(0));
        assert_eq!(response.invoice.status, PaymentStatus::FullyPaid);
        assert_eq!(response.recorded.len(), 1);
        assert_eq!(response.recorded[0].check_number.as_deref(), Some("000417"));

        let history = list_invoice_payments(&fx.db, &id).await.unwrap();
        let amounts: Vec<_> = history.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![rs(20_000), rs(14_000)]);
    }

    #[tokio::test]
    async fn test_fully_paid_rejects_any_top_up() {
        let fx = fixture().await;
        let id = invoice_34k(&fx).await;
        record_invoice_payment(&fx.db, &fx.config, &id, form(PaymentType::Cash, "14000"), date(3, 2))
            .await
            .unwrap();

        let err = record_invoice_payment(&fx.db, &fx.config, &id, form(PaymentType::Cash, "1"), date(3, 3))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);
    }

    #[tokio::test]
    async fn test_form_errors() {
        let fx = fixture().await;
        let id = invoice_34k(&fx).await;

        let err = record_invoice_payment(&fx.db, &fx.config, &id, PaymentForm::default(), date(3, 2))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let no_bank_name = PaymentForm {
            payment_types: vec![PaymentType::Bank],
            bank_amount: Some("500".to_string()),
            ..Default::default()
        };
        let err = record_invoice_payment(&fx.db, &fx.config, &id, no_bank_name, date(3, 2))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = record_invoice_payment(&fx.db, &fx.config, "missing", form(PaymentType::Cash, "1"), date(3, 2))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let detail = list_invoice_payments(&fx.db, &id).await.unwrap();
        assert_eq!(detail.len(), 1);
    }
}
