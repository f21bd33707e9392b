//! # Purchase Commands
//!
//! Stock bought from suppliers. Each purchase becomes one sellable lot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{parse_amount, refresh_draft_stock_after_write};
use crate::error::ApiError;
use crate::state::{DbState, DraftInvoiceState};
use khata_core::Purchase;

/// Purchase form input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInput {
    pub supplier: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: String,
    pub purchase_date: NaiveDate,
}

/// Records a purchase and shelves its lot. The draft sees the new lot
/// straight away.
pub async fn record_purchase(
    db: &DbState,
    draft: &DraftInvoiceState,
    input: PurchaseInput,
) -> Result<Purchase, ApiError> {
    debug!(supplier = %input.supplier, product = %input.product_name, "record_purchase command");

    let unit_price = parse_amount("unit price", &input.unit_price)?;
    let purchase = Purchase::new(
        &input.supplier,
        &input.product_name,
        input.quantity,
        unit_price,
        input.purchase_date,
    )?;

    db.inner().purchases().insert(&purchase).await?;
    refresh_draft_stock_after_write(db, draft).await;

    Ok(purchase)
}

/// All purchases, newest first.
pub async fn list_purchases(db: &DbState) -> Result<Vec<Purchase>, ApiError> {
    debug!("list_purchases command");
    Ok(db.inner().purchases().list().await?)
}

/// Deletes a purchase and its lot.
pub async fn delete_purchase(
    db: &DbState,
    draft: &DraftInvoiceState,
    purchase_id: &str,
) -> Result<(), ApiError> {
    debug!(purchase_id = %purchase_id, "delete_purchase command");

    db.inner().purchases().delete(purchase_id).await?;
    refresh_draft_stock_after_write(db, draft).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::draft::get_draft;
    use crate::commands::test_support::{date, fixture, rs};
    use crate::error::ErrorCode;

    fn input(product: &str, quantity: i64, unit_price: &str) -> PurchaseInput {
        PurchaseInput {
            supplier: "Lucky Cement Depot".to_string(),
            product_name: product.to_string(),
            quantity,
            unit_price: unit_price.to_string(),
            purchase_date: date(2, 1),
        }
    }

    #[tokio::test]
    async fn test_purchase_reaches_draft() {
        let fx = fixture().await;

        let purchase = record_purchase(&fx.db, &fx.draft, input("Cement bag", 400, "1,150"))
            .await
            .unwrap();
        assert_eq!(purchase.total_price, rs(460_000));

        let draft = get_draft(&fx.draft, &fx.config);
        assert_eq!(draft.available.len(), 1);
        assert_eq!(draft.available[0].quantity, 400);

        delete_purchase(&fx.db, &fx.draft, &purchase.id).await.unwrap();
        assert!(get_draft(&fx.draft, &fx.config).available.is_empty());
        assert!(list_purchases(&fx.db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purchase_validation() {
        let fx = fixture().await;

        let err = record_purchase(&fx.db, &fx.draft, input("Cement bag", 0, "100"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = record_purchase(&fx.db, &fx.draft, input("", 1, "100"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = record_purchase(&fx.db, &fx.draft, input("Cement bag", 9_999, "92233720368547758"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(list_purchases(&fx.db).await.unwrap().is_empty());

        let err = delete_purchase(&fx.db, &fx.draft, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
