//! # Purchase Repository
//!
//! Stock bought from suppliers. Every purchase puts one lot on the shelf.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use khata_core::{Money, Purchase, StockLot};

#[derive(Debug, Clone, sqlx::FromRow)]
struct PurchaseRecord {
    id: String,
    supplier: String,
    product_name: String,
    quantity: i64,
    unit_price: i64,
    total_price: i64,
    purchase_date: NaiveDate,
}

impl From<PurchaseRecord> for Purchase {
    fn from(r: PurchaseRecord) -> Self {
        Purchase {
            id: r.id,
            supplier: r.supplier,
            product_name: r.product_name,
            quantity: r.quantity,
            unit_price: Money::from_minor(r.unit_price),
            total_price: Money::from_minor(r.total_price),
            purchase_date: r.purchase_date,
        }
    }
}

/// Repository for purchase database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Stores a purchase and the stock lot it creates, in one transaction.
    ///
    /// ## Returns
    /// The new lot.
    pub async fn insert(&self, purchase: &Purchase) -> DbResult<StockLot> {
        debug!(id = %purchase.id, product = %purchase.product_name, qty = purchase.quantity, "Inserting purchase");

        let lot = purchase.to_stock_lot();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO purchases (
                id, supplier, product_name, quantity,
                unit_price, total_price, purchase_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&purchase.id)
        .bind(&purchase.supplier)
        .bind(&purchase.product_name)
        .bind(purchase.quantity)
        .bind(purchase.unit_price.minor())
        .bind(purchase.total_price.minor())
        .bind(purchase.purchase_date)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO stock_lots (id, purchase_id, product_name, quantity, unit_price)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&lot.id)
        .bind(&lot.purchase_id)
        .bind(&lot.product_name)
        .bind(lot.quantity)
        .bind(lot.unit_price.minor())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(purchase_id = %purchase.id, lot_id = %lot.id, "Purchase stocked");
        Ok(lot)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Purchase>> {
        let record = sqlx::query_as::<_, PurchaseRecord>(
            r#"
            SELECT id, supplier, product_name, quantity, unit_price, total_price, purchase_date
            FROM purchases
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Purchase::from))
    }

    /// All purchases, newest first.
    pub async fn list(&self) -> DbResult<Vec<Purchase>> {
        let records = sqlx::query_as::<_, PurchaseRecord>(
            r#"
            SELECT id, supplier, product_name, quantity, unit_price, total_price, purchase_date
            FROM purchases
            ORDER BY purchase_date DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Purchase::from).collect())
    }

    /// Deletes a purchase together with its stock lot.
    ///
    /// Invoices that already sold from the lot keep their lines.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Purchase", id));
        }

        info!(purchase_id = %id, "Purchase deleted");
        Ok(())
    }
}
