//! # Stock Repository
//!
//! Sellable stock lots.
//!
//! ## Decrement Rule
//! ```text
//! UPDATE stock_lots SET quantity = quantity - :qty
//!  WHERE id = :lot AND quantity >= :qty
//!
//!   1 row  → sold
//!   0 rows → lot missing (LotNotFound) or too little left (InsufficientStock)
//! ```
//!
//! The check and the write are one statement, so two invoices racing for the
//! last units cannot both win. Lots at zero stay in the table and drop out of
//! [`StockRepository::list_available`].

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;
use khata_core::{CoreError, Money, StockLot};

#[derive(Debug, Clone, sqlx::FromRow)]
struct StockLotRecord {
    id: String,
    purchase_id: Option<String>,
    product_name: String,
    quantity: i64,
    unit_price: i64,
}

impl From<StockLotRecord> for StockLot {
    fn from(r: StockLotRecord) -> Self {
        StockLot {
            id: r.id,
            purchase_id: r.purchase_id,
            product_name: r.product_name,
            quantity: r.quantity,
            unit_price: Money::from_minor(r.unit_price),
        }
    }
}

/// Repository for stock lot queries.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Lots with something left to sell, by product then age.
    pub async fn list_available(&self) -> DbResult<Vec<StockLot>> {
        let records = sqlx::query_as::<_, StockLotRecord>(
            r#"
            SELECT id, purchase_id, product_name, quantity, unit_price
            FROM stock_lots
            WHERE quantity > 0
            ORDER BY product_name, created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(StockLot::from).collect())
    }

    /// A lot by id, including exhausted ones.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockLot>> {
        let mut conn = self.pool.acquire().await?;
        fetch_lot(&mut *conn, id).await
    }
}

async fn fetch_lot(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<StockLot>> {
    let record = sqlx::query_as::<_, StockLotRecord>(
        r#"
        SELECT id, purchase_id, product_name, quantity, unit_price
        FROM stock_lots
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record.map(StockLot::from))
}

/// Takes `qty` units off a lot inside the caller's transaction.
pub(crate) async fn take(conn: &mut SqliteConnection, lot_id: &str, qty: i64) -> DbResult<()> {
    debug!(lot_id = %lot_id, qty, "Decrementing stock lot");

    let result = sqlx::query(
        r#"
        UPDATE stock_lots
        SET quantity = quantity - ?2
        WHERE id = ?1 AND quantity >= ?2
        "#,
    )
    .bind(lot_id)
    .bind(qty)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let err = match fetch_lot(conn, lot_id).await? {
        Some(lot) => CoreError::InsufficientStock {
            product: lot.product_name,
            available: lot.quantity,
            requested: qty,
        },
        None => CoreError::LotNotFound(lot_id.to_string()),
    };
    Err(err.into())
}

/// Puts `qty` units back on a lot inside the caller's transaction.
///
/// A lot whose purchase has since been deleted is skipped.
pub(crate) async fn restore(conn: &mut SqliteConnection, lot_id: &str, qty: i64) -> DbResult<()> {
    let result = sqlx::query("UPDATE stock_lots SET quantity = quantity + ?2 WHERE id = ?1")
        .bind(lot_id)
        .bind(qty)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        warn!(lot_id = %lot_id, qty, "Stock lot no longer exists, quantity not restored");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::test_support::{database, stocked};

    #[tokio::test]
    async fn test_list_available_hides_exhausted() {
        let db = database().await;
        let cement = stocked(&db, "Cement", 2).await;
        let sand = stocked(&db, "Sand", 3).await;

        let mut conn = db.pool().acquire().await.unwrap();
        take(&mut conn, &cement.id, 2).await.unwrap();
        drop(conn);

        let lots = db.stock().list_available().await.unwrap();
        assert_eq!(lots, vec![sand]);

        let exhausted = db.stock().get_by_id(&cement.id).await.unwrap().unwrap();
        assert_eq!(exhausted.quantity, 0);
    }

    #[tokio::test]
    async fn test_take_more_than_available() {
        let db = database().await;
        let lot = stocked(&db, "Tiles", 4).await;

        let mut conn = db.pool().acquire().await.unwrap();
        let err = take(&mut conn, &lot.id, 5).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 4, requested: 5, .. })
        ));

        let err = take(&mut conn, "missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::LotNotFound(_))));
        drop(conn);

        assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_restore() {
        let db = database().await;
        let lot = stocked(&db, "Paint", 1).await;

        let mut conn = db.pool().acquire().await.unwrap();
        take(&mut conn, &lot.id, 1).await.unwrap();
        restore(&mut conn, &lot.id, 1).await.unwrap();
        restore(&mut conn, "gone", 1).await.unwrap();
        drop(conn);

        assert_eq!(db.stock().list_available().await.unwrap(), vec![lot]);
    }
}
