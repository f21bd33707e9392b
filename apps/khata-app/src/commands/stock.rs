//! # Stock Commands
//!
//! What is left on the shelf.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState};
use khata_core::{Money, StockLot};

/// Stock lot DTO for the stock table and the lot picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLotDto {
    pub id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_price_display: String,
}

impl StockLotDto {
    pub fn new(lot: &StockLot, config: &ConfigState) -> Self {
        StockLotDto {
            id: lot.id.clone(),
            product_name: lot.product_name.clone(),
            quantity: lot.quantity,
            unit_price: lot.unit_price,
            unit_price_display: config.format_currency(lot.unit_price),
        }
    }
}

/// Lots with quantity left, by product name.
pub async fn list_stock(db: &DbState, config: &ConfigState) -> Result<Vec<StockLotDto>, ApiError> {
    debug!("list_stock command");

    let lots = db.inner().stock().list_available().await?;
    Ok(lots.iter().map(|l| StockLotDto::new(l, config)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{fixture, stocked};

    #[tokio::test]
    async fn test_list_stock() {
        let fx = fixture().await;
        stocked(&fx, "Sand", 30).await;
        stocked(&fx, "Cement", 12).await;

        let lots = list_stock(&fx.db, &fx.config).await.unwrap();

        let names: Vec<&str> = lots.iter().map(|l| l.product_name.as_str()).collect();
        assert_eq!(names, vec!["Cement", "Sand"]);
        assert_eq!(lots[0].quantity, 12);
        assert_eq!(lots[0].unit_price_display, "Rs 1,000");
    }
}
