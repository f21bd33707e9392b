//! # Stock Lots
//!
//! Bookkeeping for the list of lots an in-progress invoice can sell from.
//!
//! ```text
//! add line (qty 3)          remove line (qty 3)
//!      │                          │
//!      ▼                          ▼
//! take_from_lot             restore_to_lot
//!  lot.qty -= 3              lot.qty += 3
//!  qty == 0? drop lot        lot gone? put it back
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::StockLot;
use crate::validation;

/// Lots that still have something to sell.
pub fn available(lots: &[StockLot]) -> Vec<StockLot> {
    lots.iter().filter(|l| !l.is_exhausted()).cloned().collect()
}

/// Takes `qty` units from the lot with `lot_id`.
///
/// The lot leaves the list when it reaches zero. Returns the lot as it was
/// before the decrement, so the caller can restore it later.
pub fn take_from_lot(lots: &mut Vec<StockLot>, lot_id: &str, qty: i64) -> CoreResult<StockLot> {
    validation::validate_quantity(qty)?;

    let pos = lots
        .iter()
        .position(|l| l.id == lot_id)
        .ok_or_else(|| CoreError::LotNotFound(lot_id.to_string()))?;

    let lot = &mut lots[pos];
    if lot.quantity < qty {
        return Err(CoreError::InsufficientStock {
            product: lot.product_name.clone(),
            available: lot.quantity,
            requested: qty,
        });
    }

    let before = lot.clone();
    lot.quantity -= qty;

    if lot.is_exhausted() {
        lots.remove(pos);
    }

    Ok(before)
}

/// Puts `qty` units back on `origin`'s lot, re-adding the lot if it had been
/// exhausted.
pub fn restore_to_lot(lots: &mut Vec<StockLot>, origin: &StockLot, qty: i64) {
    match lots.iter_mut().find(|l| l.id == origin.id) {
        Some(lot) => lot.quantity += qty,
        None => lots.push(StockLot {
            quantity: qty,
            ..origin.clone()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn lot(id: &str, qty: i64) -> StockLot {
        StockLot {
            id: id.to_string(),
            purchase_id: None,
            product_name: format!("Product {}", id),
            quantity: qty,
            unit_price: Money::from_major(100),
        }
    }

    #[test]
    fn test_take_decrements() {
        let mut lots = vec![lot("a", 10)];
        let before = take_from_lot(&mut lots, "a", 4).unwrap();

        assert_eq!(before.quantity, 10);
        assert_eq!(lots[0].quantity, 6);
    }

    #[test]
    fn test_take_all_removes_lot() {
        let mut lots = vec![lot("a", 5), lot("b", 1)];
        take_from_lot(&mut lots, "a", 5).unwrap();

        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].id, "b");
    }

    #[test]
    fn test_take_more_than_available() {
        let mut lots = vec![lot("a", 2)];
        let err = take_from_lot(&mut lots, "a", 3).unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 2, requested: 3, .. }
        ));
        assert_eq!(lots[0].quantity, 2);
    }

    #[test]
    fn test_take_unknown_lot() {
        let mut lots = vec![lot("a", 2)];
        assert!(matches!(
            take_from_lot(&mut lots, "zzz", 1),
            Err(CoreError::LotNotFound(_))
        ));
    }

    #[test]
    fn test_restore_after_exhaustion() {
        let mut lots = vec![lot("a", 3)];
        let origin = take_from_lot(&mut lots, "a", 3).unwrap();
        assert!(lots.is_empty());

        restore_to_lot(&mut lots, &origin, 3);
        assert_eq!(lots, vec![lot("a", 3)]);
    }

    #[test]
    fn test_restore_partial() {
        let mut lots = vec![lot("a", 3)];
        let origin = take_from_lot(&mut lots, "a", 1).unwrap();
        restore_to_lot(&mut lots, &origin, 1);
        assert_eq!(lots[0].quantity, 3);
    }

    #[test]
    fn test_available_filters_exhausted() {
        let lots = vec![lot("a", 0), lot("b", 4)];
        let open = available(&lots);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "b");
    }
}
