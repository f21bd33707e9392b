//! # Domain Types
//!
//! Plain records shared by invoices, stock and khata accounts.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Purchase     │──►│    StockLot     │──►│    LineItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  supplier       │   │  purchase_id    │   │  product_name   │       │
//! │  │  product_name   │   │  quantity       │   │  quantity       │       │
//! │  │  total_price    │   │  unit_price     │   │  line_total     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  PaymentEvent   │   │  PaymentType    │   │    BillType     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  paid_on        │   │  Cash           │   │  Perfect        │       │
//! │  │  amount         │   │  Bank           │   │  Fake           │       │
//! │  │  instrument     │   │  Check          │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::validation;

// =============================================================================
// Payment Type
// =============================================================================

/// A payment instrument.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Cash,
    /// Bank transfer; carries a bank name.
    Bank,
    /// Cheque; carries a check number.
    Check,
}

impl PaymentType {
    pub const ALL: [PaymentType; 3] = [PaymentType::Cash, PaymentType::Bank, PaymentType::Check];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Bank => "bank",
            PaymentType::Check => "check",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentType::Cash),
            "bank" => Ok(PaymentType::Bank),
            "check" | "cheque" => Ok(PaymentType::Check),
            _ => Err(ValidationError::invalid(
                "payment type",
                "must be one of cash, bank, check",
            )),
        }
    }
}

// =============================================================================
// Bill Type
// =============================================================================

/// Accounting tag on an invoice. Opaque to every calculation.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BillType {
    #[default]
    Perfect,
    Fake,
}

impl FromStr for BillType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "perfect" => Ok(BillType::Perfect),
            "fake" => Ok(BillType::Fake),
            _ => Err(ValidationError::invalid("bill type", "must be perfect or fake")),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A product line on an invoice or a khata sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// unit_price × quantity, frozen when the line is created.
    pub line_total: Money,
}

impl LineItem {
    /// Builds a validated line and computes its total.
    pub fn new(product_name: impl Into<String>, quantity: i64, unit_price: Money) -> CoreResult<Self> {
        let product_name = product_name.into();
        validation::validate_product_name(&product_name)?;
        validation::validate_quantity(quantity)?;
        validation::validate_unit_price(unit_price)?;

        let line_total = unit_price
            .checked_mul(quantity)
            .ok_or_else(|| ValidationError::invalid("line total", "is too large"))?;

        Ok(LineItem {
            line_total,
            product_name,
            quantity,
            unit_price,
        })
    }
}

// =============================================================================
// Payment Event
// =============================================================================

/// One recorded payment. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub id: String,
    #[ts(as = "String")]
    pub paid_on: NaiveDate,
    pub amount: Money,
    pub instrument: PaymentType,
    pub bank_name: Option<String>,
    pub check_number: Option<String>,
}

// =============================================================================
// Stock Lot
// =============================================================================

/// A quantity of one product available to sell, usually from one purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockLot {
    pub id: String,
    pub purchase_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    /// Purchase price per unit.
    pub unit_price: Money,
}

impl StockLot {
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.quantity <= 0
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// Stock bought from a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub supplier: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    #[ts(as = "String")]
    pub purchase_date: NaiveDate,
}

impl Purchase {
    /// Creates a validated purchase with a fresh id and computed total.
    pub fn new(
        supplier: &str,
        product_name: &str,
        quantity: i64,
        unit_price: Money,
        purchase_date: NaiveDate,
    ) -> CoreResult<Self> {
        validation::validate_supplier_name(supplier)?;
        validation::validate_product_name(product_name)?;
        validation::validate_quantity(quantity)?;
        validation::validate_unit_price(unit_price)?;
        let total_price = unit_price
            .checked_mul(quantity)
            .ok_or_else(|| ValidationError::invalid("total price", "is too large"))?;

        Ok(Purchase {
            id: Uuid::new_v4().to_string(),
            supplier: supplier.trim().to_string(),
            product_name: product_name.trim().to_string(),
            quantity,
            unit_price,
            total_price,
            purchase_date,
        })
    }

    /// The lot this purchase puts on the shelf.
    pub fn to_stock_lot(&self) -> StockLot {
        StockLot {
            id: Uuid::new_v4().to_string(),
            purchase_id: Some(self.id.clone()),
            product_name: self.product_name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

// =============================================================================
// Khata Account
// =============================================================================

/// A customer with a running credit account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct KhataAccount {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub address: Option<String>,
}

impl KhataAccount {
    pub fn new(customer_name: &str, phone: &str, address: Option<&str>) -> CoreResult<Self> {
        validation::validate_customer_name(customer_name)?;
        validation::validate_phone(phone)?;

        Ok(KhataAccount {
            id: Uuid::new_v4().to_string(),
            customer_name: customer_name.trim().to_string(),
            phone: phone.trim().to_string(),
            address: address
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_payment_type_parse() {
        assert_eq!("Cash".parse::<PaymentType>().unwrap(), PaymentType::Cash);
        assert_eq!(" bank ".parse::<PaymentType>().unwrap(), PaymentType::Bank);
        assert_eq!("cheque".parse::<PaymentType>().unwrap(), PaymentType::Check);
        assert!("card".parse::<PaymentType>().is_err());
    }

    #[test]
    fn test_payment_type_serializes_lowercase() {
        let json = serde_json::to_string(&PaymentType::Check).unwrap();
        assert_eq!(json, "\"check\"");
    }

    #[test]
    fn test_bill_type_default_and_parse() {
        assert_eq!(BillType::default(), BillType::Perfect);
        assert_eq!("FAKE".parse::<BillType>().unwrap(), BillType::Fake);
        assert!("other".parse::<BillType>().is_err());
    }

    #[test]
    fn test_line_item_total() {
        let line = LineItem::new("Cement bag", 50, Money::from_major(500)).unwrap();
        assert_eq!(line.line_total, Money::from_major(25_000));
    }

    #[test]
    fn test_line_item_rejects_zero_quantity() {
        let err = LineItem::new("Cement bag", 0, Money::from_major(500)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_purchase_total_and_lot() {
        let purchase =
            Purchase::new("Lucky Traders", "Steel rod", 20, Money::from_major(850), date()).unwrap();
        assert_eq!(purchase.total_price, Money::from_major(17_000));

        let lot = purchase.to_stock_lot();
        assert_eq!(lot.purchase_id.as_deref(), Some(purchase.id.as_str()));
        assert_eq!(lot.quantity, 20);
        assert_eq!(lot.unit_price, Money::from_major(850));
    }

    #[test]
    fn test_oversized_price_is_rejected_not_overflowed() {
        let huge = Money::from_minor(92_233_720_368_547_758);

        let err = LineItem::new("Cement bag", 2, huge).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "unit price"
        ));
        assert!(Purchase::new("Lucky Traders", "Steel rod", 2, huge, date()).is_err());

        let line = LineItem::new("Cement bag", crate::MAX_LINE_QUANTITY, crate::money::MAX_AMOUNT).unwrap();
        assert!(line.line_total.is_positive());
    }

    #[test]
    fn test_purchase_requires_supplier() {
        assert!(Purchase::new(" ", "Steel rod", 1, Money::from_major(1), date()).is_err());
    }

    #[test]
    fn test_khata_account_trims_fields() {
        let account = KhataAccount::new(" Aslam ", "0300-1234567", Some("  ")).unwrap();
        assert_eq!(account.customer_name, "Aslam");
        assert_eq!(account.address, None);
    }
}
