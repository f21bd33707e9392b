//! # Khata Running Balance
//!
//! Turns a customer's khata transactions into statement rows, each carrying
//! the balance owed after that event.
//!
//! ## The Scan
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transactions (caller's order)        rows                              │
//! │                                                                         │
//! │  Sale [cement 25,000]           ──►   +25,000   balance 25,000          │
//! │  Sale [sand 9,000]              ──►    +9,000   balance 34,000          │
//! │  Payment 20,000                 ──►   -20,000   balance 14,000          │
//! │  Sale [steel 17,000]            ──►   +17,000   balance 31,000          │
//! │  Payment 15,000                 ──►   -15,000   balance 16,000          │
//! │                                                                         │
//! │  One pass, left to right. A sale emits one row per line item. A        │
//! │  payment of zero emits nothing.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows come out in input order; there is no sorting and no tie-break for
//! same-day events. Callers hand transactions over already in date order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::slice;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{LineItem, PaymentType};

// =============================================================================
// Transactions
// =============================================================================

/// One event on a khata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LedgerTransaction {
    /// Goods taken on credit.
    Sale {
        #[ts(as = "String")]
        date: NaiveDate,
        items: Vec<LineItem>,
    },
    /// Money received against the account.
    Payment {
        #[ts(as = "String")]
        date: NaiveDate,
        amount: Money,
        instrument: PaymentType,
        #[serde(rename = "bankName")]
        bank_name: Option<String>,
        #[serde(rename = "checkNumber")]
        check_number: Option<String>,
    },
}

impl LedgerTransaction {
    pub fn date(&self) -> NaiveDate {
        match self {
            LedgerTransaction::Sale { date, .. } | LedgerTransaction::Payment { date, .. } => *date,
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// What a statement row records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LedgerEntry {
    Sale(LineItem),
    Payment { amount: Money, instrument: PaymentType },
}

/// A statement row: the event, its signed effect, and the balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub entry: LedgerEntry,
    /// Positive for sales, negative for payments.
    pub delta: Money,
    pub balance: Money,
}

// =============================================================================
// Running Balance Iterator
// =============================================================================

/// Lazy running-balance scan over a transaction slice.
///
/// Created by [`running_balance`].
#[derive(Debug, Clone)]
pub struct RunningBalance<'a> {
    transactions: slice::Iter<'a, LedgerTransaction>,
    /// Line items of the sale currently being walked.
    pending: Option<(NaiveDate, slice::Iter<'a, LineItem>)>,
    balance: Money,
}

/// Starts a running-balance scan at zero.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use khata_core::ledger::{running_balance, LedgerTransaction};
/// use khata_core::{LineItem, Money, PaymentType};
///
/// let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
/// let txs = vec![
///     LedgerTransaction::Sale {
///         date: day,
///         items: vec![LineItem::new("Paint", 2, Money::from_major(1_500)).unwrap()],
///     },
///     LedgerTransaction::Payment {
///         date: day,
///         amount: Money::from_major(1_000),
///         instrument: PaymentType::Cash,
///         bank_name: None,
///         check_number: None,
///     },
/// ];
///
/// let balances: Vec<Money> = running_balance(&txs).map(|r| r.balance).collect();
/// assert_eq!(balances, vec![Money::from_major(3_000), Money::from_major(2_000)]);
/// ```
pub fn running_balance(transactions: &[LedgerTransaction]) -> RunningBalance<'_> {
    RunningBalance {
        transactions: transactions.iter(),
        pending: None,
        balance: Money::zero(),
    }
}

impl<'a> Iterator for RunningBalance<'a> {
    type Item = LedgerRow;

    fn next(&mut self) -> Option<LedgerRow> {
        loop {
            if let Some((date, items)) = self.pending.as_mut() {
                if let Some(item) = items.next() {
                    self.balance += item.line_total;
                    return Some(LedgerRow {
                        date: *date,
                        entry: LedgerEntry::Sale(item.clone()),
                        delta: item.line_total,
                        balance: self.balance,
                    });
                }
            }
            self.pending = None;

            match self.transactions.next()? {
                LedgerTransaction::Sale { date, items } => {
                    self.pending = Some((*date, items.iter()));
                }
                LedgerTransaction::Payment {
                    date,
                    amount,
                    instrument,
                    ..
                } => {
                    if amount.is_positive() {
                        self.balance -= *amount;
                        return Some(LedgerRow {
                            date: *date,
                            entry: LedgerEntry::Payment {
                                amount: *amount,
                                instrument: *instrument,
                            },
                            delta: Money::zero() - *amount,
                            balance: self.balance,
                        });
                    }
                }
            }
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// A full khata statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub rows: Vec<LedgerRow>,
    pub total_sales: Money,
    pub total_paid: Money,
    /// Negative when the customer has paid in advance.
    pub closing_balance: Money,
}

/// Runs the scan to the end and totals it.
pub fn summarize(transactions: &[LedgerTransaction]) -> LedgerSummary {
    let rows: Vec<LedgerRow> = running_balance(transactions).collect();

    let total_sales = rows
        .iter()
        .filter(|r| r.delta.is_positive())
        .map(|r| r.delta)
        .sum();
    let total_paid = rows
        .iter()
        .filter(|r| r.delta.is_negative())
        .map(|r| Money::zero() - r.delta)
        .sum();
    let closing_balance = rows.last().map(|r| r.balance).unwrap_or_default();

    LedgerSummary {
        rows,
        total_sales,
        total_paid,
        closing_balance,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rs(major: i64) -> Money {
        Money::from_major(major)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn sale(d: u32, totals: &[i64]) -> LedgerTransaction {
        LedgerTransaction::Sale {
            date: day(d),
            items: totals
                .iter()
                .map(|t| LineItem::new("Item", 1, rs(*t)).unwrap())
                .collect(),
        }
    }

    fn payment(d: u32, amount: i64) -> LedgerTransaction {
        LedgerTransaction::Payment {
            date: day(d),
            amount: rs(amount),
            instrument: PaymentType::Cash,
            bank_name: None,
            check_number: None,
        }
    }

    fn balances(txs: &[LedgerTransaction]) -> Vec<i64> {
        running_balance(txs).map(|r| r.balance.major()).collect()
    }

    #[test]
    fn test_reference_sequence() {
        let txs = vec![
            sale(1, &[25_000]),
            sale(2, &[9_000]),
            payment(3, 20_000),
            sale(4, &[17_000]),
            payment(5, 15_000),
        ];

        assert_eq!(balances(&txs), vec![25_000, 34_000, 14_000, 31_000, 16_000]);
    }

    #[test]
    fn test_one_row_per_line_item() {
        let txs = vec![sale(1, &[100, 200, 300])];
        let rows: Vec<LedgerRow> = running_balance(&txs).collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(balances(&txs), vec![100, 300, 600]);
        assert!(rows.iter().all(|r| r.date == day(1)));
    }

    #[test]
    fn test_zero_payment_emits_nothing() {
        let txs = vec![sale(1, &[100]), payment(2, 0), payment(3, 40)];
        assert_eq!(balances(&txs), vec![100, 60]);
    }

    #[test]
    fn test_empty_sale_emits_nothing() {
        let txs = vec![sale(1, &[]), payment(2, 10)];
        assert_eq!(balances(&txs), vec![-10]);
    }

    #[test]
    fn test_each_balance_is_previous_plus_delta() {
        let txs = vec![
            sale(1, &[500, 250]),
            payment(1, 300),
            payment(2, 100),
            sale(3, &[75]),
            payment(4, 1_000),
        ];

        let mut previous = Money::zero();
        for row in running_balance(&txs) {
            assert_eq!(row.balance, previous + row.delta);
            previous = row.balance;
        }
        assert_eq!(previous, rs(-575));
    }

    #[test]
    fn test_monotonic_runs() {
        let sales = vec![sale(1, &[10, 20]), sale(2, &[5])];
        let b = balances(&sales);
        assert!(b.windows(2).all(|w| w[0] <= w[1]));

        let mut mixed = sales.clone();
        mixed.extend([payment(3, 5), payment(4, 10), payment(5, 1)]);
        let b = balances(&mixed);
        assert!(b[3..].windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_preserves_input_order() {
        let txs = vec![payment(9, 10), sale(1, &[10])];
        let rows: Vec<LedgerRow> = running_balance(&txs).collect();

        assert_eq!(rows[0].date, day(9));
        assert_eq!(rows[1].date, day(1));
    }

    #[test]
    fn test_summary_totals() {
        let txs = vec![
            sale(1, &[25_000]),
            sale(2, &[9_000]),
            payment(3, 20_000),
            sale(4, &[17_000]),
            payment(5, 15_000),
        ];

        let summary = summarize(&txs);
        assert_eq!(summary.total_sales, rs(51_000));
        assert_eq!(summary.total_paid, rs(35_000));
        assert_eq!(summary.closing_balance, rs(16_000));
        assert_eq!(summarize(&txs), summary);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = summarize(&[]);
        assert!(summary.rows.is_empty());
        assert_eq!(summary.closing_balance, Money::zero());
    }

    #[test]
    fn test_transaction_json_shape() {
        let json = serde_json::to_value(payment(1, 5)).unwrap();
        assert_eq!(json["kind"], "payment");
        assert_eq!(json["instrument"], "cash");
        assert!(json.get("bankName").is_some());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn transaction() -> impl Strategy<Value = LedgerTransaction> {
            prop_oneof![
                (1..=28u32, prop::collection::vec((1..=100i64, 0..=1_000_000i64), 0..5)).prop_map(
                    |(d, lines)| LedgerTransaction::Sale {
                        date: day(d),
                        items: lines
                            .into_iter()
                            .map(|(qty, price)| LineItem::new("Item", qty, Money::from_minor(price)).unwrap())
                            .collect(),
                    }
                ),
                (1..=28u32, 0..=50_000_000i64).prop_map(|(d, minor)| LedgerTransaction::Payment {
                    date: day(d),
                    amount: Money::from_minor(minor),
                    instrument: PaymentType::Cash,
                    bank_name: None,
                    check_number: None,
                }),
            ]
        }

        proptest! {
            #[test]
            fn each_balance_is_previous_plus_delta(
                txs in prop::collection::vec(transaction(), 0..30),
            ) {
                let rows: Vec<LedgerRow> = running_balance(&txs).collect();

                let mut previous = Money::zero();
                for row in &rows {
                    prop_assert_eq!(row.balance, previous + row.delta);
                    previous = row.balance;
                }

                let expected_rows: usize = txs
                    .iter()
                    .map(|t| match t {
                        LedgerTransaction::Sale { items, .. } => items.len(),
                        LedgerTransaction::Payment { amount, .. } => usize::from(amount.is_positive()),
                    })
                    .sum();
                prop_assert_eq!(rows.len(), expected_rows);

                let summary = summarize(&txs);
                prop_assert_eq!(summary.closing_balance, previous);
                prop_assert_eq!(summary.closing_balance, summary.total_sales - summary.total_paid);
            }
        }
    }
}
