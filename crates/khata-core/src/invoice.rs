//! # Invoices
//!
//! A saved sales invoice and the draft it is built from.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Invoice Lifecycle                                 │
//! │                                                                         │
//! │  1. DRAFT                                                              │
//! │     └── add_line() / remove_line() against the available lots          │
//! │                                                                         │
//! │  2. SAVE                                                               │
//! │     └── finalize() → Invoice (initial payment passes the gate)         │
//! │                                                                         │
//! │  3. TOP-UP (any number of times)                                       │
//! │     └── apply_payment() → amounts accumulate, tags merge               │
//! │                                                                         │
//! │  4. DELETE                                                             │
//! │     └── storage layer restores the sold quantities                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariant
//! `instruments.total_paid() <= total_bill_amount` after every accepted
//! submission.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::reconciliation::{
    reconcile, validate_submission, PaymentInstruments, PaymentStatus, PaymentSubmission,
    Reconciliation,
};
use crate::stock;
use crate::types::{BillType, LineItem, PaymentEvent, PaymentType, StockLot};
use crate::validation;
use crate::MAX_INVOICE_LINES;

// =============================================================================
// Invoice
// =============================================================================

/// A saved sales invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub items: Vec<LineItem>,
    pub total_bill_amount: Money,
    /// Every instrument ever used on this bill.
    #[ts(as = "Vec<PaymentType>")]
    pub payment_types: BTreeSet<PaymentType>,
    pub instruments: PaymentInstruments,
    pub bill_type: BillType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Customer-facing fields entered when saving an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetails {
    pub customer_name: String,
    pub phone: String,
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    #[serde(default)]
    pub bill_type: BillType,
}

impl Invoice {
    /// Builds an invoice from its lines and the payment taken at the counter.
    ///
    /// The initial payment goes through the same gate as every later top-up,
    /// with the whole bill outstanding. An empty submission leaves the
    /// invoice unpaid.
    pub fn create(
        details: &InvoiceDetails,
        items: Vec<LineItem>,
        initial_payment: &PaymentSubmission,
    ) -> CoreResult<Invoice> {
        if items.is_empty() {
            return Err(CoreError::EmptyInvoice);
        }
        if items.len() > MAX_INVOICE_LINES {
            return Err(CoreError::TooManyLines {
                max: MAX_INVOICE_LINES,
            });
        }

        validation::validate_customer_name(&details.customer_name)?;
        validation::validate_phone(&details.phone)?;

        let total_bill_amount = Money::checked_sum(items.iter().map(|i| i.line_total))
            .ok_or_else(|| ValidationError::invalid("invoice total", "is too large"))?;
        validate_submission(total_bill_amount, initial_payment)?;

        let mut instruments = PaymentInstruments::default();
        instruments.apply(initial_payment)?;

        Ok(Invoice {
            id: Uuid::new_v4().to_string(),
            customer_name: details.customer_name.trim().to_string(),
            phone: details.phone.trim().to_string(),
            sale_date: details.sale_date,
            items,
            total_bill_amount,
            payment_types: initial_payment.payment_types.clone(),
            instruments,
            bill_type: details.bill_type,
            created_at: Utc::now(),
        })
    }

    pub fn reconciliation(&self) -> Reconciliation {
        reconcile(self.total_bill_amount, &self.instruments)
    }

    pub fn status(&self) -> PaymentStatus {
        self.reconciliation().status
    }

    pub fn remaining(&self) -> Money {
        self.reconciliation().remaining
    }

    /// Records a later payment against this invoice.
    ///
    /// ## Returns
    /// The payment events to append to the invoice's history.
    ///
    /// ## Errors
    /// - `EmptyPayment` when no instrument is selected
    /// - `PaymentExceedsRemaining` when the amounts overshoot the balance
    ///
    /// The invoice is untouched when an error is returned.
    pub fn apply_payment(
        &mut self,
        submission: &PaymentSubmission,
        paid_on: NaiveDate,
    ) -> CoreResult<Vec<PaymentEvent>> {
        if submission.is_empty() {
            return Err(CoreError::EmptyPayment);
        }

        validate_submission(self.remaining(), submission)?;

        self.instruments.apply(submission)?;
        self.payment_types
            .extend(submission.payment_types.iter().copied());

        Ok(submission.events(paid_on))
    }
}

// =============================================================================
// Draft Invoice
// =============================================================================

/// A line on an invoice that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    pub id: String,
    pub lot_id: String,
    pub item: LineItem,
}

impl DraftLine {
    pub fn new(lot_id: impl Into<String>, item: LineItem) -> Self {
        DraftLine {
            id: Uuid::new_v4().to_string(),
            lot_id: lot_id.into(),
            item,
        }
    }
}

/// An invoice being put together at the counter.
///
/// Holds its own copy of the sellable lots. Adding a line takes the quantity
/// off the lot, removing a line puts it back.
#[derive(Debug, Clone, Default)]
pub struct DraftInvoice {
    available: Vec<StockLot>,
    lines: Vec<DraftLine>,
    /// Lot snapshots by id, to rebuild a lot that a line exhausted.
    origins: HashMap<String, StockLot>,
}

impl DraftInvoice {
    pub fn new(lots: Vec<StockLot>) -> Self {
        DraftInvoice {
            available: stock::available(&lots),
            lines: Vec::new(),
            origins: HashMap::new(),
        }
    }

    /// Lots that can still be sold from, net of the draft lines.
    pub fn available(&self) -> &[StockLot] {
        &self.available
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total(&self) -> Money {
        self.lines.iter().map(|l| l.item.line_total).sum()
    }

    /// Replaces the lot list with fresh data, keeping the draft lines'
    /// quantities reserved.
    pub fn reload_stock(&mut self, lots: Vec<StockLot>) {
        let mut lots = lots;
        for line in &self.lines {
            if let Some(lot) = lots.iter_mut().find(|l| l.id == line.lot_id) {
                lot.quantity = (lot.quantity - line.item.quantity).max(0);
            }
        }
        self.available = stock::available(&lots);
    }

    /// Sells `quantity` from a lot at `unit_price`.
    pub fn add_line(&mut self, lot_id: &str, quantity: i64, unit_price: Money) -> CoreResult<&DraftLine> {
        if self.lines.len() >= MAX_INVOICE_LINES {
            return Err(CoreError::TooManyLines {
                max: MAX_INVOICE_LINES,
            });
        }

        let product_name = self
            .available
            .iter()
            .find(|l| l.id == lot_id)
            .map(|l| l.product_name.clone())
            .ok_or_else(|| CoreError::LotNotFound(lot_id.to_string()))?;

        let item = LineItem::new(product_name, quantity, unit_price)?;
        self.total()
            .checked_add(item.line_total)
            .ok_or_else(|| ValidationError::invalid("invoice total", "is too large"))?;
        let origin = stock::take_from_lot(&mut self.available, lot_id, quantity)?;

        self.origins.entry(origin.id.clone()).or_insert(origin);
        self.lines.push(DraftLine::new(lot_id, item));

        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Drops a line and returns its quantity to the lot.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<DraftLine> {
        if index >= self.lines.len() {
            return Err(CoreError::LineNotFound(index));
        }

        let line = self.lines.remove(index);
        if let Some(origin) = self.origins.get(&line.lot_id) {
            stock::restore_to_lot(&mut self.available, origin, line.item.quantity);
        }

        Ok(line)
    }

    /// Abandons the draft, returning every line's quantity.
    pub fn clear(&mut self) {
        while !self.lines.is_empty() {
            let last = self.lines.len() - 1;
            // index is in bounds
            let _ = self.remove_line(last);
        }
        self.origins.clear();
    }

    /// Builds the invoice this draft describes. The draft itself is left as
    /// is until the caller knows the invoice was stored.
    pub fn finalize(
        &self,
        details: &InvoiceDetails,
        initial_payment: &PaymentSubmission,
    ) -> CoreResult<Invoice> {
        let items = self.lines.iter().map(|l| l.item.clone()).collect();
        Invoice::create(details, items, initial_payment)
    }

    /// Forgets the lines that went into a stored invoice. Their quantities
    /// stay sold. Lines added since the save began are kept.
    pub fn mark_saved(&mut self, saved: &[DraftLine]) {
        self.lines.retain(|line| !saved.iter().any(|s| s.id == line.id));

        let lines = &self.lines;
        self.origins
            .retain(|lot_id, _| lines.iter().any(|line| &line.lot_id == lot_id));
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
