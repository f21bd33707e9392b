//! # Payment Reconciliation
//!
//! Tracks what has been paid against a bill across cash, bank and check,
//! and guards every new payment so a bill is never overpaid.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Paying Against a Bill                                │
//! │                                                                         │
//! │  PaymentForm (raw strings from the dialog)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentSubmission::from_form ── required fields per selected type     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_submission(remaining) ── submitted > remaining? reject       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentInstruments::apply ── cash/bank/check totals accumulate        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reconcile ── total paid, remaining, status                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Rules
//! - `remaining <= 0` → Fully Paid
//! - otherwise `total_paid > 0` → Partially Paid
//! - otherwise → Unpaid

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentEvent, PaymentType};

// =============================================================================
// Payment Instruments
// =============================================================================

/// Accumulated per-instrument totals on a bill.
///
/// An instrument that was never used stays at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstruments {
    pub cash: Money,
    pub bank: Money,
    pub bank_name: Option<String>,
    pub check: Money,
    pub check_number: Option<String>,
}

impl PaymentInstruments {
    /// cash + bank + check. Cannot overflow for totals built by [`apply`].
    ///
    /// [`apply`]: PaymentInstruments::apply
    pub fn total_paid(&self) -> Money {
        self.cash + self.bank + self.check
    }

    pub fn amount_for(&self, instrument: PaymentType) -> Money {
        match instrument {
            PaymentType::Cash => self.cash,
            PaymentType::Bank => self.bank,
            PaymentType::Check => self.check,
        }
    }

    /// Adds an accepted submission onto the running totals.
    ///
    /// Amounts only ever increase. Bank name and check number keep the most
    /// recently submitted value. The totals are untouched when an amount
    /// would overflow.
    pub fn apply(&mut self, submission: &PaymentSubmission) -> CoreResult<()> {
        let too_large = || ValidationError::invalid("amount paid", "is too large");

        let cash = self.cash.checked_add(submission.cash).ok_or_else(too_large)?;
        let bank = self.bank.checked_add(submission.bank).ok_or_else(too_large)?;
        let check = self.check.checked_add(submission.check).ok_or_else(too_large)?;
        Money::checked_sum([cash, bank, check]).ok_or_else(too_large)?;

        self.cash = cash;
        self.bank = bank;
        self.check = check;

        if let Some(name) = &submission.bank_name {
            self.bank_name = Some(name.clone());
        }
        if let Some(number) = &submission.check_number {
            self.check_number = Some(number.clone());
        }

        Ok(())
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentStatus {
    #[serde(rename = "Unpaid")]
    Unpaid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    #[serde(rename = "Fully Paid")]
    FullyPaid,
}

impl PaymentStatus {
    pub fn classify(total_paid: Money, remaining: Money) -> Self {
        if remaining <= Money::zero() {
            PaymentStatus::FullyPaid
        } else if total_paid.is_positive() {
            PaymentStatus::PartiallyPaid
        } else {
            PaymentStatus::Unpaid
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::PartiallyPaid => "Partially Paid",
            PaymentStatus::FullyPaid => "Fully Paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Paid / remaining / status for one bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub total_bill: Money,
    pub total_paid: Money,
    pub remaining: Money,
    pub status: PaymentStatus,
}

/// Reconciles a bill total against the instrument totals paid so far.
///
/// ## Example
/// ```rust
/// use khata_core::money::Money;
/// use khata_core::reconciliation::{reconcile, PaymentInstruments, PaymentStatus};
///
/// let nothing_paid = reconcile(Money::from_major(500), &PaymentInstruments::default());
/// assert_eq!(nothing_paid.status, PaymentStatus::Unpaid);
/// assert_eq!(nothing_paid.remaining, Money::from_major(500));
/// ```
pub fn reconcile(total_bill: Money, instruments: &PaymentInstruments) -> Reconciliation {
    let total_paid = instruments.total_paid();
    let remaining = total_bill - total_paid;

    Reconciliation {
        total_bill,
        total_paid,
        remaining,
        status: PaymentStatus::classify(total_paid, remaining),
    }
}

// =============================================================================
// Payment Form
// =============================================================================

/// Raw payment input as the dashboard dialog sends it.
///
/// Amounts are strings because that is what the form fields hold. Only the
/// instruments listed in `payment_types` are read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    #[serde(default)]
    pub payment_types: Vec<PaymentType>,
    #[serde(default)]
    pub cash_amount: Option<String>,
    #[serde(default)]
    pub bank_amount: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub check_amount: Option<String>,
    #[serde(default)]
    pub check_number: Option<String>,
}

// =============================================================================
// Payment Submission
// =============================================================================

/// A parsed, field-validated payment that has not yet passed the
/// remaining-balance gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSubmission {
    #[ts(as = "Vec<PaymentType>")]
    pub payment_types: BTreeSet<PaymentType>,
    pub cash: Money,
    pub bank: Money,
    pub bank_name: Option<String>,
    pub check: Money,
    pub check_number: Option<String>,
}

fn required_text(field: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::required(field)),
    }
}

fn required_amount(field: &str, value: Option<&str>) -> Result<Money, ValidationError> {
    let amount = Money::parse(field, value.unwrap_or(""))?;
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

impl PaymentSubmission {
    /// Parses a payment form.
    ///
    /// ## Rules
    /// - A selected instrument must carry a positive amount
    /// - Bank needs a bank name, check needs a check number
    /// - Anything typed for an unselected instrument is ignored
    pub fn from_form(form: &PaymentForm) -> CoreResult<Self> {
        let mut submission = PaymentSubmission::default();

        for instrument in &form.payment_types {
            submission.payment_types.insert(*instrument);
        }

        if submission.payment_types.contains(&PaymentType::Cash) {
            submission.cash = required_amount("cash amount", form.cash_amount.as_deref())?;
        }

        if submission.payment_types.contains(&PaymentType::Bank) {
            submission.bank = required_amount("bank amount", form.bank_amount.as_deref())?;
            submission.bank_name = Some(required_text("bank name", form.bank_name.as_deref())?);
        }

        if submission.payment_types.contains(&PaymentType::Check) {
            submission.check = required_amount("check amount", form.check_amount.as_deref())?;
            submission.check_number =
                Some(required_text("check number", form.check_number.as_deref())?);
        }

        submission.total()?;
        Ok(submission)
    }

    /// A cash-only submission.
    pub fn cash(amount: Money) -> Self {
        PaymentSubmission {
            payment_types: BTreeSet::from([PaymentType::Cash]),
            cash: amount,
            ..Default::default()
        }
    }

    /// A bank-transfer-only submission.
    pub fn bank(amount: Money, bank_name: impl Into<String>) -> Self {
        PaymentSubmission {
            payment_types: BTreeSet::from([PaymentType::Bank]),
            bank: amount,
            bank_name: Some(bank_name.into()),
            ..Default::default()
        }
    }

    /// A check-only submission.
    pub fn check(amount: Money, check_number: impl Into<String>) -> Self {
        PaymentSubmission {
            payment_types: BTreeSet::from([PaymentType::Check]),
            check: amount,
            check_number: Some(check_number.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payment_types.is_empty()
    }

    /// Sum of the submitted instrument amounts.
    pub fn total(&self) -> CoreResult<Money> {
        Money::checked_sum([self.cash, self.bank, self.check])
            .ok_or_else(|| ValidationError::invalid("payment total", "is too large").into())
    }

    /// One payment event per instrument with a positive amount, in
    /// cash, bank, check order.
    pub fn events(&self, paid_on: NaiveDate) -> Vec<PaymentEvent> {
        PaymentType::ALL
            .iter()
            .filter_map(|instrument| {
                let amount = match instrument {
                    PaymentType::Cash => self.cash,
                    PaymentType::Bank => self.bank,
                    PaymentType::Check => self.check,
                };
                if !amount.is_positive() {
                    return None;
                }
                Some(PaymentEvent {
                    id: Uuid::new_v4().to_string(),
                    paid_on,
                    amount,
                    instrument: *instrument,
                    bank_name: match instrument {
                        PaymentType::Bank => self.bank_name.clone(),
                        _ => None,
                    },
                    check_number: match instrument {
                        PaymentType::Check => self.check_number.clone(),
                        _ => None,
                    },
                })
            })
            .collect()
    }
}

/// The remaining-balance gate.
///
/// Rejects a submission whose amounts add up to more than `remaining`.
/// Nothing is clamped: the user has to correct the amounts.
pub fn validate_submission(remaining: Money, submission: &PaymentSubmission) -> CoreResult<()> {
    let submitted = submission.total()?;

    if submitted > remaining {
        return Err(CoreError::PaymentExceedsRemaining {
            submitted,
            remaining,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
