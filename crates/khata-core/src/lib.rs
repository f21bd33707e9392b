//! # khata-core: Pure Business Logic for the Khata Ledger
//!
//! All money, payment and balance rules of the shop back office live here,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Khata Ledger Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser Dashboard                            │   │
//! │  │   Invoices ──► Payments ──► Khata statements ──► Stock         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    khata-app commands                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khata-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐ ┌──────────┐ ┌──────────┐ ┌─────────────┐   │   │
//! │  │   │reconciliation│ │  ledger  │ │  stock   │ │ validation  │   │   │
//! │  │   │ paid/remain  │ │ running  │ │   lots   │ │   rules     │   │   │
//! │  │   │   status     │ │ balance  │ │          │ │             │   │   │
//! │  │   └──────────────┘ └──────────┘ └──────────┘ └─────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    khata-db (SQLite)                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money in paisa, form parsing, grouped display
//! - [`types`] - Plain domain records (line items, lots, purchases, accounts)
//! - [`reconciliation`] - Paid / remaining / status and the payment gate
//! - [`invoice`] - Invoices and the in-progress draft invoice
//! - [`ledger`] - Khata running balance
//! - [`stock`] - Stock lot decrement and restore
//! - [`validation`] - Field validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use khata_core::money::Money;
//! use khata_core::reconciliation::{reconcile, PaymentInstruments, PaymentStatus};
//!
//! let bill = Money::from_major(34_000);
//! let paid = PaymentInstruments {
//!     bank: Money::from_major(20_000),
//!     ..Default::default()
//! };
//!
//! let summary = reconcile(bill, &paid);
//! assert_eq!(summary.remaining, Money::from_major(14_000));
//! assert_eq!(summary.status, PaymentStatus::PartiallyPaid);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod money;
pub mod reconciliation;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{DraftInvoice, DraftLine, Invoice, InvoiceDetails};
pub use ledger::{running_balance, summarize, LedgerEntry, LedgerRow, LedgerSummary, LedgerTransaction};
pub use money::Money;
pub use reconciliation::{
    reconcile, validate_submission, PaymentForm, PaymentInstruments, PaymentStatus,
    PaymentSubmission, Reconciliation,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines on a single invoice or khata sale.
pub const MAX_INVOICE_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// Guards against typing 10000 instead of 100 at the counter.
pub const MAX_LINE_QUANTITY: i64 = 9_999;
