//! # Error Types
//!
//! Domain-specific error types for khata-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  khata-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  khata-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  khata-app errors                                                      │
//! │  └── ApiError         - What the dashboard sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Dashboard    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error here is raised before any state is mutated, so the caller can
//! show it in a dialog and let the user correct the input.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The submitted instrument amounts add up to more than what is still
    /// owed on the bill.
    ///
    /// ## User Workflow
    /// ```text
    /// Bill 34,000 │ paid 20,000 │ remaining 14,000
    ///      │
    ///      ▼
    /// Submit check 15,000
    ///      │
    ///      ▼
    /// PaymentExceedsRemaining { submitted: 15,000, remaining: 14,000 }
    ///      │
    ///      ▼
    /// Dialog: "Payment of 15,000 exceeds the remaining balance of 14,000"
    /// ```
    #[error("Payment of {submitted} exceeds the remaining balance of {remaining}")]
    PaymentExceedsRemaining { submitted: Money, remaining: Money },

    /// A top-up was submitted without selecting any instrument.
    #[error("Select at least one payment type")]
    EmptyPayment,

    /// An invoice cannot be saved without lines.
    #[error("Invoice has no line items")]
    EmptyInvoice,

    /// Too many lines on one invoice.
    #[error("Invoice cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Draft line index out of bounds.
    #[error("Line {0} not found on the invoice")]
    LineNotFound(usize),

    /// Stock lot is not in the available list.
    #[error("Stock lot not found: {0}")]
    LotNotFound(String),

    /// Selling more than the lot holds.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed amount, invalid phone).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
