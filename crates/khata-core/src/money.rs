//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 + 0.2 = 0.30000000000000004                                        │
//! │                                                                         │
//! │  A khata is a long chain of additions and subtractions. With floats    │
//! │  the closing balance drifts away from what the shopkeeper wrote down.  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer paisa                                            │
//! │    Rs 25,000.50 = 2_500_050 paisa                                       │
//! │    Every running balance is exact.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use khata_core::money::Money;
//!
//! let price = Money::from_major(1_250);
//! let line_total = price.checked_mul(4);
//! assert_eq!(line_total, Some(Money::from_major(5_000)));
//!
//! // Form input arrives as text
//! let paid = Money::parse("cash amount", "2,500.50").unwrap();
//! assert_eq!(paid.minor(), 250_050);
//! ```

use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Minor units (paisa) per rupee.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Largest amount a form field accepts: Rs 10,000,000,000.
///
/// `MAX_AMOUNT × MAX_LINE_QUANTITY × MAX_INVOICE_LINES` stays inside i64, so
/// no invoice built from parsed amounts can overflow its total.
pub const MAX_AMOUNT: Money = Money::from_major(10_000_000_000);

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paisa.
///
/// Signed so that a khata balance can go below zero when a customer pays in
/// advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paisa.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(340).minor(), 34_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in paisa.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the paisa portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity. `None` on overflow.
    #[inline]
    pub const fn checked_mul(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds up amounts, `None` as soon as the total overflows.
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// let lines = [Money::from_major(25_000), Money::from_major(9_000)];
    /// assert_eq!(Money::checked_sum(lines), Some(Money::from_major(34_000)));
    /// assert_eq!(Money::checked_sum([Money::from_minor(i64::MAX), Money::from_minor(1)]), None);
    /// ```
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }

    /// Parses an amount typed into a form field.
    ///
    /// ## Rules
    /// - Surrounding whitespace and `,` grouping separators are ignored
    /// - Empty input is a required-field error
    /// - At most two decimal places
    /// - Negative amounts are rejected
    /// - Amounts above [`MAX_AMOUNT`] are rejected
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::Money;
    ///
    /// assert_eq!(Money::parse("amount", "20000").unwrap(), Money::from_major(20_000));
    /// assert_eq!(Money::parse("amount", " 1,500.5 ").unwrap().minor(), 150_050);
    /// assert!(Money::parse("amount", "").is_err());
    /// assert!(Money::parse("amount", "12.345").is_err());
    /// assert!(Money::parse("amount", "-5").is_err());
    /// ```
    pub fn parse(field: &str, input: &str) -> Result<Money, ValidationError> {
        let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();

        if cleaned.is_empty() {
            return Err(ValidationError::required(field));
        }

        if cleaned.starts_with('-') {
            return Err(ValidationError::invalid(field, "must not be negative"));
        }

        let (major_str, minor_str) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (major_str.is_empty() && minor_str.is_empty())
            || !all_digits(major_str)
            || !all_digits(minor_str)
        {
            return Err(ValidationError::invalid(field, "must be a number"));
        }

        if minor_str.len() > 2 {
            return Err(ValidationError::invalid(
                field,
                "must have at most two decimal places",
            ));
        }

        let major: i64 = if major_str.is_empty() {
            0
        } else {
            major_str
                .parse()
                .map_err(|_| ValidationError::invalid(field, "is too large"))?
        };

        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().unwrap_or(0) * 10,
            _ => minor_str.parse::<i64>().unwrap_or(0),
        };

        major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .map(Money)
            .filter(|amount| *amount <= MAX_AMOUNT)
            .ok_or_else(|| ValidationError::invalid(field, "is too large"))
    }

    /// Formats the amount with the locale's thousands separators.
    ///
    /// The fractional part is only printed when it is non-zero, and then
    /// without trailing zeros.
    ///
    /// ## Example
    /// ```rust
    /// use khata_core::money::Money;
    /// use num_format::Locale;
    ///
    /// assert_eq!(Money::from_major(1_234_567).format_grouped(&Locale::en), "1,234,567");
    /// assert_eq!(Money::from_minor(150_050).format_grouped(&Locale::en), "1,500.5");
    /// assert_eq!(Money::from_major(34_000).format_grouped(&Locale::de), "34.000");
    /// ```
    pub fn format_grouped(&self, locale: &Locale) -> String {
        let sign = if self.0 < 0 { locale.minus_sign() } else { "" };
        let major = self.major().abs();

        let mut out = format!("{}{}", sign, major.to_formatted_string(locale));

        let minor = self.minor_part();
        if minor != 0 {
            let frac = format!("{:02}", minor);
            out.push_str(locale.decimal());
            out.push_str(frac.trim_end_matches('0'));
        }

        out
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Grouped with the `en` locale. The app layer formats with the configured
/// locale and currency symbol for statements.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_grouped(&Locale::en))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_and_parts() {
        let money = Money::from_minor(250_075);
        assert_eq!(money.major(), 2_500);
        assert_eq!(money.minor_part(), 75);
        assert_eq!(Money::from_major(12).minor(), 1_200);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_major(34_000).to_string(), "34,000");
        assert_eq!(Money::from_major(0).to_string(), "0");
        assert_eq!(Money::from_major(-16_000).to_string(), "-16,000");
        assert_eq!(Money::from_minor(1_234_525).to_string(), "12,345.25");
        assert_eq!(Money::from_minor(-50).to_string(), "-0.5");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_major(25_000);
        let b = Money::from_major(9_000);

        assert_eq!(a + b, Money::from_major(34_000));
        assert_eq!(b - a, Money::from_major(-16_000));
        assert_eq!(b * 3, Money::from_major(27_000));

        let mut running = Money::zero();
        running += a;
        running -= b;
        assert_eq!(running, Money::from_major(16_000));
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_major(1), Money::from_major(2), Money::from_major(3)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, Money::from_major(6));
    }

    #[test]
    fn test_parse_accepts_form_input() {
        assert_eq!(Money::parse("amount", "0").unwrap(), Money::zero());
        assert_eq!(Money::parse("amount", "14000").unwrap(), Money::from_major(14_000));
        assert_eq!(Money::parse("amount", "14,000.00").unwrap(), Money::from_major(14_000));
        assert_eq!(Money::parse("amount", ".5").unwrap().minor(), 50);
        assert_eq!(Money::parse("amount", "12.").unwrap(), Money::from_major(12));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            Money::parse("cash amount", "   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            Money::parse("cash amount", "abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(Money::parse("cash amount", ".").is_err());
        assert!(Money::parse("cash amount", "1.2.3").is_err());
        assert!(Money::parse("cash amount", "+5").is_err());
        assert!(Money::parse("cash amount", "99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_ceiling() {
        assert_eq!(
            Money::parse("unit price", "10,000,000,000").unwrap(),
            MAX_AMOUNT
        );
        assert!(Money::parse("unit price", "10000000000.01").is_err());

        let err = Money::parse("unit price", "92233720368547758").unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidFormat { ref field, ref reason }
                if field == "unit price" && reason == "is too large"
        ));
    }

    #[test]
    fn test_ceiling_fits_a_full_invoice() {
        let line = MAX_AMOUNT.checked_mul(crate::MAX_LINE_QUANTITY).unwrap();
        let lines = std::iter::repeat(line).take(crate::MAX_INVOICE_LINES);
        assert!(Money::checked_sum(lines).is_some());
    }

    #[test]
    fn test_checked_arithmetic() {
        let huge = Money::from_minor(i64::MAX / 2 + 1);
        assert_eq!(huge.checked_mul(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Money::from_major(3).checked_mul(4), Some(Money::from_major(12)));
        assert_eq!(Money::checked_sum(Vec::new()), Some(Money::zero()));
    }
}
