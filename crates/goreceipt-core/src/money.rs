//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                     │
//! │                                                                         │
//! │  A receipt printing ₹294.99999 instead of ₹295.00 is a support ticket. │
//! │                                                                         │
//! │  OUR SOLUTION: Integer paise                                            │
//! │    Every amount is an i64 count of the smallest currency unit.         │
//! │    Tax is rounded once per line, half up, then summed.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use goreceipt_core::money::Money;
//!
//! let price = Money::from_minor(10050); // ₹100.50
//! let line = price * 2;                 // ₹201.00
//! assert_eq!(line.minor(), 20100);
//!
//! let parsed = Money::parse("100.5").unwrap();
//! assert_eq!(parsed, price);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR).
///
/// ## Where Money is Used
/// ```text
/// LineItem.unit_price ──► × quantity ──► line subtotal ──► + line tax ──► line amount
///                                             │                 │
///                                             ▼                 ▼
///                                      Totals.subtotal   Totals.tax_total ──► Totals.total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (paise).
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from major and minor units (rupees and paise).
    ///
    /// ## Example
    /// ```rust
    /// use goreceipt_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).minor(), 1099);
    /// assert_eq!(Money::from_major_minor(-5, 50).minor(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal amount typed into a form (`"99"`, `"99.5"`, `"99.50"`).
    ///
    /// More than two fractional digits are rejected rather than rounded.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (major_str, minor_str) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if minor_str.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if major_str.is_empty() && minor_str.is_empty() {
            return Err(invalid("not a number"));
        }
        if !major_str.chars().chain(minor_str.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a number"));
        }

        let major: i64 = if major_str.is_empty() {
            0
        } else {
            major_str.parse().map_err(|_| invalid("too large"))?
        };
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| invalid("not a number"))? * 10,
            _ => minor_str.parse().map_err(|_| invalid("not a number"))?,
        };

        let value = major
            .checked_mul(100)
            .and_then(|m| m.checked_add(minor))
            .ok_or_else(|| invalid("too large"))?;

        Ok(Money(if negative { -value } else { value }))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupees) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax on this amount, rounding half up to the nearest paisa.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The +5000 provides
    /// rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use goreceipt_core::money::Money;
    /// use goreceipt_core::types::TaxRate;
    ///
    /// let line = Money::from_minor(20000);      // ₹200.00
    /// let gst = TaxRate::from_percentage(18.0); // 18%
    /// assert_eq!(line.calculate_tax(gst).minor(), 3600);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 so that large amounts times 10000 bps cannot overflow
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_minor(tax.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Formats the amount without a currency symbol (`"1234.50"`).
    pub fn to_plain_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with the rupee sign, e.g. `₹10.99`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.major().abs(), self.minor_part())
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_minor(1099)), "₹10.99");
        assert_eq!(format!("{}", Money::from_minor(500)), "₹5.00");
        assert_eq!(format!("{}", Money::from_minor(-550)), "-₹5.50");
        assert_eq!(Money::from_minor(29500).to_plain_string(), "295.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("100").unwrap().minor(), 10000);
        assert_eq!(Money::parse("99.5").unwrap().minor(), 9950);
        assert_eq!(Money::parse(" 99.05 ").unwrap().minor(), 9905);
        assert_eq!(Money::parse(".5").unwrap().minor(), 50);
        assert_eq!(Money::parse("-2.25").unwrap().minor(), -225);

        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.234").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse(".").is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.minor(), 2000);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_minor(i64::MAX / 2);
        assert_eq!(huge.multiply_quantity(3).minor(), i64::MAX);
        assert_eq!((huge + huge + huge).minor(), i64::MAX);
        assert_eq!((Money::from_minor(i64::MIN) - Money::from_minor(100)).minor(), i64::MIN);
        assert_eq!(Money::from_minor(i64::MAX).calculate_tax(TaxRate::from_bps(10000)).minor(), i64::MAX);
    }


    #[test]
    fn test_gst_calculation() {
        // ₹200 at 18% = ₹36
        let tax = Money::from_minor(20000).calculate_tax(TaxRate::from_bps(1800));
        assert_eq!(tax.minor(), 3600);

        // ₹0.99 at 5% = 4.95 paise → 5 paise (half up)
        let tax = Money::from_minor(99).calculate_tax(TaxRate::from_bps(500));
        assert_eq!(tax.minor(), 5);
    }

    #[test]
    fn test_zero_tax_rate() {
        let tax = Money::from_minor(12345).calculate_tax(TaxRate::zero());
        assert!(tax.is_zero());
    }
}
