//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │    float(299000.00) * 2 → rounded back into a NUMERIC(10,2) column      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Prices carry exactly 2 fraction digits, so price × quantity is an   │
//! │    exact integer multiplication. Nothing is ever rounded.              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edges
//! Inside the system money is always `i64` cents. At the edges (JSON bodies,
//! query strings) it travels as a decimal string such as `"598000.00"`, via
//! [`rust_decimal::Decimal`]. Values with more than 2 fraction digits are
//! rejected rather than rounded.
//!
//! ## Usage
//! ```rust
//! use shop_core::money::Money;
//!
//! let price = Money::from_cents(29_900_000); // 299000.00
//! let line_total = price.checked_multiply_quantity(2).unwrap();
//! assert_eq!(line_total.to_string(), "598000.00");
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Number of fraction digits carried by every monetary value.
pub const MONEY_SCALE: u32 = 2;

/// Errors converting a decimal into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The value has more than two fraction digits.
    #[error("amount {0} has more than 2 decimal places")]
    TooPrecise(String),

    /// The value does not fit into i64 cents.
    #[error("amount {0} is out of range")]
    OutOfRange(String),

    /// The text is not a decimal number.
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: a zero-cost wrapper; negative values are representable
///   but never produced by checkout
/// - **Exact**: multiplication by an integer quantity is checked, never
///   rounded
/// - **Serde**: serialized as a decimal string with exactly 2 fraction digits
///
/// ## Where Money Is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  products.price_cents ──► ProductSnapshot.price ──► OrderLine.unit_price│
/// │                                                          │              │
/// │                                 quantity × unit_price ◄──┘              │
/// │                                          │                              │
/// │                                          ▼                              │
/// │                               Order.total_amount ──► orders.total_...   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use shop_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
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

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use shop_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_multiply_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns the value as a decimal with exactly 2 fraction digits.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, MONEY_SCALE)
    }

    /// Converts a decimal into Money without rounding.
    ///
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use shop_core::money::Money;
    ///
    /// let price = Money::try_from_decimal(Decimal::new(2990, 1)).unwrap(); // 299.0
    /// assert_eq!(price.cents(), 29_900);
    ///
    /// assert!(Money::try_from_decimal(Decimal::new(12345, 3)).is_err()); // 12.345
    /// ```
    pub fn try_from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        // Trailing zeros beyond the scale are harmless (12.300 is 12.30).
        let normalized = value.normalize();
        if normalized.scale() > MONEY_SCALE {
            return Err(MoneyError::TooPrecise(value.to_string()));
        }

        let mut scaled = normalized;
        scaled.rescale(MONEY_SCALE);
        if scaled.scale() != MONEY_SCALE {
            return Err(MoneyError::OutOfRange(value.to_string()));
        }

        i64::try_from(scaled.mantissa())
            .map(Money)
            .map_err(|_| MoneyError::OutOfRange(value.to_string()))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering ("598000.00"); currency symbols are a UI concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| MoneyError::Invalid(s.to_string()))?;
        Money::try_from_decimal(value)
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal().to_string())
    }
}

/// Accepts both `"299000.00"` and `299000` (query strings hand us text).
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::try_from_decimal(value).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(Money::from_major_minor(10, 99), money);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(59_800_000).to_string(), "598000.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        let big = Money::from_cents(i64::MAX / 2 + 1);
        assert_eq!(big.checked_multiply_quantity(2), None);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
    }

    #[test]
    fn test_decimal_conversion() {
        assert_eq!(Money::try_from_decimal(Decimal::new(299_000, 0)).unwrap().cents(), 29_900_000);
        assert_eq!(Money::try_from_decimal(Decimal::new(1230, 3)).unwrap().cents(), 123);
        assert!(matches!(
            Money::try_from_decimal(Decimal::new(1001, 3)),
            Err(MoneyError::TooPrecise(_))
        ));
        assert_eq!(Money::from_cents(12_345).to_decimal(), Decimal::new(12_345, 2));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("299000.00".parse::<Money>().unwrap().cents(), 29_900_000);
        assert_eq!(" 5 ".parse::<Money>().unwrap().cents(), 500);
        assert!("abc".parse::<Money>().is_err());
        assert!("0.001".parse::<Money>().is_err());
    }

    #[test]
    fn test_serde_uses_decimal_strings() {
        let json = serde_json::to_string(&Money::from_cents(59_800_000)).unwrap();
        assert_eq!(json, "\"598000.00\"");

        let parsed: Money = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(parsed.cents(), 1250);

        let parsed: Money = serde_json::from_str("12").unwrap();
        assert_eq!(parsed.cents(), 1200);

        assert!(serde_json::from_str::<Money>("\"1.999\"").is_err());
    }
}
