//! # Money Module
//!
//! Provides the `Money`, `TaxRate` and `RoundingMode` types.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    0.1 + 0.2 = 0.3 exactly                                              │
//! │    Intermediate values keep full precision (tax on 123.45 at 8.25%     │
//! │    stays 10.184625) and only the grand total is ever rounded.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(1099);        // 10.99
//! let doubled = price * 2;                    // 21.98
//! let total = price + Money::from_cents(500); // 15.99
//! assert_eq!(total.to_string(), "15.99");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Tolerance for "fully paid" comparisons (0.01 of the currency unit).
pub const MONEY_TOLERANCE: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

/// Decimal places used for display.
const DISPLAY_PLACES: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the major currency unit, held as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal**: no binary floating point anywhere in the totals path
/// - **Signed**: differences (total - paid) can go negative before clamping
/// - **Serialized as a string**: `"10.99"`, never a JSON float
///
/// ## Where Money is Used
/// ```text
/// LineItem.unit_price ──► line total ──► Totals.subtotal
///                                              │
/// Totals.total ──► Balance.remaining / change ◄┴── Payment.amount
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (hundredths of the currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Parses a decimal string such as `"12.50"`.
    ///
    /// Used at the input boundary (keypad entry, config files).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Decimal::from_str(input.trim())
            .map(Money)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let short = Money::from_cents(-550);
    /// assert!(short.clamp_non_negative().is_zero());
    /// ```
    #[inline]
    pub fn clamp_non_negative(&self) -> Self {
        if self.is_negative() {
            Money::zero()
        } else {
            *self
        }
    }

    /// Calculates tax at the given rate without rounding.
    ///
    /// The result keeps full decimal precision; rounding happens once,
    /// on the grand total, through [`RoundingMode::apply`].
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::{Money, TaxRate};
    ///
    /// let base = Money::from_cents(10000); // 100.00
    /// let tax = base.calculate_tax(TaxRate::from_bps(500));
    /// assert_eq!(tax, Money::from_cents(500)); // 5.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.fraction())
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns the value rounded to two places (half away from zero).
    ///
    /// Display only. Never feed the result back into totals.
    pub fn round_for_display(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns true when the two amounts differ by no more than
    /// [`MONEY_TOLERANCE`].
    pub fn approx_eq(&self, other: Money) -> bool {
        (*self - other).abs() <= MONEY_TOLERANCE
    }
}

/// Display implementation shows the amount with two decimals.
///
/// ## Note
/// No currency symbol here. Use `CheckoutConfig::format_currency` for
/// receipts so the symbol and placement follow the organization settings.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_for_display().0;
        write!(f, "{:.2}", rounded)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate as a decimal fraction in `[0, 1]`.
///
/// `0.05` is 5%. Basis points are accepted as a convenience
/// (1 bps = 0.01%, so 825 bps = 8.25%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(#[ts(type = "string")] Decimal);

impl TaxRate {
    /// Creates a tax rate from a fraction, rejecting values outside `[0, 1]`.
    pub fn from_fraction(fraction: Decimal) -> Result<Self, ValidationError> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(ValidationError::OutOfRange {
                field: "tax_rate".to_string(),
                min: "0".to_string(),
                max: "1".to_string(),
            });
        }
        Ok(TaxRate(fraction))
    }

    /// Creates a tax rate from basis points.
    ///
    /// Values above 10000 bps are clamped to 100%.
    pub fn from_bps(bps: u32) -> Self {
        TaxRate(Decimal::new(i64::from(bps.min(10_000)), 4))
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    pub fn percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl FromStr for TaxRate {
    type Err = ValidationError;

    /// Parses a fraction such as `"0.0825"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fraction =
            Decimal::from_str(s.trim()).map_err(|e| ValidationError::InvalidFormat {
                field: "tax_rate".to_string(),
                reason: e.to_string(),
            })?;
        TaxRate::from_fraction(fraction)
    }
}

// =============================================================================
// Rounding Mode
// =============================================================================

/// How the grand total is rounded.
///
/// ## Modes
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────┐
/// │  none        123.456 → 123.456   (left untouched)                   │
/// │  nearest_5   123.456 → 123.45    (nearest 0.05, cash rounding)      │
/// │  nearest_10  123.456 → 123.50    (nearest 0.10)                     │
/// └─────────────────────────────────────────────────────────────────────┘
/// ```
/// Midpoints round away from zero (123.475 → 123.50 under `nearest_5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundingMode {
    /// No rounding.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Round to the nearest 0.05.
    #[serde(rename = "nearest_5")]
    Nearest5,
    /// Round to the nearest 0.10.
    #[serde(rename = "nearest_10")]
    Nearest10,
}

impl RoundingMode {
    /// Rounding increment in hundredths of the currency unit.
    fn increment(&self) -> Option<Decimal> {
        match self {
            RoundingMode::None => None,
            RoundingMode::Nearest5 => Some(Decimal::new(5, 2)),
            RoundingMode::Nearest10 => Some(Decimal::new(10, 2)),
        }
    }

    /// Rounds an amount to this mode's increment.
    pub fn apply(&self, amount: Money) -> Money {
        match self.increment() {
            None => amount,
            Some(step) => {
                let steps = (amount.amount() / step)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
                Money((steps * step).normalize().round_dp(DISPLAY_PLACES))
            }
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::None => write!(f, "none"),
            RoundingMode::Nearest5 => write!(f, "nearest_5"),
            RoundingMode::Nearest10 => write!(f, "nearest_10"),
        }
    }
}

impl FromStr for RoundingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(RoundingMode::None),
            "nearest_5" | "nearest5" | "0.05" => Ok(RoundingMode::Nearest5),
            "nearest_10" | "nearest10" | "0.10" | "0.1" => Ok(RoundingMode::Nearest10),
            other => Err(ValidationError::InvalidFormat {
                field: "rounding_mode".to_string(),
                reason: format!(
                    "unknown mode '{}', expected none, nearest_5 or nearest_10",
                    other
                ),
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
