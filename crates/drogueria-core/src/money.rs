//! # Money Module
//!
//! `Money` for currency and `Quantity` for amounts of product.
//!
//! ## Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Colombian pesos have no fractional unit in day-to-day retail.         │
//! │                                                                         │
//! │    Money(5000)          = $ 5,000                                       │
//! │                                                                         │
//! │  Quantities can be fractional (weighed products, up to 3 decimals):    │
//! │                                                                         │
//! │    Quantity(2000)       = 2 units                                       │
//! │    Quantity(1250)       = 1.25 kg                                       │
//! │                                                                         │
//! │  Line total = price × quantity, rounded half-up to whole pesos:        │
//! │    $ 3,999 × 1.25 = 4998.75 → $ 4,999                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both are integers internally so cart arithmetic never drifts.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::format::group_thousands;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole pesos.
///
/// ## Design Decisions
/// - **i64 (signed)**: cash positions and movement totals can go negative
/// - **Newtype serde**: the backend sends and expects plain integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole pesos.
    ///
    /// ```rust
    /// use drogueria_core::money::Money;
    ///
    /// let price = Money::from_pesos(5000);
    /// assert_eq!(price.pesos(), 5000);
    /// ```
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos)
    }

    /// Returns the value in pesos.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
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

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Floors a floating amount typed by the cashier to whole pesos.
    ///
    /// Returns `None` for NaN, infinities and values outside the i64 range.
    pub fn floor_from_f64(value: f64) -> Option<Money> {
        if !value.is_finite() {
            return None;
        }
        let floored = value.floor();
        if floored < i64::MIN as f64 || floored > i64::MAX as f64 {
            return None;
        }
        Some(Money(floored as i64))
    }

    /// Calculates tax on this amount, rounding half-up.
    ///
    /// ```rust
    /// use drogueria_core::{Money, TaxRate};
    ///
    /// let subtotal = Money::from_pesos(25_000);
    /// let iva = subtotal.calculate_tax(TaxRate::from_bps(1900));
    /// assert_eq!(iva.pesos(), 4_750);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 so large subtotals cannot overflow
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money(tax as i64)
    }

    /// Multiplies a unit price by a (possibly fractional) quantity.
    ///
    /// ```rust
    /// use drogueria_core::{Money, Quantity};
    ///
    /// let per_kg = Money::from_pesos(3_999);
    /// let line = per_kg.multiply_quantity(Quantity::from_milli(1_250));
    /// assert_eq!(line.pesos(), 4_999);
    /// ```
    pub fn multiply_quantity(&self, qty: Quantity) -> Money {
        let raw = self.0 as i128 * qty.milli() as i128;
        let scale = Quantity::SCALE as i128;
        let rounded = if raw >= 0 {
            (raw + scale / 2) / scale
        } else {
            (raw - scale / 2) / scale
        };
        Money(rounded as i64)
    }
}

/// Display in the store's format: `$ 12,345`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}$ {}", sign, group_thousands(self.0.unsigned_abs()))
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
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Quantity Type
// =============================================================================

/// An amount of product in thousandths of a unit.
///
/// Serialized as a plain JSON number (`1.25`) because that is what the
/// backend and the scale both speak. On the TypeScript side fields of this
/// type are annotated `#[ts(type = "number")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(i64);

impl Quantity {
    /// Thousandths per unit.
    pub const SCALE: i64 = 1000;

    /// Smallest quantity a scale reading may set (0.01).
    pub const MIN_READING: Quantity = Quantity(10);

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    /// Whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * Self::SCALE)
    }

    /// Raw thousandths.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Rounds a float to 3 decimals (half away from zero).
    ///
    /// Non-finite input becomes zero.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Quantity::zero();
        }
        Quantity((value * Self::SCALE as f64).round() as i64)
    }

    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Rounds to `decimals` places (0..=3), half away from zero.
    ///
    /// ```rust
    /// use drogueria_core::Quantity;
    ///
    /// assert_eq!(Quantity::from_milli(1_235).round_to(2), Quantity::from_milli(1_240));
    /// assert_eq!(Quantity::from_milli(1_234).round_to(2), Quantity::from_milli(1_230));
    /// ```
    pub fn round_to(&self, decimals: u32) -> Self {
        let decimals = decimals.min(3);
        let step = 10_i64.pow(3 - decimals);
        if step == 1 {
            return *self;
        }
        let half = step / 2;
        let rounded = if self.0 >= 0 {
            (self.0 + half) / step * step
        } else {
            (self.0 - half) / step * step
        };
        Quantity(rounded)
    }

    /// Clamps into `[0, cap]`; `None` means no upper bound is known.
    pub fn clamp_to(&self, cap: Option<Quantity>) -> Self {
        let floor = self.0.max(0);
        match cap {
            Some(cap) => Quantity(floor.min(cap.0.max(0))),
            None => Quantity(floor),
        }
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// `2`, `1.25`, `0.005` (trailing zeros trimmed).
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        let digits = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("quantity must be a finite number"));
        }
        Ok(Quantity::from_f64(value))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
