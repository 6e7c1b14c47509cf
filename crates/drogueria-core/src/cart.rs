//! # Cart Engine
//!
//! Lines, stock clamping and totals for one checkout session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action           Method                  Effect               │
//! │  ───────────────           ──────                  ──────               │
//! │                                                                         │
//! │  Add product ────────────► add_or_increment() ───► push or qty += n    │
//! │                                                    (no stock clamp)     │
//! │  Edit quantity ──────────► set_quantity() ───────► clamp [0, stock]    │
//! │                                                    0 removes the line   │
//! │  Change unit ────────────► set_unit() ───────────► re-price, clamp ↓   │
//! │                                                                         │
//! │  Remove ─────────────────► remove() ─────────────► lines.remove(i)     │
//! │                                                                         │
//! │  Sale saved / reset ─────► reset() ──────────────► lines + totals = 0  │
//! │                                                    (units kept)         │
//! │                                                                         │
//! │  Every mutation ends in recompute():                                   │
//! │    subtotal = Σ qty × unit_price                                        │
//! │    tax      = subtotal × 19%        (display only)                      │
//! │    total    = subtotal − discount                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `(product_code, unit_name)`
//! - Every line has `quantity > 0`
//! - `set_quantity` and `set_unit` never leave a quantity above the stock of
//!   the line's unit, when that stock is known
//! - `total == subtotal - discount` and `total >= 0` after every operation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Quantity};
use crate::types::{TaxRate, UnitOfSale};

// =============================================================================
// Line Key
// =============================================================================

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineKey {
    pub product_code: String,
    pub unit_name: String,
}

impl LineKey {
    pub fn new(product_code: impl Into<String>, unit_name: impl Into<String>) -> Self {
        LineKey {
            product_code: product_code.into(),
            unit_name: unit_name.into(),
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A product in the cart, in one unit of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_code: String,
    pub product_name: String,
    pub unit_name: String,
    #[ts(type = "number")]
    pub quantity: Quantity,
    /// Sale price when the line was added (or its unit last changed).
    pub unit_price: Money,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey::new(&self.product_code, &self.unit_name)
    }

    fn matches(&self, key: &LineKey) -> bool {
        self.product_code == key.product_code && self.unit_name == key.unit_name
    }

    /// `unit_price × quantity`, rounded to whole pesos.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Result of [`Cart::add_or_increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOutcome {
    /// True when an existing line was incremented.
    pub merged: bool,
    /// Line quantity after the add.
    pub quantity: Quantity,
    /// True when the line now holds more than the unit's known stock.
    ///
    /// Adding does not clamp; callers decide how to surface this.
    pub exceeds_available: bool,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart of one checkout session. Never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub(crate) lines: Vec<CartLine>,

    /// Units of sale seen for each product code, for stock resolution.
    #[serde(skip)]
    pub(crate) units: HashMap<String, Vec<UnitOfSale>>,

    pub(crate) tax_rate: TaxRate,
    pub(crate) subtotal: Money,
    pub(crate) tax: Money,
    pub(crate) discount: Money,
    pub(crate) discount_applied: bool,
    pub(crate) real_total: Money,
    pub(crate) total: Money,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new(tax_rate: TaxRate) -> Self {
        Cart {
            lines: Vec::new(),
            units: HashMap::new(),
            tax_rate,
            subtotal: Money::zero(),
            tax: Money::zero(),
            discount: Money::zero(),
            discount_applied: false,
            real_total: Money::zero(),
            total: Money::zero(),
        }
    }

    // =========================================================================
    // Unit registry
    // =========================================================================

    /// Records the units of sale of a product so its lines can be clamped.
    pub fn register_units(&mut self, product_code: impl Into<String>, units: Vec<UnitOfSale>) {
        self.units.insert(product_code.into(), units);
    }

    /// Known units of sale for a product (empty if never registered).
    pub fn known_units(&self, product_code: &str) -> &[UnitOfSale] {
        self.units
            .get(product_code)
            .map(|u| u.as_slice())
            .unwrap_or(&[])
    }

    fn find_unit(&self, product_code: &str, unit_name: &str) -> Option<&UnitOfSale> {
        self.known_units(product_code)
            .iter()
            .find(|u| u.name == unit_name)
    }

    /// Stock cap for a line; `None` when the unit is unknown (no cap).
    pub fn available_for(&self, key: &LineKey) -> Option<Quantity> {
        self.find_unit(&key.product_code, &key.unit_name)
            .map(|u| u.available)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a line or increments the existing one with the same key.
    ///
    /// The increment is NOT clamped to stock; `AddOutcome::exceeds_available`
    /// reports when the result is above the known availability.
    pub fn add_or_increment(
        &mut self,
        product_code: &str,
        product_name: &str,
        unit_name: &str,
        quantity: Quantity,
        unit_price: Money,
    ) -> CoreResult<AddOutcome> {
        if !quantity.is_positive() {
            return Err(ValidationError::must_be_positive("quantity").into());
        }

        let key = LineKey::new(product_code, unit_name);
        let merged = match self.lines.iter_mut().find(|l| l.matches(&key)) {
            Some(line) => {
                line.quantity += quantity;
                true
            }
            None => {
                self.lines.push(CartLine {
                    product_code: product_code.to_string(),
                    product_name: product_name.to_string(),
                    unit_name: unit_name.to_string(),
                    quantity,
                    unit_price,
                });
                false
            }
        };

        let line_quantity = self
            .line(&key)
            .map(|l| l.quantity)
            .unwrap_or(quantity);
        let exceeds_available = self
            .available_for(&key)
            .is_some_and(|cap| line_quantity > cap);

        self.recompute();

        Ok(AddOutcome {
            merged,
            quantity: line_quantity,
            exceeds_available,
        })
    }

    /// Sets a line's quantity, clamped to `[0, available]`.
    ///
    /// A clamped result of zero removes the line. Returns the quantity that
    /// was applied.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: Quantity) -> CoreResult<Quantity> {
        let cap = self.available_for(key);
        let index = self.position(key)?;
        let clamped = quantity.clamp_to(cap);

        if clamped.is_zero() {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity = clamped;
        }

        self.recompute();
        Ok(clamped)
    }

    /// Switches a line to another unit of the same product.
    ///
    /// Re-reads the price and lowers the quantity to the new unit's stock if
    /// needed (never raises it). Returns `false` and leaves the line untouched
    /// when the unit is not among the product's known units. If another line
    /// already uses the target unit the two are merged.
    pub fn set_unit(&mut self, key: &LineKey, new_unit: &str) -> CoreResult<bool> {
        let index = self.position(key)?;
        let Some(unit) = self.find_unit(&key.product_code, new_unit).cloned() else {
            return Ok(false);
        };

        let target = LineKey::new(&key.product_code, new_unit);
        let mut quantity = self.lines[index].quantity;

        if target != *key {
            if let Some(other) = self.lines.iter().position(|l| l.matches(&target)) {
                quantity += self.lines[other].quantity;
                self.lines.remove(other);
            }
        }

        // position may have shifted after a merge
        let index = self.position(key)?;
        let line = &mut self.lines[index];
        line.unit_name = unit.name.clone();
        line.unit_price = unit.sale_price;
        line.quantity = if quantity > unit.available {
            unit.available
        } else {
            quantity
        };

        if !line.quantity.is_positive() {
            self.lines.remove(index);
        }

        self.recompute();
        Ok(true)
    }

    /// Deletes a line.
    pub fn remove(&mut self, key: &LineKey) -> CoreResult<CartLine> {
        let index = self.position(key)?;
        let line = self.lines.remove(index);
        self.recompute();
        Ok(line)
    }

    /// Recalculates subtotal, tax and total from the current lines.
    ///
    /// An applied discount that no longer fits under the new subtotal is
    /// cancelled so the total never goes negative.
    pub fn recompute(&mut self) {
        self.subtotal = self.lines.iter().map(CartLine::line_total).sum();
        self.tax = self.subtotal.calculate_tax(self.tax_rate);
        self.real_total = self.subtotal;

        if self.discount_applied && self.discount > self.real_total {
            self.discount = Money::zero();
            self.discount_applied = false;
        }

        self.total = self.real_total - self.discount;
    }

    /// Empties the cart and zeroes every total.
    ///
    /// Registered units of sale survive so the next sale's lines stay
    /// clamped to stock.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.discount = Money::zero();
        self.discount_applied = false;
        self.recompute();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn position(&self, key: &LineKey) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.matches(key))
            .ok_or_else(|| CoreError::LineNotFound {
                product_code: key.product_code.clone(),
                unit_name: key.unit_name.clone(),
            })
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(key))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn discount_applied(&self) -> bool {
        self.discount_applied
    }

    pub fn real_total(&self) -> Money {
        self.real_total
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new(TaxRate::default())
    }
}

/// Totals summary for the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub discount_applied: bool,
    pub real_total: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.len(),
            subtotal: cart.subtotal,
            tax: cart.tax,
            discount: cart.discount,
            discount_applied: cart.discount_applied,
            real_total: cart.real_total,
            total: cart.total,
        }
    }
}
