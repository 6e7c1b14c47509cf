//! # Discount Calculator
//!
//! A flat peso discount over the whole cart.
//!
//! ```text
//!  real_total 25,000 ──apply(5,000)──► total 20,000   applied
//!        ▲                                  │
//!        └─────────── cancel() ◄────────────┘          not applied
//!
//!  apply(30,000) on 25,000 ──► NegativeTotal, nothing changes
//! ```
//!
//! `real_total` is the pre-discount total, so applying again replaces the
//! previous discount instead of stacking on it.

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::format::parse_formatted_amount;
use crate::money::Money;

impl Cart {
    /// Applies a flat discount, returning the new total.
    ///
    /// Rejects non-positive amounts and amounts larger than the real total.
    /// On rejection the cart is unchanged.
    pub fn apply_discount(&mut self, amount: Money) -> CoreResult<Money> {
        if !amount.is_positive() {
            return Err(ValidationError::must_be_positive("discount").into());
        }

        if self.real_total - amount < Money::zero() {
            return Err(CoreError::NegativeTotal {
                total: self.real_total,
                discount: amount,
            });
        }

        self.discount = amount;
        self.discount_applied = true;
        self.total = self.real_total - amount;
        Ok(self.total)
    }

    /// Restores the real total. A no-op when no discount is applied.
    pub fn cancel_discount(&mut self) -> Money {
        self.discount = Money::zero();
        self.discount_applied = false;
        self.total = self.real_total;
        self.total
    }
}

/// Reads the discount field. Empty or non-numeric text means no discount.
pub fn parse_discount_input(raw: &str) -> Money {
    parse_formatted_amount(raw)
}
