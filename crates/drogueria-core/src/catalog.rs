//! # Unit-of-Sale Catalog
//!
//! The units of sale of the product currently being added to the cart,
//! plus the ticketing used to drop catalog responses that arrive late.
//!
//! ## Selection Flow
//! ```text
//! scan "P1" ──► tracker.issue() = #1 ──► GET formas-venta/P1 ─┐
//! scan "P2" ──► tracker.issue() = #2 ──► GET formas-venta/P2 ─┼─┐
//!                                                             │ │
//!           response P2 arrives ◄─────────────────────────────┼─┘  #2 current → apply
//!           response P1 arrives ◄─────────────────────────────┘    #1 stale   → drop
//! ```

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Quantity};
use crate::types::UnitOfSale;

// =============================================================================
// Unit Catalog
// =============================================================================

/// Units of sale for one product, in backend order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitCatalog {
    product_code: String,
    product_name: String,
    units: Vec<UnitOfSale>,
    active: usize,
}

impl UnitCatalog {
    /// Wraps a fetched unit list. The first unit is active by default.
    pub fn new(
        product_code: impl Into<String>,
        product_name: impl Into<String>,
        units: Vec<UnitOfSale>,
    ) -> Self {
        UnitCatalog {
            product_code: product_code.into(),
            product_name: product_name.into(),
            units,
            active: 0,
        }
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn units(&self) -> &[UnitOfSale] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Makes unit `index` the active one.
    ///
    /// An out-of-range index is rejected and the selection is unchanged.
    pub fn select(&mut self, index: usize) -> CoreResult<&UnitOfSale> {
        if index >= self.units.len() {
            return Err(CoreError::UnitIndexOutOfRange {
                index,
                len: self.units.len(),
            });
        }
        self.active = index;
        Ok(&self.units[index])
    }

    /// The active unit, or `None` for a product without units.
    pub fn active(&self) -> Option<&UnitOfSale> {
        self.units.get(self.active)
    }

    /// Price shown next to the quantity field.
    pub fn active_price(&self) -> Option<Money> {
        self.active().map(|u| u.sale_price)
    }

    /// Stock shown next to the quantity field.
    pub fn active_available(&self) -> Option<Quantity> {
        self.active().map(|u| u.available)
    }

    pub fn find(&self, name: &str) -> Option<&UnitOfSale> {
        self.units.iter().find(|u| u.name == name)
    }

    /// "{unit} de {product}" for the active unit.
    pub fn display_label(&self) -> Option<String> {
        self.active().map(|u| unit_label(&u.name, &self.product_name))
    }

    /// Hands the unit list over (e.g. to the cart's unit registry).
    pub fn into_units(self) -> Vec<UnitOfSale> {
        self.units
    }
}

/// Label used in pickers and receipts: "Caja de Acetaminofén".
pub fn unit_label(unit_name: &str, product_name: &str) -> String {
    format!("{} de {}", unit_name, product_name)
}

// =============================================================================
// Selection Tickets
// =============================================================================

/// Identifies one product selection; later selections get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionTicket(u64);

impl SelectionTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues selection tickets and tells whether a ticket is still current.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    latest: u64,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new selection, superseding every earlier ticket.
    pub fn issue(&mut self) -> SelectionTicket {
        self.latest += 1;
        SelectionTicket(self.latest)
    }

    /// True if no newer selection was started after `ticket`.
    pub fn is_current(&self, ticket: SelectionTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Supersedes every outstanding ticket without starting a selection.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }
}
