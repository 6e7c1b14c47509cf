//! # Domain Types
//!
//! Canonical shapes for everything the POS reads from or sends to the
//! backend. Wire-format variants are mapped onto these once, in
//! `drogueria-http`, so nothing above the network layer sees backend field
//! names.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  UnitOfSale     │   │    Movement     │   │  ClosingRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │   │  value          │   │  id             │       │
//! │  │  sale_price     │   │  kind           │   │  timestamp      │       │
//! │  │  available      │   │  reason         │   │  value          │       │
//! │  │  min_stock      │   │  timestamp      │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ CashRegisterKind│   │     Page<T>     │   │     Client      │       │
//! │  │  Major / Minor  │   │  content, size  │   │  cédula, name   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Quantity};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1900 bps = 19% (Colombian IVA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for config convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Unit of Sale
// =============================================================================

/// One sellable unit of a product ("forma de venta"): box, blister, unit, kg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UnitOfSale {
    /// Unit name; part of a cart line's identity.
    pub name: String,

    /// Cost to the store (informational).
    pub purchase_price: Money,

    /// Price charged per unit; pinned on the cart line when added.
    pub sale_price: Money,

    /// Stock available in this unit. Never negative.
    #[ts(type = "number")]
    pub available: Quantity,

    /// Threshold under which the back office flags low stock.
    #[ts(type = "number")]
    pub min_stock: Quantity,

    /// Inactive units are still listed but should not be offered first.
    pub active: bool,
}

impl UnitOfSale {
    /// True when the available stock is at or below the minimum threshold.
    pub fn is_low_stock(&self) -> bool {
        self.available <= self.min_stock
    }
}

// =============================================================================
// Products & Clients
// =============================================================================

/// Product row as listed by the backend (no units of sale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSummary {
    pub code: String,
    pub name: String,
    pub active: bool,
    #[ts(as = "Option<String>")]
    pub created_at: Option<NaiveDateTime>,
}

/// A registered client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Client {
    /// Cédula (national id); the backend's primary key.
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Movements
// =============================================================================

/// Direction of a manual cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum MovementKind {
    Ingreso,
    Egreso,
}

impl MovementKind {
    /// Value the backend expects in the `tipo` parameter.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Ingreso => "Ingreso",
            MovementKind::Egreso => "Egreso",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ingreso" | "income" | "in" => Ok(MovementKind::Ingreso),
            "egreso" | "expense" | "out" => Ok(MovementKind::Egreso),
            other => Err(ValidationError::InvalidFormat {
                field: "movement kind".into(),
                reason: format!("'{}' is not Ingreso or Egreso", other),
            }),
        }
    }
}

/// A recorded cash inflow or outflow, independent of sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Movement {
    /// Backend id; absent only for movements not yet persisted.
    pub id: Option<i64>,
    pub value: Money,
    pub kind: MovementKind,
    pub reason: String,
    #[ts(as = "Option<String>")]
    pub timestamp: Option<NaiveDateTime>,
}

impl Movement {
    /// Business date of the movement, if the backend sent a timestamp.
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.date())
    }
}

/// Request to create a movement (already validated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewMovement {
    pub value: Money,
    pub kind: MovementKind,
    pub reason: String,
}

// =============================================================================
// Cash Registers
// =============================================================================

/// The two independent cash pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CashRegisterKind {
    /// Caja mayor: accumulates the day's sales.
    Major,
    /// Caja menor: operational float, fed by transfers from caja mayor.
    Minor,
}

impl CashRegisterKind {
    /// URL segment of this register's endpoints.
    pub const fn path_segment(&self) -> &'static str {
        match self {
            CashRegisterKind::Major => "caja-mayor",
            CashRegisterKind::Minor => "caja-menor",
        }
    }

    /// Name shown to the operator.
    pub const fn label(&self) -> &'static str {
        match self {
            CashRegisterKind::Major => "caja mayor",
            CashRegisterKind::Minor => "caja menor",
        }
    }
}

impl fmt::Display for CashRegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CashRegisterKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mayor" | "major" | "caja-mayor" => Ok(CashRegisterKind::Major),
            "menor" | "minor" | "caja-menor" => Ok(CashRegisterKind::Minor),
            other => Err(ValidationError::InvalidFormat {
                field: "cash register".into(),
                reason: format!("'{}' is not mayor or menor", other),
            }),
        }
    }
}

/// One entry in a register's closing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClosingRecord {
    pub id: Option<i64>,
    #[ts(as = "Option<String>")]
    pub timestamp: Option<NaiveDateTime>,
    /// Counted value recorded at close.
    pub value: Money,
}

/// Current state of a register as reported by `/estado`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashRegisterStatus {
    pub id: Option<i64>,
    pub balance: Money,
}

// =============================================================================
// Sales
// =============================================================================

/// What the backend returns after saving a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SavedSale {
    /// Persisted id (may differ from the provisional one shown before saving).
    pub id: Option<i64>,
    pub total: Option<Money>,
}

/// A completed sale as listed in the sales history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    /// Cédula of the buyer.
    pub client: String,
    pub total: Money,
    #[ts(as = "Option<String>")]
    pub timestamp: Option<NaiveDateTime>,
}

impl Sale {
    /// Case-insensitive match on id, client or total, as the history search
    /// box does.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.id.to_string().contains(&query)
            || self.client.to_lowercase().contains(&query)
            || self.total.pesos().to_string().contains(&query)
    }
}

/// A line of a saved sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleDetailLine {
    pub product_code: String,
    pub product_name: String,
    pub unit_name: String,
    #[ts(type = "number")]
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A saved sale with its lines, as printed on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleDetail {
    pub id: i64,
    pub client: String,
    pub client_name: Option<String>,
    #[ts(as = "Option<String>")]
    pub timestamp: Option<NaiveDateTime>,
    pub discount: Money,
    pub tendered: Money,
    pub change: Money,
    pub total: Money,
    pub lines: Vec<SaleDetailLine>,
}

/// An electronic invoice issued for a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ElectronicInvoice {
    pub id: i64,
    pub sale_id: Option<i64>,
    pub client: String,
    pub total: Money,
    #[ts(as = "Option<String>")]
    pub timestamp: Option<NaiveDateTime>,
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a paged backend listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    pub total_elements: u64,
    /// Zero-based page index.
    pub number: u32,
    pub size: u32,
}

impl<T> Page<T> {
    /// An empty page shaped like the one that was requested.
    ///
    /// Used when a history read fails so pagination controls still render.
    pub fn empty(number: u32, size: u32) -> Self {
        Page {
            content: Vec::new(),
            total_pages: 0,
            total_elements: 0,
            number,
            size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Page indices to show in a pager of `range` buttons around this page.
    pub fn visible_pages(&self, range: u32) -> Vec<u32> {
        visible_pages(self.number, self.total_pages, range)
    }
}

/// Window of page indices centered on `current`, shifted to stay inside
/// `[0, total)`.
///
/// ```rust
/// use drogueria_core::types::visible_pages;
///
/// assert_eq!(visible_pages(0, 10, 5), vec![0, 1, 2, 3, 4]);
/// assert_eq!(visible_pages(5, 10, 5), vec![3, 4, 5, 6, 7]);
/// assert_eq!(visible_pages(9, 10, 5), vec![5, 6, 7, 8, 9]);
/// assert_eq!(visible_pages(1, 3, 5), vec![0, 1, 2]);
/// ```
pub fn visible_pages(current: u32, total: u32, range: u32) -> Vec<u32> {
    let half = range / 2;
    let mut start = current.saturating_sub(half);
    let end = start.saturating_add(range).min(total);
    if end - start.min(end) < range {
        start = end.saturating_sub(range);
    }
    (start..end).collect()
}
