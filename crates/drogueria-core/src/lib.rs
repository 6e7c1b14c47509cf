//! # drogueria-core: Pure Business Logic for the Droguería POS
//!
//! Everything in this crate is deterministic and free of I/O. The network
//! layer (`drogueria-http`) and the session layer (`apps/caja`) call into it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Droguería POS Architecture                        │
//! │                                                                         │
//! │  Barcode scans ──┐                          ┌── Scale frames            │
//! │                  ▼                          ▼                           │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/caja (sessions, workflows)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ drogueria-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │  │ catalog │ │  cart   │ │ discount │ │ checkout │ │  cash  │  │   │
//! │  │  │ units   │ │ lines   │ │ flat $   │ │ phases   │ │ close  │  │   │
//! │  │  │ tickets │ │ clamps  │ │ cancel   │ │ tender   │ │ moves  │  │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └──────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO TIMERS • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              drogueria-http (backend API client)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer pesos and fixed-point quantities
//! - [`format`] - Formatted amount input parsing and display
//! - [`types`] - Domain types (UnitOfSale, Movement, ClosingRecord, Page, ...)
//! - [`catalog`] - Units of sale for the selected product
//! - [`cart`] - Cart lines, clamping and totals
//! - [`discount`] - Flat discount application and cancellation
//! - [`scale`] - Weight-scale frame parsing and focus routing
//! - [`checkout`] - Checkout state machine, client form and tender
//! - [`cash`] - Daily cash position and close/transfer pre-checks
//! - [`validation`] - Field validators
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use drogueria_core::{Cart, Money, Quantity, TaxRate};
//!
//! let mut cart = Cart::new(TaxRate::from_bps(1900));
//! cart.add_or_increment("P1", "Acetaminofén", "Unidad", Quantity::from_units(2), Money::from_pesos(5000))
//!     .unwrap();
//!
//! assert_eq!(cart.subtotal().pesos(), 10_000);
//! assert_eq!(cart.tax().pesos(), 1_900);
//! assert_eq!(cart.total().pesos(), 10_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod cash;
pub mod catalog;
pub mod checkout;
pub mod discount;
pub mod error;
pub mod format;
pub mod money;
pub mod scale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{AddOutcome, Cart, CartLine, CartTotals, LineKey};
pub use catalog::{SelectionTicket, SelectionTracker, UnitCatalog};
pub use checkout::{Checkout, CheckoutPhase, ClientField, ClientForm, SaleDraft, SaleLine, Tender};
pub use error::{CoreError, CoreResult, TenderError, ValidationError};
pub use money::{Money, Quantity};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Colombian IVA shown on the cart (display only, never added to the total).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1900;

/// Cédula of the generic "consumidor final" client.
pub const DEFAULT_CLIENT_ID: &str = "222222222222";
