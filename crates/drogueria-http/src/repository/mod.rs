//! # Repository Module
//!
//! One repository per backend resource. Each holds a clone of the
//! [`ApiClient`](crate::ApiClient) and knows its endpoints.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  api.products()        ──► /productos/...                              │
//! │  api.clients()         ──► /clientes/...                               │
//! │  api.sales()           ──► /venta/...  /efactura/...                   │
//! │  api.movements()       ──► /movimientos/...                            │
//! │  api.cash_registers()  ──► /caja-mayor/...  /caja-menor/...            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Units of sale, removed flag, product list
//! - [`ClientRepository`] - Client lookup by cédula
//! - [`SaleRepository`] - Save, next id, daily total, cancel, history,
//!   electronic invoices
//! - [`MovementRepository`] - Manual cash movements
//! - [`CashRegisterRepository`] - Balance, close, history, status

pub mod cash_register;
pub mod client;
pub mod movement;
pub mod product;
pub mod sale;

pub use cash_register::CashRegisterRepository;
pub use client::ClientRepository;
pub use movement::MovementRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;
