//! # drogueria-http: Backend API Client for the Droguería POS
//!
//! All durable state (products, clients, sales, cash ledgers) lives in the
//! backend. This crate is the only place that talks to it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Droguería POS Data Flow                             │
//! │                                                                         │
//! │  apps/caja workflow (e.g. transfer_major_to_minor)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  drogueria-http (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   ApiClient   │    │  Repositories │    │  normalize   │  │   │
//! │  │   │  (client.rs)  │    │               │    │              │  │   │
//! │  │   │               │    │ ProductRepo   │    │ Wire* DTOs   │  │   │
//! │  │   │ reqwest pool  │◄───│ SaleRepo      │───►│ aliases      │  │   │
//! │  │   │ base URL      │    │ MovementRepo  │    │ VentaPayload │  │   │
//! │  │   │ bearer token  │    │ CashRegister… │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Backend REST API                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - `ApiConfig`, `ApiClient` and request helpers
//! - [`backend`] - Traits the workflows are generic over
//! - [`repository`] - One repository per backend resource
//! - [`normalize`] - Wire DTOs and their mapping to core types
//! - [`error`] - HTTP error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drogueria_http::{ApiClient, ApiConfig};
//! use drogueria_core::CashRegisterKind;
//!
//! let api = ApiClient::new(ApiConfig::new("http://localhost:8080"))?;
//! let balance = api.cash_registers().balance(CashRegisterKind::Major).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod client;
pub mod error;
pub mod normalize;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{
    CashRegisterBackend, ClientBackend, InvoiceBackend, MovementBackend, ProductBackend,
    SaleBackend,
};
pub use client::{ApiClient, ApiConfig};
pub use error::{HttpError, HttpResult};

pub use repository::{
    CashRegisterRepository, ClientRepository, MovementRepository, ProductRepository,
    SaleRepository,
};
