//! # State Module
//!
//! Session-scoped state for the caja workflows.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │  SessionContext  │  │   CartSession    │  │    LookupCache       │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  user_id         │  │  Cart            │  │  bounded FIFO        │  │
//! │  │  token           │  │  Checkout        │  │  removed products    │  │
//! │  │  default client  │  │  selection       │  │  unit catalogs       │  │
//! │  │  tax rate        │  │  scale focus     │  │  (opt-in)            │  │
//! │  └──────────────────┘  │  cancel token    │  └──────────────────────┘  │
//! │                        └──────────────────┘                             │
//! │                                                                         │
//! │  OWNERSHIP:                                                            │
//! │  • SessionContext: read-only, passed by reference                      │
//! │  • CartSession: one owner, workflows take &mut                         │
//! │  • Cash balances: owned by the backend, never cached                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cache;
mod cart;
mod session;

pub use cache::LookupCache;
pub use cart::{CacheOptions, CartSession, SelectionOutcome};
pub use session::SessionContext;
