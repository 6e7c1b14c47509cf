//! # Droguería Caja
//!
//! Session workflows of the drugstore POS: selling from a cart, closing and
//! reconciling caja mayor and caja menor, and manual cash movements.
//!
//! ## Module Organization
//! ```text
//! drogueria_caja/
//! ├── lib.rs          ◄─── You are here (startup helpers)
//! ├── config.rs       ◄─── TOML + env configuration
//! ├── error.rs        ◄─── PosError for every workflow
//! ├── notify.rs       ◄─── Success / error notices
//! ├── state/
//! │   ├── session.rs  ◄─── SessionContext (user, token, defaults)
//! │   ├── cart.rs     ◄─── CartSession (cart, checkout, scale, cancel)
//! │   └── cache.rs    ◄─── Bounded FIFO lookup cache
//! └── commands/
//!     ├── cart.rs     ◄─── Product selection, add to cart
//!     ├── checkout.rs ◄─── Sale submission
//!     ├── cash.rs     ◄─── CashDesk: balances, closes, transfers, position
//!     ├── movement.rs ◄─── Manual income / expenses
//!     └── sales.rs    ◄─── Sales history, receipts, electronic invoices
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: info,drogueria=debug; override with RUST_LOG             │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • config.toml from the platform config dir                          │
//! │     • DROGUERIA_* environment overrides, then validation                │
//! │                                                                         │
//! │  3. Build Session ────────────────────────────────────────────────────► │
//! │     • SessionContext from config                                        │
//! │     • ApiClient (reqwest) from config                                   │
//! │                                                                         │
//! │  4. Run the requested workflow                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod notify;
pub mod state;

use std::path::PathBuf;

use tracing::{info, Subscriber};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use drogueria_http::ApiClient;

pub use config::CajaConfig;
pub use error::{ErrorCode, PosError, PosResult};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use state::{CacheOptions, CartSession, LookupCache, SelectionOutcome, SessionContext};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=drogueria=trace` - Show trace for the POS crates only
/// - Default: `info,drogueria=debug`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    log_subscriber(filter).init();
}

const DEFAULT_LOG_FILTER: &str = "info,drogueria=debug";

fn log_subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt().with_env_filter(filter).finish()
}

/// Loads configuration and builds the session and the backend client.
pub fn bootstrap(config_path: Option<PathBuf>) -> PosResult<(CajaConfig, SessionContext, ApiClient)> {
    let config = CajaConfig::load(config_path)?;
    let session = SessionContext::from_config(&config);
    let api = ApiClient::new(config.api_config())?;

    info!(
        base_url = %api.base_url(),
        user_id = session.user_id,
        "Caja session ready"
    );
    Ok((config, session, api))
}
