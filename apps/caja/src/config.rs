//! # Caja Configuration
//!
//! Where the backend lives, store defaults and session settings.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     DROGUERIA_API_URL=http://10.0.0.5:8080                             │
//! │     DROGUERIA_API_TOKEN=...                                            │
//! │     DROGUERIA_USER_ID=3                                                │
//! │     DROGUERIA_TAX_RATE=19        (percent)                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/caja/config.toml (Linux)                                 │
//! │     ~/Library/Application Support/co.drogueria.caja/config.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost:8080, 19% IVA, consumidor final 222222222222             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "http://localhost:8080"
//! timeout_secs = 15
//!
//! [store]
//! tax_rate_bps = 1900
//! default_client_id = "222222222222"
//! recheck_removed_on_submit = false
//!
//! [session]
//! user_id = 1
//!
//! [ui]
//! success_notice_ms = 2000
//!
//! [cache]
//! capacity = 256
//! cache_catalogs = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use drogueria_core::{TaxRate, DEFAULT_CLIENT_ID, DEFAULT_TAX_RATE_BPS};
use drogueria_http::ApiConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Backend connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bearer token. Usually supplied through `DROGUERIA_API_TOKEN` rather
    /// than written to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    15
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            token: None,
        }
    }
}

/// Store-wide sale settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// IVA shown on the cart, in basis points.
    #[serde(default = "default_tax_rate")]
    pub tax_rate_bps: u32,

    /// Cédula used when the buyer does not give one.
    #[serde(default = "default_client_id")]
    pub default_client_id: String,

    /// Ask the backend again whether each product was removed right before
    /// posting a sale.
    #[serde(default)]
    pub recheck_removed_on_submit: bool,
}

fn default_tax_rate() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            tax_rate_bps: default_tax_rate(),
            default_client_id: default_client_id(),
            recheck_removed_on_submit: false,
        }
    }
}

/// Logged-in operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_user_id")]
    pub user_id: i64,
}

fn default_user_id() -> i64 {
    1
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            user_id: default_user_id(),
        }
    }
}

/// Notification timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// How long success notices stay visible (milliseconds).
    #[serde(default = "default_success_notice")]
    pub success_notice_ms: u64,
}

fn default_success_notice() -> u64 {
    2000
}

impl Default for UiSettings {
    fn default() -> Self {
        UiSettings {
            success_notice_ms: default_success_notice(),
        }
    }
}

/// Lookup caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum entries per cache.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Keep unit-of-sale catalogs for the whole cart session instead of
    /// fetching them on every selection.
    #[serde(default)]
    pub cache_catalogs: bool,
}

fn default_capacity() -> usize {
    256
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            capacity: default_capacity(),
            cache_catalogs: false,
        }
    }
}

// =============================================================================
// Main Config
// =============================================================================

/// Complete caja configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CajaConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub ui: UiSettings,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl CajaConfig {
    /// Loads configuration from file, then environment, then validates.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading caja config from file");
                config = Self::read_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Like [`CajaConfig::load`], falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load caja config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Writes the configuration as pretty TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Caja config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.api.base_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache.capacity must be greater than 0".into(),
            ));
        }

        if self.store.tax_rate_bps > 10_000 {
            return Err(ConfigError::Invalid(format!(
                "store.tax_rate_bps must be at most 10000 (100%), got: {}",
                self.store.tax_rate_bps
            )));
        }

        if self.store.default_client_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.default_client_id must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Default config file location.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("co", "drogueria", "caja")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn read_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the environment in production).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DROGUERIA_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(token) = lookup("DROGUERIA_API_TOKEN") {
            self.api.token = Some(token).filter(|t| !t.trim().is_empty());
        }

        if let Some(user) = lookup("DROGUERIA_USER_ID") {
            match user.trim().parse::<i64>() {
                Ok(id) => self.session.user_id = id,
                Err(_) => warn!(value = %user, "Ignoring non-numeric DROGUERIA_USER_ID"),
            }
        }

        if let Some(rate) = lookup("DROGUERIA_TAX_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(pct) if pct.is_finite() && pct >= 0.0 => {
                    self.store.tax_rate_bps = TaxRate::from_percentage(pct).bps();
                }
                _ => warn!(value = %rate, "Ignoring invalid DROGUERIA_TAX_RATE"),
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.store.tax_rate_bps)
    }

    pub fn success_notice(&self) -> Duration {
        Duration::from_millis(self.ui.success_notice_ms)
    }

    /// Connection settings for [`drogueria_http::ApiClient`].
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.api.base_url.trim())
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .token(self.api.token.clone())
    }
}
