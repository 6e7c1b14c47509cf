//! # API Client
//!
//! The shared `reqwest` client, base URL and bearer token, plus the request
//! helpers every repository uses.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  repository (e.g. CashRegisterRepository::close)                       │
//! │       │  endpoint(&["caja-mayor", "cerrar"]) + query [("valor", ..)]    │
//! │       ▼                                                                 │
//! │  ApiClient::send ── bearer token ── timeout (api.timeout_secs)         │
//! │       │                                                                 │
//! │       ├── transport error ──────► HttpError::Transport                 │
//! │       ├── non-2xx ──────────────► HttpError::Backend {status, mensaje} │
//! │       └── 2xx ── read_json ─────► T  (or HttpError::Decode)            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No request is ever retried.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{HttpError, HttpResult};
use crate::repository::{
    CashRegisterRepository, ClientRepository, MovementRepository, ProductRepository,
    SaleRepository,
};

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for the backend.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use drogueria_http::ApiConfig;
///
/// let config = ApiConfig::new("http://localhost:8080")
///     .timeout(Duration::from_secs(10))
///     .token(Some("abc".to_string()));
/// assert_eq!(config.timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root of the API, e.g. `http://localhost:8080` or `https://host/api`.
    pub base_url: String,

    /// Per-request timeout.
    /// Default: 15 seconds
    pub timeout: Duration,

    /// Bearer token of the logged-in user, if any.
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiConfig {
            base_url: base_url.into(),
            timeout: Duration::from_secs(15),
            token: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

// =============================================================================
// Client
// =============================================================================

/// Handle to the backend. Cheap to clone; repositories share its pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Builds the client. Fails on a base URL that is not http(s).
    pub fn new(config: ApiConfig) -> HttpResult<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        debug!(base_url = %base_url, timeout = ?config.timeout, "API client ready");

        Ok(ApiClient {
            client,
            base_url,
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // Repository accessors
    // =========================================================================

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.clone())
    }

    pub fn movements(&self) -> MovementRepository {
        MovementRepository::new(self.clone())
    }

    pub fn cash_registers(&self) -> CashRegisterRepository {
        CashRegisterRepository::new(self.clone())
    }

    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.clone())
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    /// URL of an endpoint. Each segment is percent-encoded on its own, so a
    /// product code can never add path components.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> HttpResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HttpError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and turns non-2xx statuses into [`HttpError::Backend`].
    pub(crate) async fn send(&self, builder: RequestBuilder) -> HttpResult<Response> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        let err = HttpError::from_status(status.as_u16(), &body);
        warn!(url = %url, status = status.as_u16(), error = %err, "Backend rejected request");
        Err(err)
    }

    /// `GET` an endpoint and decode its JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> HttpResult<T> {
        let url = self.endpoint(segments)?;
        let response = self
            .send(self.request(Method::GET, url).query(query))
            .await?;
        read_json(response).await
    }
}

/// Decodes a JSON body, naming the endpoint on failure.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> HttpResult<T> {
    let path = response.url().path().to_string();
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| HttpError::decode(path, e))
}

/// Reads a body that may be empty or not JSON at all (write endpoints).
pub(crate) async fn read_optional_json<T: DeserializeOwned>(response: Response) -> Option<T> {
    let body = response.text().await.ok()?;
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str(&body).ok()
}

fn parse_base_url(raw: &str) -> HttpResult<Url> {
    let invalid = |reason: String| HttpError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.cannot_be_a_base() {
        return Err(invalid("cannot be a base".to_string()));
    }
    Ok(url)
}
