//! # HTTP Error Types
//!
//! Errors raised while talking to the backend.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  reqwest::Error / non-2xx status / bad JSON                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  HttpError (this module) ← keeps the backend's `mensaje` if it sent one │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PosError (apps/caja) ← code + operator-facing message                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Error notice                                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Deserialize;
use thiserror::Error;

/// Backend communication errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request never produced a response.
    ///
    /// ## When This Occurs
    /// - Backend down or unreachable
    /// - Request timed out (`api.timeout_secs`)
    /// - TLS failure
    #[error("Could not reach the backend: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}{}", .mensaje.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Backend { status: u16, mensaje: Option<String> },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {path}: {reason}")]
    Decode { path: String, reason: String },

    /// The requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The configured base URL cannot carry API paths.
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type alias for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Error body the backend sends with failed writes.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(alias = "message", alias = "error")]
    pub mensaje: Option<String>,
}

impl HttpError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        HttpError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub(crate) fn decode(path: impl Into<String>, reason: impl ToString) -> Self {
        HttpError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Builds a `Backend` error from a status and the raw response body.
    ///
    /// A JSON body with a `mensaje` field keeps that message; a short plain
    /// text body is kept as is; anything else is dropped.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let mensaje = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.mensaje.filter(|m| !m.trim().is_empty()),
            Err(_) if !body.is_empty() && body.len() <= 200 && !body.starts_with('<') => {
                Some(body.to_string())
            }
            Err(_) => None,
        };
        HttpError::Backend { status, mensaje }
    }

    /// The backend's own message when it sent one, else `fallback`.
    ///
    /// ```rust
    /// use drogueria_http::HttpError;
    ///
    /// let err = HttpError::from_status(400, r#"{"mensaje":"Stock insuficiente"}"#);
    /// assert_eq!(err.user_message("No se pudo guardar la venta"), "Stock insuficiente");
    ///
    /// let err = HttpError::from_status(500, "");
    /// assert_eq!(err.user_message("No se pudo guardar la venta"), "No se pudo guardar la venta");
    /// ```
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            HttpError::Backend {
                mensaje: Some(m), ..
            } => m.clone(),
            _ => fallback.to_string(),
        }
    }

    /// HTTP status of a backend rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Backend { status, .. } => Some(*status),
            HttpError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for `NotFound` and 404 responses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HttpError::NotFound { .. }) || self.status() == Some(404)
    }
}
