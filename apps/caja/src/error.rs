//! # POS Error Type
//!
//! Unified error type for the caja workflows and CLI.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Caja App                           │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Workflow (e.g. transfer_major_to_minor)                         │  │
//! │  │  Result<T, PosError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Pre-check failed? ─── CoreError::TransferExceedsBalance ──┐    │  │
//! │  │         │                                                  │    │  │
//! │  │         ▼                                                  ▼    │  │
//! │  │  Backend refused? ─── HttpError::Backend {mensaje} ──── PosError │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Second step failed? ─── PosError::partial_failure ─────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  The `message` is what the notifier shows; `code` is for callers.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use drogueria_core::{CoreError, TenderError};
use drogueria_http::HttpError;

use crate::config::ConfigError;

/// Error returned from every caja workflow.
///
/// ## Serialization
/// ```json
/// {
///   "code": "PARTIAL_FAILURE",
///   "message": "Caja mayor was closed but ..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for workflow results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Business rule refused the operation
    BusinessLogic,

    /// Amount received at checkout was refused
    PaymentError,

    /// The backend answered with an error status
    BackendError,

    /// The backend could not be reached
    Network,

    /// The first step of a two-step operation succeeded, the second did not
    PartialFailure,

    /// The session was cancelled while waiting on the backend
    Cancelled,

    /// Configuration could not be loaded or is invalid
    Config,

    /// Internal error
    Internal,
}

impl PosError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        PosError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        PosError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a partial-failure error.
    pub fn partial_failure(message: impl Into<String>) -> Self {
        PosError::new(ErrorCode::PartialFailure, message)
    }

    /// The session was cancelled.
    pub fn cancelled() -> Self {
        PosError::new(ErrorCode::Cancelled, "Operation cancelled")
    }

    /// Maps a backend error, showing the backend's `mensaje` when it sent one.
    pub fn from_backend(err: HttpError, fallback: &str) -> Self {
        let code = http_code(&err);
        let message = match &err {
            HttpError::Backend { .. } => err.user_message(fallback),
            HttpError::NotFound { .. } => err.to_string(),
            _ => fallback.to_string(),
        };
        PosError::new(code, message)
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }
}

fn http_code(err: &HttpError) -> ErrorCode {
    if err.is_not_found() {
        return ErrorCode::NotFound;
    }
    match err {
        HttpError::Transport(_) => ErrorCode::Network,
        HttpError::Backend { .. } => ErrorCode::BackendError,
        HttpError::Decode { .. } | HttpError::InvalidUrl { .. } => ErrorCode::Internal,
        HttpError::NotFound { .. } => ErrorCode::NotFound,
    }
}

/// Converts backend errors, keeping the backend's message when present.
impl From<HttpError> for PosError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Transport(e) => {
                tracing::error!("Backend unreachable: {}", e);
                PosError::new(ErrorCode::Network, "Could not reach the server")
            }
            HttpError::Decode { path, reason } => {
                tracing::error!(path = %path, "Unreadable backend response: {}", reason);
                PosError::new(ErrorCode::Internal, "Unexpected response from the server")
            }
            other => {
                let fallback = other.to_string();
                PosError::from_backend(other, &fallback)
            }
        }
    }
}

/// Converts core errors.
impl From<CoreError> for PosError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) | CoreError::ClientNotFound(_) => ErrorCode::NotFound,
            CoreError::LineNotFound { .. } => ErrorCode::NotFound,
            CoreError::Tender(_) => ErrorCode::PaymentError,
            CoreError::Validation(_)
            | CoreError::UnitIndexOutOfRange { .. }
            | CoreError::EmptyCart => ErrorCode::ValidationError,
            CoreError::RemovedProduct(_)
            | CoreError::NoUnitsOfSale(_)
            | CoreError::NegativeTotal { .. }
            | CoreError::TransferExceedsBalance { .. }
            | CoreError::InvalidTransition { .. } => ErrorCode::BusinessLogic,
        };
        PosError::new(code, err.to_string())
    }
}

impl From<TenderError> for PosError {
    fn from(err: TenderError) -> Self {
        PosError::from(CoreError::from(err))
    }
}

impl From<ConfigError> for PosError {
    fn from(err: ConfigError) -> Self {
        PosError::new(ErrorCode::Config, err.to_string())
    }
}

impl std::fmt::Display for PosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for PosError {}

/// Result type for caja workflows.
pub type PosResult<T> = Result<T, PosError>;

#[cfg(test)]
mod tests {
    use super::*;
    use drogueria_core::Money;

    #[test]
    fn test_backend_message_is_kept() {
        let err: PosError =
            HttpError::from_status(409, r#"{"mensaje":"Caja ya cerrada"}"#).into();
        assert_eq!(err.code, ErrorCode::BackendError);
        assert_eq!(err.message, "Caja ya cerrada");
    }

    #[test]
    fn test_backend_404_is_not_found() {
        let err: PosError = HttpError::from_status(404, "").into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_from_backend_uses_fallback() {
        let err = PosError::from_backend(HttpError::from_status(500, ""), "No se pudo cerrar");
        assert_eq!(err.message, "No se pudo cerrar");
    }

    #[test]
    fn test_core_error_codes() {
        let err: PosError = CoreError::TransferExceedsBalance {
            amount: Money::from_pesos(10_000),
            balance: Money::from_pesos(8_000),
        }
        .into();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(err.message.contains("$ 8,000"));

        let err: PosError = TenderError::Missing.into();
        assert_eq!(err.code, ErrorCode::PaymentError);

        let err: PosError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&PosError::cancelled()).unwrap();
        assert_eq!(json, r#"{"code":"CANCELLED","message":"Operation cancelled"}"#);
    }
}
