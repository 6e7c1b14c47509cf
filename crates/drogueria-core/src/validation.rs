//! # Validation Module
//!
//! Field validators run before anything reaches the backend.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input formatting (format.rs)                                 │
//! │  └── Strips junk from amount fields as the cashier types               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, lengths, positive amounts                        │
//! │  └── Codes that end up in URL paths                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Stock, uniqueness, balances                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest page the history endpoints are asked for.
pub const MAX_PAGE_SIZE: u32 = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field and returns it trimmed.
pub fn validate_required<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value)
}

/// Validates a product code before it is used in a URL path.
///
/// ```rust
/// use drogueria_core::validation::validate_product_code;
///
/// assert!(validate_product_code("7702057012345").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("../admin").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<&str> {
    let code = validate_required("product code", code, 50)?;

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "product code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code)
}

/// Validates a client cédula.
pub fn validate_client_id(id: &str) -> ValidationResult<&str> {
    let id = validate_required("client id", id, 20)?;

    if !id.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "client id".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(id)
}

/// Movement reasons are optional but bounded.
pub fn validate_reason(reason: &str) -> ValidationResult<&str> {
    let reason = reason.trim();
    if reason.chars().count() > 255 {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: 255,
        });
    }
    Ok(reason)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Rejects zero and negative amounts.
///
/// ```rust
/// use drogueria_core::validation::validate_positive_amount;
/// use drogueria_core::Money;
///
/// assert!(validate_positive_amount("value", Money::from_pesos(1)).is_ok());
/// assert!(validate_positive_amount("value", Money::zero()).is_err());
/// ```
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<Money> {
    if !amount.is_positive() {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(amount)
}

/// Validates a history page request.
pub fn validate_page_request(page: u32, size: u32) -> ValidationResult<(u32, u32)> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }
    Ok((page, size))
}

// =============================================================================
// Dates
// =============================================================================

/// Parses a `YYYY-MM-DD` business date.
pub fn parse_business_date(raw: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| ValidationError::InvalidFormat {
        field: "date".to_string(),
        reason: e.to_string(),
    })
}
