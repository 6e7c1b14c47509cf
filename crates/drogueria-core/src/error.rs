//! # Error Types
//!
//! Domain-specific error types for drogueria-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  drogueria-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── TenderError      - Amount-received failures at checkout           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  drogueria-http errors (separate crate)                                │
//! │  └── HttpError        - Transport / backend failures                   │
//! │                                                                         │
//! │  apps/caja errors                                                      │
//! │  └── PosError         - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError ← HttpError              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is raised before any network call is made, so state is
//! always unchanged when one of them is returned.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product code does not resolve against the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Client id does not resolve against the backend.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Product is flagged as deactivated by the backend.
    ///
    /// ## When This Occurs
    /// ```text
    /// Scan "7702…" ──► fue-eliminado? ──► true ──► RemovedProduct
    ///                                         │
    ///                                         └──► add is blocked
    /// ```
    #[error("Product {0} was removed and cannot be sold")]
    RemovedProduct(String),

    /// No cart line has the given identity key.
    #[error("No cart line for {product_code} ({unit_name})")]
    LineNotFound {
        product_code: String,
        unit_name: String,
    },

    /// A unit-of-sale index outside the loaded catalog.
    #[error("Unit of sale index {index} out of range ({len} units)")]
    UnitIndexOutOfRange { index: usize, len: usize },

    /// The selected product has no units of sale.
    #[error("Product {0} has no units of sale")]
    NoUnitsOfSale(String),

    /// Checkout attempted with no lines.
    #[error("No products have been added to the sale")]
    EmptyCart,

    /// A discount (or recomputation) would leave the total below zero.
    #[error("Discount of {discount} would make the total negative (total {total})")]
    NegativeTotal { total: Money, discount: Money },

    /// Amount received at checkout is not acceptable.
    #[error(transparent)]
    Tender(#[from] TenderError),

    /// Transfer from caja mayor larger than its last known balance.
    #[error("Transfer of {amount} exceeds caja mayor balance of {balance}")]
    TransferExceedsBalance { amount: Money, balance: Money },

    /// Checkout state machine received an action its phase does not allow.
    #[error("Cannot {action} while checkout is {phase}")]
    InvalidTransition { phase: String, action: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Tender Error
// =============================================================================

/// Failure modes for the amount received at checkout.
///
/// Each mode has its own message so the cashier knows what to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenderError {
    /// Nothing was typed.
    #[error("No amount received was entered")]
    Missing,

    /// Input is not a number.
    #[error("The amount received is not a number")]
    NotNumeric,

    /// Input is below the sale total.
    #[error("The amount received ({tendered}) is less than the sale total ({total})")]
    Insufficient { tendered: Money, total: Money },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a date that is not YYYY-MM-DD).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Several form fields failed at once.
    #[error("Missing required fields: {}", fields.join(", "))]
    IncompleteForm { fields: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::MustBePositive`].
    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
