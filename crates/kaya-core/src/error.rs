//! # Error Types
//!
//! Domain errors for kaya-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kaya-core (this file)                                                  │
//! │  ├── ValidationError  - Bad input at the command boundary               │
//! │  └── CoreError        - Cart / checkout / quote rule violations         │
//! │                                                                         │
//! │  kaya-db                                                                │
//! │  └── DbError          - Ledger read/write failures                      │
//! │                                                                         │
//! │  kaya-sync                                                              │
//! │  └── SyncError        - Transport and protocol failures                 │
//! │                                                                         │
//! │  apps/terminal                                                          │
//! │  └── ApiError         - What the operator sees (code + message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                   │
//! │                          DbError ───┼──► ApiError                       │
//! │                          SyncError ─┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::types::LocalId;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart and checkout logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A product referenced by id does not exist (or is no longer active).
    #[error("Product not found: {0}")]
    ProductNotFound(LocalId),

    /// The cart holds no line for this product.
    #[error("Product {0} is not in the cart")]
    LineNotInCart(LocalId),

    /// A line quantity above the largest the till accepts.
    #[error("Quantity for product {product_id} cannot exceed {max}")]
    QuantityTooLarge { product_id: LocalId, max: i64 },

    /// Checkout, draft or quote requested on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Split payments do not add up to the order total.
    ///
    /// ## When This Occurs
    /// ```text
    /// total 103.50
    /// cash   50.00 + momo 50.00 = 100.00
    ///        │
    ///        ▼
    /// |100.00 − 103.50| ≥ 0.005  →  PaymentMismatch
    /// ```
    #[error("Payments total {paid} does not match order total {total}")]
    PaymentMismatch { paid: Money, total: Money },

    /// None of the quote's products exist any more.
    #[error("Products in this quote are no longer available.")]
    QuoteUnavailable,

    /// The quote is converted or past its validity.
    #[error("Quote {id} is {status} and cannot be converted")]
    QuoteNotConvertible { id: LocalId, status: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any business logic runs.
#[derive(Debug, Error)]
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

    /// Value must be greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be below zero.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (colour, date...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (category name, barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
