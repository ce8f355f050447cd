//! # API Error Types
//!
//! The single error type every terminal command returns.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┤                                                     │
//! │  DbError ─────────┼──► ApiError { code, message } ──► till front end    │
//! │  SyncError ───────┘                                                     │
//! │                                                                         │
//! │  Storage details are logged here and replaced with a generic message.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use kaya_core::{CoreError, ValidationError};
use kaya_db::DbError;
use kaya_sync::SyncError;

/// Error returned from terminal commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 42"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Message suitable for the cashier
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Entity not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Ledger operation failed
    DatabaseError,

    /// Request is well-formed but not allowed in the current state
    BusinessLogic,

    /// Unexpected failure
    Internal,

    /// Cart operation failed
    CartError,

    /// Split payments do not cover the total
    PaymentError,

    /// Sync is offline, busy or failed
    SyncError,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id.to_string()),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessLogic, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    pub fn sync(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::SyncError, message)
    }
}

/// Converts ledger errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => {
                ApiError::validation(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::InvalidData { column, reason } => {
                tracing::error!(column = %column, "Stored value unreadable: {}", reason);
                ApiError::new(ErrorCode::DatabaseError, "Stored data could not be read")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::LineNotInCart(_)
            | CoreError::QuantityTooLarge { .. }
            | CoreError::EmptyCart => ApiError::cart(err.to_string()),
            CoreError::PaymentMismatch { .. } => {
                ApiError::new(ErrorCode::PaymentError, err.to_string())
            }
            CoreError::QuoteUnavailable | CoreError::QuoteNotConvertible { .. } => {
                ApiError::business(err.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Sync failures never block the till; they surface as a status message.
impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::DatabaseError(e) => {
                tracing::error!("Sync could not read the ledger: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            other => ApiError::sync(other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use kaya_core::Money;

    #[test]
    fn test_serializes_code_and_message() {
        let err = ApiError::not_found("Product", 42);
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: 42");
    }

    #[test]
    fn test_core_errors_map_to_codes() {
        assert_eq!(ApiError::from(CoreError::EmptyCart).code, ErrorCode::CartError);

        let mismatch = CoreError::PaymentMismatch {
            paid: Money::from_major(100),
            total: Money::from_cents(10350),
        };
        assert_eq!(ApiError::from(mismatch).code, ErrorCode::PaymentError);

        let invalid = CoreError::Validation(ValidationError::Required {
            field: "name".into(),
        });
        assert_eq!(ApiError::from(invalid).code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_db_details_are_hidden() {
        let err = ApiError::from(DbError::QueryFailed("no such table: orders".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("orders"));

        let err = ApiError::from(DbError::not_found("Batch", 7));
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_sync_errors_keep_their_message() {
        let err = ApiError::from(SyncError::PassInFlight);
        assert_eq!(err.code, ErrorCode::SyncError);
        assert_eq!(err.message, SyncError::PassInFlight.to_string());
    }
}
