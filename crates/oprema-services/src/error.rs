//! # Service Error Type
//!
//! Unified error type the frontend receives from every service method.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow                                           │
//! │                                                                         │
//! │  Frontend                    Service Layer                              │
//! │  ────────                    ─────────────                              │
//! │                                                                         │
//! │  getProducts()                                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  READ path: StoreError ──► warn! ──► return []  (no error banner,      │
//! │                                      empty list / loading state)       │
//! │                                                                         │
//! │  createProduct()                                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  WRITE path: ValidationError / StoreError ──► ServiceError ──► toast   │
//! │                                                                         │
//! │  This asymmetry - reads degrade silently, writes surface errors -      │
//! │  is the deliberate failure policy throughout.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! The frontend receives both a machine-readable `code` and a
//! human-readable `message`:
//! ```json
//! { "code": "NOT_FOUND", "message": "Product not found: p-123" }
//! ```

use serde::Serialize;

use oprema_core::{CoreError, ValidationError};
use oprema_store::StoreError;

/// Error returned from service methods that surface failures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code for programmatic handling.
    pub code: ErrorCode,

    /// Human-readable error message for display.
    pub message: String,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Error codes for service responses.
///
/// ## Usage in Frontend
/// ```typescript
/// try {
///   await createProduct(input);
/// } catch (e) {
///   switch (e.code) {
///     case 'VALIDATION_ERROR': showForm(e.message); break;
///     case 'NOT_FOUND': showNotification(e.message); break;
///     default: showError('Operation failed');
///   }
/// }
/// ```
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found.
    NotFound,

    /// Input validation failed.
    ValidationError,

    /// Storage operation failed.
    StorageError,

    /// The selected backend cannot perform this operation.
    Unsupported,

    /// Cart operation failed.
    CartError,

    /// Malformed payload (import, wire decoding).
    BadPayload,

    /// Anything else.
    Internal,
}

impl ServiceError {
    /// Creates a new service error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ServiceError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a bad-payload error.
    pub fn bad_payload(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::BadPayload, message)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::Unsupported { .. } => ErrorCode::Unsupported,
            StoreError::Serialization(_) => ErrorCode::BadPayload,
            _ => ErrorCode::StorageError,
        };
        ServiceError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::new(ErrorCode::ValidationError, err.to_string())
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_) => ErrorCode::ValidationError,
            _ => ErrorCode::CartError,
        };
        ServiceError::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::bad_payload(err.to_string())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_camel_case_envelope() {
        let err = ServiceError::not_found("Product", "p-123");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: p-123");
    }

    #[test]
    fn test_unsupported_store_errors_keep_their_code() {
        let store_err = StoreError::Unsupported {
            operation: "orders.list".into(),
        };
        let err = ServiceError::from(store_err);
        assert!(matches!(err.code, ErrorCode::Unsupported));
    }
}
