//! # Storage Error Types
//!
//! Error types for storage operations across all three backends.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite error (sqlx::Error) ──┐                                        │
//! │  HTTP error (reqwest::Error) ─┼──► StoreError (this module)            │
//! │  Bad payload (serde_json) ────┘         │                               │
//! │                                         ▼                               │
//! │  ServiceError (oprema-services) ← adds user-facing codes               │
//! │                                         │                               │
//! │                                         ▼                               │
//! │  Frontend toast / silent empty list, per the read/write policy         │
//! │                                                                         │
//! │  NOTE: Transport errors never leave the remote backend for catalog     │
//! │  queries - they are converted into a local-store fallback first.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The server execution context has no usable database.
    ///
    /// ## When This Occurs
    /// - `DATABASE_URL` is not set in a server-context process
    /// - The SQLite driver cannot open the file (permissions, disk full)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Database connection failed after the pool existed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed on the direct backend.
    ///
    /// Direct-execution errors are not caught anywhere below the services
    /// layer - they propagate to the caller.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The backend cannot execute this command.
    ///
    /// The local emulation store only carries the products and categories
    /// collections; anything else is a hard error rather than a silent
    /// empty result, so missing support can never masquerade as
    /// "no rows found".
    #[error("Unsupported operation for this backend: {operation}")]
    Unsupported { operation: String },

    /// HTTP transport failure (network unreachable, non-2xx status).
    ///
    /// Internal to the remote backend: converted into a local-store
    /// fallback and logged as a warning, never returned for catalog
    /// commands.
    #[error("Transport failed: {0}")]
    Transport(String),

    /// Malformed row or response payload.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable-collection file read/write failed.
    #[error("Local store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert sqlx errors to StoreError.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                StoreError::ConnectionFailed("connection pool exhausted".to_string())
            }
            sqlx::Error::PoolClosed => {
                StoreError::ConnectionFailed("connection pool is closed".to_string())
            }
            other => StoreError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
