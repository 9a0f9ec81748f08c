//! # Backend Capability Interface
//!
//! One contract implemented by all three storage backends.
//!
//! ## The Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   execute(Command) -> Result<Rows, StoreError>                          │
//! │                                                                         │
//! │   DirectBackend   server context, SQLite pool                          │
//! │   RemoteBackend   browser context, POST /api/db + local fallback       │
//! │   LocalStore      offline emulation over durable JSON collections      │
//! │                                                                         │
//! │   Rows are JSON objects keyed by storage column names, identical in    │
//! │   shape across backends - which is what makes them interchangeable.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no duck typing and no ad hoc try/catch fallthrough: a backend
//! either returns rows or a typed [`StoreError`].

use async_trait::async_trait;

use crate::command::Command;
use crate::error::StoreResult;

/// A result set: JSON objects keyed by storage column names.
pub type Rows = Vec<serde_json::Value>;

/// The single capability interface every backend variant implements.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Executes a typed storage command and returns the resulting rows.
    ///
    /// Mutations return the affected rows (the backends' statements all end
    /// in `RETURNING *`; the local store mirrors that shape).
    async fn execute(&self, command: Command) -> StoreResult<Rows>;
}
