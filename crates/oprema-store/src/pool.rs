//! # Direct Backend (Server Context)
//!
//! Connection pool creation and direct SQL execution for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Direct Backend                                     │
//! │                                                                         │
//! │  Server startup                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DirectBackend::connect(config).await ← Create pool + run migrations   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                   │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │  (max_connections)        │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │                           │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  execute(Command) ──► sql::render ──► bind params ──► fetch_all        │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                       rows decoded to JSON objects (column-keyed)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! WAL (Write-Ahead Logging) is enabled so readers don't block writers and
//! writers don't block readers, plus better crash recovery.
//!
//! The backend is an explicitly constructed, owned value injected into the
//! router at startup - there is no lazily-initialized module-level pool.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Column, Row, SqlitePool, TypeInfo};
use tracing::{debug, info};

use crate::backend::{Backend, Rows};
use crate::command::Command;
use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::sql::{self, SqlValue};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration for the direct backend.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/oprema/shop.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for the storefront API server)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// In-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let backend = DirectBackend::connect(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Direct Backend
// =============================================================================

/// The server-context backend: typed commands executed straight against a
/// SQLite connection pool.
#[derive(Debug, Clone)]
pub struct DirectBackend {
    pool: SqlitePool,
}

impl DirectBackend {
    /// Creates the connection pool and runs migrations.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite for storefront workloads:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    ///
    /// ## Errors
    /// [`StoreError::Unavailable`] when the pool cannot be constructed -
    /// the "server context without a usable database" case.
    pub async fn connect(config: DbConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = if config.database_path == PathBuf::from(":memory:") {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
        } else {
            // sqlite://path?mode=rwc creates the file if not exists
            let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
            SqliteConnectOptions::from_str(&connect_url)
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
                .create_if_missing(true)
        };

        let connect_options = connect_options
            // WAL mode: readers don't block writers and vice versa
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: durable enough, much faster than FULL
            .synchronous(SqliteSynchronous::Normal)
            // SQLite ships with foreign keys off for backwards compatibility
            .foreign_keys(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let backend = DirectBackend { pool };

        if config.run_migrations {
            migrations::run_migrations(&backend.pool).await?;
        }

        Ok(backend)
    }

    /// Returns a reference to the connection pool.
    ///
    /// For diagnostics and migrations tooling; prefer `execute` with typed
    /// commands everywhere else.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checks if the database can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Closes the connection pool (application shutdown).
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    async fn run(&self, command: &Command) -> StoreResult<Rows> {
        let statement = sql::render(command);
        debug!(command = command.describe(), sql = %statement.sql, "direct execute");

        let mut query = sqlx::query(&statement.sql);
        for param in &statement.params {
            query = match param {
                SqlValue::Null => query.bind(Option::<String>::None),
                SqlValue::Bool(v) => query.bind(*v),
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
                // Timestamps are stored as RFC 3339 TEXT so that
                // lexicographic ORDER BY equals chronological order.
                SqlValue::Timestamp(v) => query.bind(v.to_rfc3339()),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }
}

#[async_trait]
impl Backend for DirectBackend {
    /// Direct-execution errors are not caught here - they propagate to the
    /// caller, unlike the remote backend's fallback behavior.
    async fn execute(&self, command: Command) -> StoreResult<Rows> {
        self.run(&command).await
    }
}

// =============================================================================
// Row Decoding
// =============================================================================

/// Decodes a SQLite row into a JSON object keyed by column names, matching
/// the shape the `/api/db` endpoint and the local store produce.
fn row_to_json(row: &SqliteRow) -> StoreResult<serde_json::Value> {
    use serde_json::Value;

    let mut object = serde_json::Map::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = match column.type_info().name() {
            "INTEGER" => row
                .try_get::<Option<i64>, _>(index)?
                .map(|v| Value::Number(v.into()))
                .unwrap_or(Value::Null),
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(index)?
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            "REAL" => row
                .try_get::<Option<f64>, _>(index)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            "NULL" => Value::Null,
            // TEXT, DATETIME, and anything else declared as text-ish.
            _ => row
                .try_get::<Option<String>, _>(index)?
                .map(Value::String)
                .unwrap_or(Value::Null),
        };
        object.insert(column.name().to_string(), value);
    }

    Ok(serde_json::Value::Object(object))
}

// =============================================================================
// Unit Tests
// =============================================================================
