//! # Query Router
//!
//! One entry point - "run this command, get back a row list" - that hides
//! whether execution is local-process (server) or proxied (browser).
//!
//! ## Backend Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Router Construction                                  │
//! │                                                                         │
//! │  StoreConfig::from_env()                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QueryRouter::connect(config)                                          │
//! │       │                                                                 │
//! │       ├── ExecutionContext::Server                                     │
//! │       │     └── DirectBackend over DATABASE_URL                        │
//! │       │         (missing/broken driver ⇒ StoreError::Unavailable)      │
//! │       │                                                                 │
//! │       └── ExecutionContext::Browser                                    │
//! │             └── RemoteBackend over OPREMA_API_BASE                     │
//! │                 with a LocalStore fallback in OPREMA_DATA_DIR          │
//! │                                                                         │
//! │  The backend is an owned StorageHandle constructed HERE, at startup,   │
//! │  and injected into the router - not a lazily-initialized module-level  │
//! │  singleton. Tests inject StorageHandle::Local directly.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::backend::{Backend, Rows};
use crate::command::{CategoryCommand, Command};
use crate::error::{StoreError, StoreResult};
use crate::local::LocalStore;
use crate::pool::{DbConfig, DirectBackend};
use crate::remote::RemoteBackend;

// =============================================================================
// Execution Context
// =============================================================================

/// Where the calling code runs, which decides how storage is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionContext {
    /// Server process: direct database access permitted.
    #[default]
    Server,
    /// Browser/client build: every query proxies over HTTP.
    Browser,
}

impl std::str::FromStr for ExecutionContext {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "server" => Ok(ExecutionContext::Server),
            "browser" | "client" => Ok(ExecutionContext::Browser),
            other => Err(StoreError::Unavailable(format!(
                "unknown execution context: '{}'. Valid options: server, browser",
                other
            ))),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Storage configuration, usually read from the environment.
///
/// ## Environment Variables
/// - `OPREMA_CONTEXT` - `server` (default) or `browser`
/// - `DATABASE_URL` - `sqlite://path/to/shop.db`; only read in the server
///   context. Its absence degrades the direct path but never blocks
///   browser-context operation, which always proxies.
/// - `OPREMA_API_BASE` - base URL of the query endpoint (browser context)
/// - `OPREMA_DATA_DIR` - where the durable fallback collections live
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub context: ExecutionContext,
    pub database_url: Option<String>,
    pub api_base: String,
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            context: ExecutionContext::Server,
            database_url: None,
            api_base: "http://localhost:3000".to_string(),
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl StoreConfig {
    /// Reads the configuration from the environment, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let context = std::env::var("OPREMA_CONTEXT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        StoreConfig {
            context,
            database_url: std::env::var("DATABASE_URL").ok(),
            api_base: std::env::var("OPREMA_API_BASE")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            data_dir: std::env::var("OPREMA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
        }
    }

    /// Sets the execution context.
    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Sets the database connection string.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the query-endpoint base URL.
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets the durable-collection directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Extracts the SQLite file path from the connection string.
    fn database_path(&self) -> Option<PathBuf> {
        let url = self.database_url.as_deref()?;
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        Some(PathBuf::from(path))
    }
}

// =============================================================================
// Storage Handle
// =============================================================================

/// The owned backend selection: one of the three interchangeable variants.
#[derive(Debug, Clone)]
pub enum StorageHandle {
    /// Server context: direct SQLite pool.
    Direct(DirectBackend),
    /// Browser context: HTTP proxy with local fallback.
    Proxied(RemoteBackend),
    /// Offline/test: the local emulation store alone.
    Local(LocalStore),
}

impl StorageHandle {
    async fn execute(&self, command: Command) -> StoreResult<Rows> {
        match self {
            StorageHandle::Direct(backend) => backend.execute(command).await,
            StorageHandle::Proxied(backend) => backend.execute(command).await,
            StorageHandle::Local(backend) => Backend::execute(backend, command).await,
        }
    }
}

// =============================================================================
// Query Router
// =============================================================================

/// The single storage entry point the domain services hold.
#[derive(Debug, Clone)]
pub struct QueryRouter {
    handle: Arc<StorageHandle>,
    /// Present when a local store participates (browser context or a
    /// directly injected local backend); carries reset capability.
    local: Option<LocalStore>,
}

impl QueryRouter {
    /// Builds the backend for the configured execution context.
    ///
    /// ## Errors
    /// [`StoreError::Unavailable`] in the server context when no connection
    /// string is configured or the pool cannot be constructed.
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        match config.context {
            ExecutionContext::Server => {
                let path = config.database_path().ok_or_else(|| {
                    StoreError::Unavailable("DATABASE_URL is not set".to_string())
                })?;
                let backend = DirectBackend::connect(DbConfig::new(path)).await?;
                info!("query router using direct backend");
                Ok(QueryRouter {
                    handle: Arc::new(StorageHandle::Direct(backend)),
                    local: None,
                })
            }
            ExecutionContext::Browser => {
                let local = LocalStore::spawn(config.data_dir.clone());
                let remote = RemoteBackend::new(&config.api_base, local.clone());
                info!(api_base = %config.api_base, "query router using remote proxy");
                Ok(QueryRouter {
                    handle: Arc::new(StorageHandle::Proxied(remote)),
                    local: Some(local),
                })
            }
        }
    }

    /// Wraps an explicitly constructed backend (dependency injection; the
    /// seam tests use).
    pub fn with_backend(handle: StorageHandle) -> Self {
        let local = match &handle {
            StorageHandle::Local(store) => Some(store.clone()),
            _ => None,
        };
        QueryRouter {
            handle: Arc::new(handle),
            local,
        }
    }

    /// Executes a typed command against the selected backend.
    pub async fn execute(&self, command: Command) -> StoreResult<Rows> {
        self.handle.execute(command).await
    }

    /// Clears the durable fallback collections back to the seed catalog.
    ///
    /// Only meaningful where a local store participates.
    pub async fn reset_local(&self) -> StoreResult<()> {
        match &self.local {
            Some(local) => local.reset().await,
            None => Err(StoreError::Unsupported {
                operation: "local.reset".to_string(),
            }),
        }
    }

    /// Cheap end-to-end probe: can the selected backend answer a query?
    pub async fn health_check(&self) -> bool {
        self.execute(Command::Category(CategoryCommand::List { active: None }))
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ProductCommand, ProductQuery};

    #[tokio::test]
    async fn test_server_context_without_database_url_is_unavailable() {
        let config = StoreConfig::default().context(ExecutionContext::Server);
        let err = QueryRouter::connect(config).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_injected_local_backend_serves_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::spawn(dir.path());
        let router = QueryRouter::with_backend(StorageHandle::Local(store));

        assert!(router.health_check().await);

        let rows = router
            .execute(Command::Product(ProductCommand::List(
                ProductQuery::default(),
            )))
            .await
            .unwrap();
        assert!(!rows.is_empty());

        router.reset_local().await.unwrap();
    }

    #[tokio::test]
    async fn test_context_parsing() {
        assert_eq!(
            "server".parse::<ExecutionContext>().unwrap(),
            ExecutionContext::Server
        );
        assert_eq!(
            "browser".parse::<ExecutionContext>().unwrap(),
            ExecutionContext::Browser
        );
        assert!("mainframe".parse::<ExecutionContext>().is_err());
    }
}
