//! # Remote Backend (Browser Context)
//!
//! Transports a rendered statement to the server's query endpoint and masks
//! transport failure with the local emulation store.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Remote Proxy Flow                                    │
//! │                                                                         │
//! │  execute(Command)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sql::render ──► POST {base}/api/db  { "query": ..., "params": [...] } │
//! │       │                                                                 │
//! │       ├── 2xx ──► decode { "data": [rows] }                            │
//! │       │             │                                                   │
//! │       │             └── mutating catalog command? replay rows into     │
//! │       │                 the local store (keeps fallback reads          │
//! │       │                 consistent with last known remote state)       │
//! │       │                                                                 │
//! │       └── network error / non-2xx                                      │
//! │             │                                                           │
//! │             ▼                                                           │
//! │          warn! + LocalStore.execute(command)   ← NEVER raises a        │
//! │                                                  transport error       │
//! │                                                                         │
//! │  The fallback itself can still fail (e.g. an orders command, which     │
//! │  the local store doesn't carry) - that error DOES propagate.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{Backend, Rows};
use crate::command::Command;
use crate::error::{StoreError, StoreResult};
use crate::local::LocalStore;
use crate::sql::{self, SqlValue, Statement};

/// Wire request body for the query endpoint.
#[derive(Debug, Serialize)]
struct DbRequest<'a> {
    query: &'a str,
    params: &'a [SqlValue],
}

/// Wire response body: a row list under `data`.
#[derive(Debug, Deserialize)]
struct DbResponse {
    data: Rows,
}

/// The browser-context backend: JSON-over-HTTP proxy with local fallback.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    http: reqwest::Client,
    endpoint: String,
    fallback: LocalStore,
}

impl RemoteBackend {
    /// Creates a proxy client against `{base_url}/api/db` with the given
    /// local store as its offline fallback.
    pub fn new(base_url: &str, fallback: LocalStore) -> Self {
        RemoteBackend {
            http: reqwest::Client::new(),
            endpoint: format!("{}/api/db", base_url.trim_end_matches('/')),
            fallback,
        }
    }

    async fn post(&self, statement: &Statement) -> StoreResult<Rows> {
        let request = DbRequest {
            query: &statement.sql,
            params: &statement.params,
        };

        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Transport(format!(
                "query endpoint returned {}",
                status
            )));
        }

        let body: DbResponse = response.json().await?;
        Ok(body.data)
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn execute(&self, command: Command) -> StoreResult<Rows> {
        let statement = sql::render(&command);
        debug!(command = command.describe(), "proxying query");

        match self.post(&statement).await {
            Ok(rows) => {
                if command.is_mutating() && command.touches_catalog() {
                    // Sync side channel: mirror the written rows so later
                    // fallback reads agree with the remote state.
                    self.fallback.absorb(command, rows.clone()).await;
                }
                Ok(rows)
            }
            Err(err) => {
                warn!(
                    command = command.describe(),
                    error = %err,
                    "query proxy failed, falling back to local store"
                );
                self.fallback.execute(command).await
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{OrderCommand, ProductCommand, ProductQuery};
    use oprema_core::OrderStatus;

    /// Port 9 (discard) on localhost: connection refused immediately, which
    /// is exactly the "network unreachable" failure mode.
    fn dead_proxy() -> (tempfile::TempDir, RemoteBackend) {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::spawn(dir.path());
        let remote = RemoteBackend::new("http://127.0.0.1:9", local);
        (dir, remote)
    }

    #[tokio::test]
    async fn test_transport_failure_falls_back_to_seeded_fixtures() {
        let (_dir, remote) = dead_proxy();

        let rows = remote
            .execute(Command::Product(ProductCommand::List(
                ProductQuery::default(),
            )))
            .await
            .unwrap();

        // The caller receives the local store's seed catalog, not an error.
        assert!(!rows.is_empty());
        assert_eq!(rows[0]["id"], "p-1001");
    }

    #[tokio::test]
    async fn test_catalog_writes_fall_back_and_stay_readable() {
        let (_dir, remote) = dead_proxy();

        let row = crate::rows::ProductRow {
            id: "p-offline".into(),
            title_sr: "Offline proizvod".into(),
            title_en: "Offline product".into(),
            price_cents: 99_900,
            old_price_cents: None,
            category: Some("maske".into()),
            stock: 2,
            status: oprema_core::ProductStatus::Active,
            is_new: false,
            is_on_sale: false,
            description_sr: String::new(),
            description_en: String::new(),
            image_url: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        remote
            .execute(Command::Product(ProductCommand::Insert(Box::new(row))))
            .await
            .unwrap();

        let rows = remote
            .execute(Command::Product(ProductCommand::Get {
                id: "p-offline".into(),
            }))
            .await
            .unwrap();
        assert_eq!(rows[0]["stock"], 2);
    }

    #[tokio::test]
    async fn test_non_catalog_fallback_surfaces_unsupported() {
        let (_dir, remote) = dead_proxy();

        let err = remote
            .execute(Command::Order(OrderCommand::SetStatus {
                id: "o-1".into(),
                status: OrderStatus::Shipped,
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Unsupported { .. }));
    }
}
