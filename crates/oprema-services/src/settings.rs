//! # Settings Service
//!
//! The admin settings surface that belongs to the data-access core: local
//! data reset and a storage health probe. (Shop profile, theme, and other
//! display preferences are frontend concerns and live elsewhere.)

use tracing::{info, warn};

use oprema_store::QueryRouter;

use crate::error::ServiceResult;

/// Maintenance operations over the query router.
#[derive(Debug, Clone)]
pub struct SettingsService {
    router: QueryRouter,
}

impl SettingsService {
    pub fn new(router: QueryRouter) -> Self {
        SettingsService { router }
    }

    /// Clears the durable offline collections back to the seed catalog.
    ///
    /// The admin "Reset local data" button; the frontend forces a full
    /// reload afterwards so every view refetches.
    pub async fn reset_local_data(&self) -> ServiceResult<()> {
        if let Err(err) = self.router.reset_local().await {
            warn!(error = %err, "reset_local_data failed");
            return Err(err.into());
        }
        info!("local data reset to seed catalog");
        Ok(())
    }

    /// True when the selected backend can answer a query end to end.
    pub async fn health_check(&self) -> bool {
        self.router.health_check().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oprema_store::{
        Command, LocalStore, ProductCommand, ProductPatch, QueryRouter, StorageHandle,
    };

    #[tokio::test]
    async fn test_reset_discards_local_edits() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::spawn(dir.path());
        let router = QueryRouter::with_backend(StorageHandle::Local(store));
        let service = SettingsService::new(router.clone());

        assert!(service.health_check().await);

        router
            .execute(Command::Product(ProductCommand::Update {
                id: "p-1001".into(),
                patch: ProductPatch {
                    stock: Some(0),
                    ..Default::default()
                },
            }))
            .await
            .unwrap();

        service.reset_local_data().await.unwrap();

        let rows = router
            .execute(Command::Product(ProductCommand::Get {
                id: "p-1001".into(),
            }))
            .await
            .unwrap();
        assert_eq!(rows[0]["stock"], 25);
    }
}
