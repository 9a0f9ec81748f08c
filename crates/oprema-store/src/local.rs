//! # Local Emulation Store
//!
//! Durable offline emulation of the catalog backend: the fallback the query
//! proxy reaches for when the network is down.
//!
//! ## Single-Writer Actor
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    LocalStore Architecture                              │
//! │                                                                         │
//! │  RemoteBackend ──┐                                                     │
//! │  QueryRouter ────┼──► mpsc channel ──► Worker task                     │
//! │  SettingsService ┘        (FIFO)          │                             │
//! │                                           ▼                             │
//! │                              ┌─────────────────────────┐               │
//! │                              │ Collections (owned)     │               │
//! │                              │  products:   Vec<Row>   │               │
//! │                              │  categories: Vec<Row>   │               │
//! │                              └───────────┬─────────────┘               │
//! │                                          │ write-through               │
//! │                                          ▼                             │
//! │                              data_dir/mock_products.json               │
//! │                              data_dir/mock_categories.json             │
//! │                                                                         │
//! │  Exactly one operation runs at a time: concurrent callers queue on    │
//! │  the channel, so a read-modify-write can never lose an update.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scope
//! Only the two catalog collections are shadowed. Orders, customers, and
//! banners are online-only; commands for them come back as a hard
//! `Unsupported` error rather than a silent empty result.
//!
//! ## Durability
//! Collections are lazily loaded on first use (seeding the fixture catalog
//! when no files exist yet) and persisted write-through after every
//! mutation, so state survives process restarts. A corrupt file is logged
//! and replaced with the seed catalog rather than wedging the store.

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use oprema_core::ProductStatus;

use crate::backend::{Backend, Rows};
use crate::command::{CategoryCommand, Command, ProductCommand};
use crate::error::{StoreError, StoreResult};
use crate::rows::{new_row_id, CategoryRow, ProductRow};

/// Durable products collection file (one JSON array of rows).
pub const PRODUCTS_FILE: &str = "mock_products.json";

/// Durable categories collection file.
pub const CATEGORIES_FILE: &str = "mock_categories.json";

// =============================================================================
// Handle
// =============================================================================

/// Cloneable handle to the local store worker.
#[derive(Debug, Clone)]
pub struct LocalStore {
    tx: mpsc::Sender<Message>,
}

enum Message {
    Execute {
        command: Command,
        reply: oneshot::Sender<StoreResult<Rows>>,
    },
    /// Replay of rows a successful remote mutation returned, keeping the
    /// shadow collections consistent with the last known remote state.
    Absorb { command: Box<Command>, rows: Rows },
    Reset {
        reply: oneshot::Sender<StoreResult<()>>,
    },
}

impl LocalStore {
    /// Spawns the worker task and returns a handle to it.
    pub fn spawn(data_dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let worker = Worker {
            data_dir: data_dir.into(),
            rx,
            state: None,
        };
        tokio::spawn(worker.run());
        LocalStore { tx }
    }

    /// Executes a command against the durable collections.
    pub async fn execute(&self, command: Command) -> StoreResult<Rows> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Execute { command, reply })
            .await
            .map_err(|_| StoreError::ConnectionFailed("local store worker is gone".into()))?;
        rx.await
            .map_err(|_| StoreError::ConnectionFailed("local store dropped the reply".into()))?
    }

    /// Feeds rows returned by a successful remote mutation back into the
    /// shadow collections. Fire-and-forget: the proxy's reply to its caller
    /// does not wait on the bookkeeping.
    pub async fn absorb(&self, command: Command, rows: Rows) {
        if self
            .tx
            .send(Message::Absorb {
                command: Box::new(command),
                rows,
            })
            .await
            .is_err()
        {
            warn!("local store worker is gone, dropping remote replay");
        }
    }

    /// Clears both durable collections back to the seed catalog.
    pub async fn reset(&self) -> StoreResult<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Reset { reply })
            .await
            .map_err(|_| StoreError::ConnectionFailed("local store worker is gone".into()))?;
        rx.await
            .map_err(|_| StoreError::ConnectionFailed("local store dropped the reply".into()))?
    }
}

#[async_trait]
impl Backend for LocalStore {
    async fn execute(&self, command: Command) -> StoreResult<Rows> {
        LocalStore::execute(self, command).await
    }
}

// =============================================================================
// Worker
// =============================================================================

#[derive(Debug, Default)]
struct Collections {
    products: Vec<ProductRow>,
    categories: Vec<CategoryRow>,
}

struct Worker {
    data_dir: PathBuf,
    rx: mpsc::Receiver<Message>,
    /// Lazily initialized on first use; `None` until then.
    state: Option<Collections>,
}

impl Worker {
    async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Execute { command, reply } => {
                    let result = self.execute(command);
                    let _ = reply.send(result);
                }
                Message::Absorb { command, rows } => {
                    if let Err(err) = self.absorb(*command, rows) {
                        warn!(error = %err, "failed to absorb remote rows");
                    }
                }
                Message::Reset { reply } => {
                    let _ = reply.send(self.reset());
                }
            }
        }
        debug!("local store worker shutting down");
    }

    // -------------------------------------------------------------------------
    // Loading & persistence
    // -------------------------------------------------------------------------

    /// Returns the collections, loading the durable files (or seeding the
    /// fixture catalog) on first access.
    fn state(&mut self) -> StoreResult<&mut Collections> {
        if self.state.is_none() {
            let products = self.load_collection::<ProductRow>(PRODUCTS_FILE)?;
            let categories = self.load_collection::<CategoryRow>(CATEGORIES_FILE)?;

            let collections = match (products, categories) {
                (Some(products), Some(categories)) => Collections {
                    products,
                    categories,
                },
                _ => {
                    debug!("no durable collections found, seeding fixture catalog");
                    let seeded = seed_collections();
                    self.persist(&seeded)?;
                    seeded
                }
            };
            self.state = Some(collections);
        }
        match self.state.as_mut() {
            Some(state) => Ok(state),
            None => Err(StoreError::ConnectionFailed(
                "local store state missing after load".into(),
            )),
        }
    }

    fn load_collection<T: serde::de::DeserializeOwned>(
        &self,
        file: &str,
    ) -> StoreResult<Option<Vec<T>>> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str(&raw) {
            Ok(rows) => Ok(Some(rows)),
            Err(err) => {
                warn!(file = %path.display(), error = %err, "corrupt durable collection, reseeding");
                Ok(None)
            }
        }
    }

    /// Write-through persistence: every mutation lands on disk before the
    /// reply goes out.
    fn persist(&self, collections: &Collections) -> StoreResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        let products = serde_json::to_string_pretty(&collections.products)?;
        fs::write(self.data_dir.join(PRODUCTS_FILE), products)?;
        let categories = serde_json::to_string_pretty(&collections.categories)?;
        fs::write(self.data_dir.join(CATEGORIES_FILE), categories)?;
        Ok(())
    }

    fn persist_current(&self) -> StoreResult<()> {
        match &self.state {
            Some(state) => self.persist(state),
            None => Ok(()),
        }
    }

    fn reset(&mut self) -> StoreResult<()> {
        let seeded = seed_collections();
        self.persist(&seeded)?;
        self.state = Some(seeded);
        debug!("local store reset to seed catalog");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Typed dispatch
    // -------------------------------------------------------------------------

    fn execute(&mut self, command: Command) -> StoreResult<Rows> {
        debug!(command = command.describe(), "local store executing");
        match command {
            Command::Product(cmd) => self.execute_product(cmd),
            Command::Category(cmd) => self.execute_category(cmd),
            other => Err(StoreError::Unsupported {
                operation: other.describe().to_string(),
            }),
        }
    }

    fn execute_product(&mut self, cmd: ProductCommand) -> StoreResult<Rows> {
        match cmd {
            ProductCommand::List(query) => {
                let state = self.state()?;
                // Predicates apply in declaration order over the collection,
                // preserving insertion order; the limit slices last.
                let mut rows: Vec<&ProductRow> = state
                    .products
                    .iter()
                    .filter(|p| p.status == query.status)
                    .collect();
                if let Some(category) = &query.category {
                    rows.retain(|p| p.category.as_deref() == Some(category.as_str()));
                }
                if let Some(on_sale) = query.on_sale {
                    rows.retain(|p| p.is_on_sale == on_sale);
                }
                if let Some(is_new) = query.is_new {
                    rows.retain(|p| p.is_new == is_new);
                }
                if let Some(limit) = query.limit {
                    rows.truncate(limit as usize);
                }
                rows_to_json(rows)
            }
            ProductCommand::Get { id } => {
                let state = self.state()?;
                rows_to_json(state.products.iter().filter(|p| p.id == id))
            }
            ProductCommand::GetMany { ids } => {
                let state = self.state()?;
                rows_to_json(state.products.iter().filter(|p| ids.contains(&p.id)))
            }
            ProductCommand::ListNewest => {
                let state = self.state()?;
                let mut rows: Vec<&ProductRow> = state.products.iter().collect();
                rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                rows_to_json(rows)
            }
            ProductCommand::Insert(row) => {
                let mut row = *row;
                if row.id.is_empty() {
                    row.id = new_row_id();
                }
                let json = serde_json::to_value(&row)?;
                self.state()?.products.push(row);
                self.persist_current()?;
                Ok(vec![json])
            }
            ProductCommand::Update { id, patch } => {
                let state = self.state()?;
                let Some(row) = state.products.iter_mut().find(|p| p.id == id) else {
                    return Ok(Vec::new());
                };
                patch.apply(row);
                row.updated_at = Utc::now();
                let json = serde_json::to_value(&*row)?;
                self.persist_current()?;
                Ok(vec![json])
            }
            ProductCommand::Delete { id } => {
                let state = self.state()?;
                let Some(index) = state.products.iter().position(|p| p.id == id) else {
                    return Ok(Vec::new());
                };
                let removed = state.products.remove(index);
                let json = serde_json::to_value(&removed)?;
                self.persist_current()?;
                Ok(vec![json])
            }
            ProductCommand::DeleteMany { ids } => {
                let state = self.state()?;
                let mut removed = Vec::new();
                state.products.retain(|p| {
                    if ids.contains(&p.id) {
                        removed.push(p.clone());
                        false
                    } else {
                        true
                    }
                });
                let rows = rows_to_json(removed.iter())?;
                if !rows.is_empty() {
                    self.persist_current()?;
                }
                Ok(rows)
            }
        }
    }

    fn execute_category(&mut self, cmd: CategoryCommand) -> StoreResult<Rows> {
        match cmd {
            CategoryCommand::List { active } => {
                let state = self.state()?;
                let mut rows: Vec<&CategoryRow> = state
                    .categories
                    .iter()
                    .filter(|c| active.map_or(true, |a| c.is_active == a))
                    .collect();
                rows.sort_by_key(|c| c.display_order);
                rows_to_json(rows)
            }
            CategoryCommand::Get { id } => {
                let state = self.state()?;
                rows_to_json(state.categories.iter().filter(|c| c.id == id))
            }
            CategoryCommand::GetBySlug { slug } => {
                let state = self.state()?;
                rows_to_json(state.categories.iter().filter(|c| c.slug == slug))
            }
            CategoryCommand::NameOf { id } => {
                let state = self.state()?;
                Ok(state
                    .categories
                    .iter()
                    .filter(|c| c.id == id)
                    .map(|c| {
                        serde_json::json!({
                            "name_sr": c.name_sr,
                            "name_en": c.name_en,
                        })
                    })
                    .collect())
            }
            CategoryCommand::Insert(row) => {
                let mut row = *row;
                if row.id.is_empty() {
                    row.id = new_row_id();
                }
                let json = serde_json::to_value(&row)?;
                self.state()?.categories.push(row);
                self.persist_current()?;
                Ok(vec![json])
            }
            CategoryCommand::Update { id, patch } => {
                let state = self.state()?;
                let Some(row) = state.categories.iter_mut().find(|c| c.id == id) else {
                    return Ok(Vec::new());
                };
                patch.apply(row);
                row.updated_at = Utc::now();
                let json = serde_json::to_value(&*row)?;
                self.persist_current()?;
                Ok(vec![json])
            }
            CategoryCommand::DetachChildren { parent_id } => {
                let state = self.state()?;
                let now = Utc::now();
                let mut detached = Vec::new();
                for row in state
                    .categories
                    .iter_mut()
                    .filter(|c| c.parent_id.as_deref() == Some(parent_id.as_str()))
                {
                    row.parent_id = None;
                    row.updated_at = now;
                    detached.push(row.clone());
                }
                let rows = rows_to_json(detached.iter())?;
                if !rows.is_empty() {
                    self.persist_current()?;
                }
                Ok(rows)
            }
            CategoryCommand::Delete { id } => {
                let state = self.state()?;
                let Some(index) = state.categories.iter().position(|c| c.id == id) else {
                    return Ok(Vec::new());
                };
                let removed = state.categories.remove(index);
                let json = serde_json::to_value(&removed)?;
                self.persist_current()?;
                Ok(vec![json])
            }
        }
    }

    // -------------------------------------------------------------------------
    // Remote replay
    // -------------------------------------------------------------------------

    fn absorb(&mut self, command: Command, rows: Rows) -> StoreResult<()> {
        if !(command.is_mutating() && command.touches_catalog()) {
            return Ok(());
        }
        debug!(command = command.describe(), rows = rows.len(), "absorbing remote rows");

        match command {
            Command::Product(ProductCommand::Delete { id }) => {
                self.state()?.products.retain(|p| p.id != id);
            }
            Command::Product(ProductCommand::DeleteMany { ids }) => {
                self.state()?.products.retain(|p| !ids.contains(&p.id));
            }
            Command::Product(_) => {
                for row in rows {
                    match serde_json::from_value::<ProductRow>(row) {
                        Ok(parsed) => upsert_product(self.state()?, parsed),
                        Err(err) => warn!(error = %err, "skipping unparseable product row"),
                    }
                }
            }
            Command::Category(CategoryCommand::Delete { id }) => {
                self.state()?.categories.retain(|c| c.id != id);
            }
            Command::Category(_) => {
                for row in rows {
                    match serde_json::from_value::<CategoryRow>(row) {
                        Ok(parsed) => upsert_category(self.state()?, parsed),
                        Err(err) => warn!(error = %err, "skipping unparseable category row"),
                    }
                }
            }
            _ => {}
        }

        self.persist_current()
    }
}

fn upsert_product(state: &mut Collections, row: ProductRow) {
    match state.products.iter_mut().find(|p| p.id == row.id) {
        Some(existing) => *existing = row,
        None => state.products.push(row),
    }
}

fn upsert_category(state: &mut Collections, row: CategoryRow) {
    match state.categories.iter_mut().find(|c| c.id == row.id) {
        Some(existing) => *existing = row,
        None => state.categories.push(row),
    }
}

fn rows_to_json<'a, T, I>(rows: I) -> StoreResult<Rows>
where
    T: serde::Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    rows.into_iter()
        .map(|row| serde_json::to_value(row).map_err(StoreError::from))
        .collect()
}

// =============================================================================
// Seed Catalog
// =============================================================================

/// The fixture catalog the store seeds on first use: a believable slice of
/// a mobile-accessories shop, enough for the storefront to render while
/// offline.
fn seed_collections() -> Collections {
    let now = Utc::now();

    let categories = vec![
        CategoryRow {
            id: "c-101".into(),
            slug: "maske".into(),
            name_sr: "Maske za telefone".into(),
            name_en: "Phone cases".into(),
            description_sr: "Zaštitne maske za sve modele".into(),
            description_en: "Protective cases for all models".into(),
            parent_id: None,
            is_active: true,
            display_order: 1,
            created_at: now - Duration::days(30),
            updated_at: now - Duration::days(30),
        },
        CategoryRow {
            id: "c-102".into(),
            slug: "punjaci".into(),
            name_sr: "Punjači".into(),
            name_en: "Chargers".into(),
            description_sr: "Kućni i auto punjači".into(),
            description_en: "Wall and car chargers".into(),
            parent_id: None,
            is_active: true,
            display_order: 2,
            created_at: now - Duration::days(30),
            updated_at: now - Duration::days(30),
        },
        CategoryRow {
            id: "c-103".into(),
            slug: "slusalice".into(),
            name_sr: "Slušalice".into(),
            name_en: "Headphones".into(),
            description_sr: "Žičane i bežične slušalice".into(),
            description_en: "Wired and wireless headphones".into(),
            parent_id: None,
            is_active: true,
            display_order: 3,
            created_at: now - Duration::days(30),
            updated_at: now - Duration::days(30),
        },
    ];

    let products = vec![
        ProductRow {
            id: "p-1001".into(),
            title_sr: "Silikonska maska za iPhone 15".into(),
            title_en: "Silicone case for iPhone 15".into(),
            price_cents: 149_900,
            old_price_cents: Some(199_900),
            category: Some("maske".into()),
            stock: 25,
            status: ProductStatus::Active,
            is_new: false,
            is_on_sale: true,
            description_sr: "Mekana silikonska maska sa zaštitom kamere".into(),
            description_en: "Soft silicone case with camera protection".into(),
            image_url: Some("/images/products/maska-iphone-15.webp".into()),
            created_at: now - Duration::days(4),
            updated_at: now - Duration::days(4),
        },
        ProductRow {
            id: "p-1002".into(),
            title_sr: "USB-C punjač 30W".into(),
            title_en: "30W USB-C charger".into(),
            price_cents: 249_900,
            old_price_cents: None,
            category: Some("punjaci".into()),
            stock: 12,
            status: ProductStatus::Active,
            is_new: true,
            is_on_sale: false,
            description_sr: "Brzi punjač sa GaN tehnologijom".into(),
            description_en: "Fast charger with GaN technology".into(),
            image_url: Some("/images/products/punjac-30w.webp".into()),
            created_at: now - Duration::days(3),
            updated_at: now - Duration::days(3),
        },
        ProductRow {
            id: "p-1003".into(),
            title_sr: "Bežične slušalice".into(),
            title_en: "Wireless earbuds".into(),
            price_cents: 549_900,
            old_price_cents: Some(649_900),
            category: Some("slusalice".into()),
            stock: 5,
            status: ProductStatus::Active,
            is_new: false,
            is_on_sale: true,
            description_sr: "TWS slušalice sa kutijom za punjenje".into(),
            description_en: "TWS earbuds with charging case".into(),
            image_url: Some("/images/products/bezicne-slusalice.webp".into()),
            created_at: now - Duration::days(2),
            updated_at: now - Duration::days(2),
        },
        ProductRow {
            id: "p-1004".into(),
            title_sr: "Zaštitno staklo 9H".into(),
            title_en: "9H tempered glass".into(),
            price_cents: 79_900,
            old_price_cents: None,
            category: Some("maske".into()),
            stock: 40,
            status: ProductStatus::Active,
            is_new: true,
            is_on_sale: false,
            description_sr: "Kaljeno staklo pune pokrivenosti".into(),
            description_en: "Full-coverage tempered glass".into(),
            image_url: Some("/images/products/zastitno-staklo.webp".into()),
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
        },
    ];

    Collections {
        products,
        categories,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ProductQuery;
    use crate::rows::ProductPatch;
    use oprema_core::OrderStatus;

    fn test_product(id: &str, category: &str, on_sale: bool, is_new: bool) -> ProductRow {
        ProductRow {
            id: id.to_string(),
            title_sr: format!("Proizvod {}", id),
            title_en: format!("Product {}", id),
            price_cents: 100_000,
            old_price_cents: None,
            category: Some(category.to_string()),
            stock: 10,
            status: ProductStatus::Active,
            is_new,
            is_on_sale: on_sale,
            description_sr: String::new(),
            description_en: String::new(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn spawn_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::spawn(dir.path());
        (dir, store)
    }

    async fn insert_product(store: &LocalStore, row: ProductRow) {
        store
            .execute(Command::Product(ProductCommand::Insert(Box::new(row))))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_seeds_fixture_catalog_on_first_use() {
        let (_dir, store) = spawn_store();

        let rows = store
            .execute(Command::Product(ProductCommand::List(
                ProductQuery::default(),
            )))
            .await
            .unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["id"], "p-1001");
    }

    #[tokio::test]
    async fn test_filters_apply_in_sequence_preserving_order() {
        let (_dir, store) = spawn_store();
        insert_product(&store, test_product("t-1", "test-cat", true, false)).await;
        insert_product(&store, test_product("t-2", "test-cat", true, true)).await;
        insert_product(&store, test_product("t-3", "test-cat", false, true)).await;
        insert_product(&store, test_product("t-4", "other-cat", true, true)).await;

        // category ∩ on_sale
        let rows = store
            .execute(Command::Product(ProductCommand::List(ProductQuery {
                category: Some("test-cat".into()),
                on_sale: Some(true),
                ..Default::default()
            })))
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["t-1", "t-2"]);

        // category ∩ on_sale ∩ is_new, limited
        let rows = store
            .execute(Command::Product(ProductCommand::List(ProductQuery {
                category: Some("test-cat".into()),
                on_sale: Some(true),
                is_new: Some(true),
                limit: Some(1),
                ..Default::default()
            })))
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["t-2"]);
    }

    #[tokio::test]
    async fn test_draft_products_invisible_to_default_listing() {
        let (_dir, store) = spawn_store();
        let mut draft = test_product("t-draft", "test-cat", false, false);
        draft.status = ProductStatus::Draft;
        insert_product(&store, draft).await;

        let rows = store
            .execute(Command::Product(ProductCommand::List(
                ProductQuery::default(),
            )))
            .await
            .unwrap();
        assert!(rows.iter().all(|r| r["id"] != "t-draft"));

        // The admin listing still sees it.
        let rows = store
            .execute(Command::Product(ProductCommand::ListNewest))
            .await
            .unwrap();
        assert!(rows.iter().any(|r| r["id"] == "t-draft"));
    }

    #[tokio::test]
    async fn test_update_applies_patch_and_stamps_timestamp() {
        let (_dir, store) = spawn_store();

        let before = store
            .execute(Command::Product(ProductCommand::Get {
                id: "p-1001".into(),
            }))
            .await
            .unwrap();
        let old_stamp = before[0]["updated_at"].as_str().unwrap().to_string();

        let rows = store
            .execute(Command::Product(ProductCommand::Update {
                id: "p-1001".into(),
                patch: ProductPatch {
                    price_cents: Some(129_900),
                    old_price_cents: Some(None),
                    ..Default::default()
                },
            }))
            .await
            .unwrap();

        assert_eq!(rows[0]["price_cents"], 129_900);
        assert!(rows[0]["old_price_cents"].is_null());
        assert_ne!(rows[0]["updated_at"].as_str().unwrap(), old_stamp);
        // Untouched fields survive.
        assert_eq!(rows[0]["title_sr"], "Silikonska maska za iPhone 15");
    }

    #[tokio::test]
    async fn test_update_of_missing_row_returns_empty() {
        let (_dir, store) = spawn_store();
        let rows = store
            .execute(Command::Product(ProductCommand::Update {
                id: "no-such".into(),
                patch: ProductPatch::default(),
            }))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_delete_returns_removed_row() {
        let (_dir, store) = spawn_store();

        let rows = store
            .execute(Command::Product(ProductCommand::Delete {
                id: "p-1004".into(),
            }))
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], "p-1004");

        let again = store
            .execute(Command::Product(ProductCommand::Delete {
                id: "p-1004".into(),
            }))
            .await
            .unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_survive_worker_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = LocalStore::spawn(dir.path());
            insert_product(&store, test_product("t-durable", "test-cat", false, false)).await;
        }

        // Fresh worker over the same data dir sees the write.
        let store = LocalStore::spawn(dir.path());
        let rows = store
            .execute(Command::Product(ProductCommand::Get {
                id: "t-durable".into(),
            }))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_restores_seed_catalog() {
        let (_dir, store) = spawn_store();
        insert_product(&store, test_product("t-extra", "test-cat", false, false)).await;

        store.reset().await.unwrap();

        let rows = store
            .execute(Command::Product(ProductCommand::ListNewest))
            .await
            .unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r["id"] != "t-extra"));
    }

    #[tokio::test]
    async fn test_detach_children_nulls_parent_and_stamps() {
        let (_dir, store) = spawn_store();

        let child = CategoryRow {
            id: "c-child".into(),
            slug: "auto-punjaci".into(),
            name_sr: "Auto punjači".into(),
            name_en: "Car chargers".into(),
            description_sr: String::new(),
            description_en: String::new(),
            parent_id: Some("c-102".into()),
            is_active: true,
            display_order: 9,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store
            .execute(Command::Category(CategoryCommand::Insert(Box::new(child))))
            .await
            .unwrap();

        let detached = store
            .execute(Command::Category(CategoryCommand::DetachChildren {
                parent_id: "c-102".into(),
            }))
            .await
            .unwrap();
        assert_eq!(detached.len(), 1);
        assert!(detached[0]["parent_id"].is_null());
        // Other fields untouched.
        assert_eq!(detached[0]["slug"], "auto-punjaci");

        store
            .execute(Command::Category(CategoryCommand::Delete {
                id: "c-102".into(),
            }))
            .await
            .unwrap();

        let remaining = store
            .execute(Command::Category(CategoryCommand::GetBySlug {
                slug: "auto-punjaci".into(),
            }))
            .await
            .unwrap();
        assert!(remaining[0]["parent_id"].is_null());
    }

    #[tokio::test]
    async fn test_category_listing_sorted_by_display_order() {
        let (_dir, store) = spawn_store();
        let rows = store
            .execute(Command::Category(CategoryCommand::List { active: None }))
            .await
            .unwrap();
        let orders: Vec<i64> = rows
            .iter()
            .map(|r| r["display_order"].as_i64().unwrap())
            .collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        assert_eq!(orders, sorted);
    }

    #[tokio::test]
    async fn test_unsupported_commands_are_hard_errors() {
        let (_dir, store) = spawn_store();
        let err = store
            .execute(Command::Order(crate::command::OrderCommand::SetStatus {
                id: "o-1".into(),
                status: OrderStatus::Shipped,
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_absorb_upserts_remote_rows() {
        let (_dir, store) = spawn_store();

        let replayed = serde_json::to_value(test_product("t-remote", "maske", false, true)).unwrap();
        store
            .absorb(
                Command::Product(ProductCommand::Insert(Box::new(test_product(
                    "t-remote", "maske", false, true,
                )))),
                vec![replayed],
            )
            .await;

        let rows = store
            .execute(Command::Product(ProductCommand::Get {
                id: "t-remote".into(),
            }))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["category"], "maske");
    }
}
