//! # Product Service
//!
//! Use-case functions for the catalog: storefront listings, admin CRUD,
//! bulk operations, and the JSON import/export surface.
//!
//! ## Storefront vs Admin Reads
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_products(filters)   storefront; always status-filtered            │
//! │                          (draft products are never visible here)       │
//! │  list_all()              admin; every status, newest first             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use oprema_core::validation::{validate_localized, validate_price, validate_stock};
use oprema_core::{Localized, Product, ProductStatus};
use oprema_store::{
    new_row_id, Command, ProductCommand, ProductPatch, ProductQuery, ProductRow, QueryRouter,
};

use crate::error::{ErrorCode, ServiceError, ServiceResult};
use crate::mapping::{
    double_option, normalize_import_keys, parse_first, parse_rows, product_from_row,
};

// =============================================================================
// Inputs
// =============================================================================

/// Storefront listing filters. Absent fields don't filter; an absent status
/// means `active` - the storefront never sees drafts by accident.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductFilters {
    pub status: Option<ProductStatus>,
    pub category: Option<String>,
    pub on_sale: Option<bool>,
    pub is_new: Option<bool>,
    pub limit: Option<u32>,
}

impl ProductFilters {
    fn into_query(self) -> ProductQuery {
        ProductQuery {
            status: self.status.unwrap_or_default(),
            category: self.category,
            on_sale: self.on_sale,
            is_new: self.is_new,
            limit: self.limit,
        }
    }
}

/// Admin form payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: Localized,
    pub price_cents: i64,
    #[serde(default)]
    pub old_price_cents: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_on_sale: bool,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Admin form payload for a partial update. Absent fields stay untouched;
/// explicit `null` on the double-option fields clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
    pub title: Option<Localized>,
    pub price_cents: Option<i64>,
    #[serde(deserialize_with = "double_option")]
    pub old_price_cents: Option<Option<i64>>,
    #[serde(deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub stock: Option<i64>,
    pub status: Option<ProductStatus>,
    pub is_new: Option<bool>,
    pub is_on_sale: Option<bool>,
    pub description: Option<Localized>,
    #[serde(deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

fn row_from_new(input: NewProduct) -> ProductRow {
    let now = Utc::now();
    ProductRow {
        id: new_row_id(),
        title_sr: input.title.sr,
        title_en: input.title.en,
        price_cents: input.price_cents,
        old_price_cents: input.old_price_cents,
        category: input.category,
        stock: input.stock,
        status: input.status,
        is_new: input.is_new,
        is_on_sale: input.is_on_sale,
        description_sr: input.description.sr,
        description_en: input.description.en,
        image_url: input.image_url,
        created_at: now,
        updated_at: now,
    }
}

fn patch_from_update(update: ProductUpdate) -> ProductPatch {
    let mut patch = ProductPatch::default();
    if let Some(title) = update.title {
        patch.title_sr = Some(title.sr);
        patch.title_en = Some(title.en);
    }
    patch.price_cents = update.price_cents;
    patch.old_price_cents = update.old_price_cents;
    patch.category = update.category;
    patch.stock = update.stock;
    patch.status = update.status;
    patch.is_new = update.is_new;
    patch.is_on_sale = update.is_on_sale;
    if let Some(description) = update.description {
        patch.description_sr = Some(description.sr);
        patch.description_en = Some(description.en);
    }
    patch.image_url = update.image_url;
    patch
}

// =============================================================================
// Service
// =============================================================================

/// Product use cases over the query router.
#[derive(Debug, Clone)]
pub struct ProductService {
    router: QueryRouter,
}

impl ProductService {
    pub fn new(router: QueryRouter) -> Self {
        ProductService { router }
    }

    // -------------------------------------------------------------------------
    // Reads (degrade silently)
    // -------------------------------------------------------------------------

    /// Storefront listing. Failures log a warning and present as an empty
    /// list - no error banner.
    pub async fn get_products(&self, filters: ProductFilters) -> Vec<Product> {
        match self.fetch_products(filters).await {
            Ok(products) => products,
            Err(err) => {
                warn!(error = %err, "get_products failed, returning empty list");
                Vec::new()
            }
        }
    }

    async fn fetch_products(&self, filters: ProductFilters) -> ServiceResult<Vec<Product>> {
        let rows = self
            .router
            .execute(Command::Product(ProductCommand::List(filters.into_query())))
            .await?;
        Ok(parse_rows::<ProductRow>(rows)?
            .into_iter()
            .map(product_from_row)
            .collect())
    }

    /// Single product for the detail page; `None` on miss or failure.
    pub async fn get_product(&self, id: &str) -> Option<Product> {
        let result: ServiceResult<Option<Product>> = async {
            let rows = self
                .router
                .execute(Command::Product(ProductCommand::Get { id: id.to_string() }))
                .await?;
            Ok(parse_first::<ProductRow>(rows)?.map(product_from_row))
        }
        .await;

        match result {
            Ok(product) => product,
            Err(err) => {
                warn!(id = %id, error = %err, "get_product failed");
                None
            }
        }
    }

    /// Cart hydration: the products behind a list of ids.
    pub async fn get_products_by_ids(&self, ids: &[String]) -> Vec<Product> {
        if ids.is_empty() {
            return Vec::new();
        }
        let result: ServiceResult<Vec<Product>> = async {
            let rows = self
                .router
                .execute(Command::Product(ProductCommand::GetMany {
                    ids: ids.to_vec(),
                }))
                .await?;
            Ok(parse_rows::<ProductRow>(rows)?
                .into_iter()
                .map(product_from_row)
                .collect())
        }
        .await;

        match result {
            Ok(products) => products,
            Err(err) => {
                warn!(error = %err, "get_products_by_ids failed");
                Vec::new()
            }
        }
    }

    /// Admin listing: every status, newest first.
    pub async fn list_all(&self) -> Vec<Product> {
        let result: ServiceResult<Vec<Product>> = async {
            let rows = self
                .router
                .execute(Command::Product(ProductCommand::ListNewest))
                .await?;
            Ok(parse_rows::<ProductRow>(rows)?
                .into_iter()
                .map(product_from_row)
                .collect())
        }
        .await;

        match result {
            Ok(products) => products,
            Err(err) => {
                warn!(error = %err, "list_all failed, returning empty list");
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Writes (surface errors)
    // -------------------------------------------------------------------------

    /// Creates a product from the admin form.
    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<Product> {
        validate_localized("title", &input.title)?;
        validate_price("price", input.price_cents)?;
        validate_stock(input.stock)?;

        let row = row_from_new(input);
        info!(id = %row.id, title = %row.title_sr, "creating product");

        let rows = self
            .router
            .execute(Command::Product(ProductCommand::Insert(Box::new(row))))
            .await?;
        let row = parse_first::<ProductRow>(rows)?
            .ok_or_else(|| ServiceError::new(ErrorCode::Internal, "insert returned no row"))?;
        Ok(product_from_row(row))
    }

    /// Applies a partial update; untouched fields keep their values.
    pub async fn update_product(&self, id: &str, update: ProductUpdate) -> ServiceResult<Product> {
        if let Some(title) = &update.title {
            validate_localized("title", title)?;
        }
        if let Some(price) = update.price_cents {
            validate_price("price", price)?;
        }
        if let Some(stock) = update.stock {
            validate_stock(stock)?;
        }

        let patch = patch_from_update(update);
        debug!(id = %id, assignments = patch.assignments().len(), "updating product");

        let rows = self
            .router
            .execute(Command::Product(ProductCommand::Update {
                id: id.to_string(),
                patch,
            }))
            .await?;
        let row = parse_first::<ProductRow>(rows)?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        Ok(product_from_row(row))
    }

    /// Deletes a product. Deleting an id that is already gone is not an
    /// error - the admin's goal state is reached either way.
    pub async fn delete_product(&self, id: &str) -> ServiceResult<()> {
        let rows = self
            .router
            .execute(Command::Product(ProductCommand::Delete {
                id: id.to_string(),
            }))
            .await?;
        debug!(id = %id, removed = rows.len(), "delete_product");
        Ok(())
    }

    /// Bulk delete. An empty id list is a successful no-op.
    pub async fn bulk_delete(&self, ids: &[String]) -> ServiceResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let rows = self
            .router
            .execute(Command::Product(ProductCommand::DeleteMany {
                ids: ids.to_vec(),
            }))
            .await?;
        info!(requested = ids.len(), removed = rows.len(), "bulk_delete");
        Ok(rows.len())
    }

    // -------------------------------------------------------------------------
    // Import / Export
    // -------------------------------------------------------------------------

    /// Exports every product as a JSON array in storage-column naming,
    /// pretty-printed for the `.json` download the admin gets.
    pub async fn export_json(&self) -> ServiceResult<String> {
        let rows = self
            .router
            .execute(Command::Product(ProductCommand::ListNewest))
            .await?;
        info!(count = rows.len(), "exporting products");
        Ok(serde_json::to_string_pretty(&rows)?)
    }

    /// Imports a JSON array of product rows. Accepts storage-style
    /// (`price_cents`) and camelCase (`priceCents`) key spellings per row;
    /// rows without an id get a fresh one. Returns the imported count.
    pub async fn import_json(&self, payload: &str) -> ServiceResult<usize> {
        let values: Vec<serde_json::Value> = serde_json::from_str(payload)
            .map_err(|err| ServiceError::bad_payload(format!("expected a JSON array: {}", err)))?;

        let mut imported = 0;
        for value in values {
            let normalized = normalize_import_keys(value);
            let row: ProductRow = serde_json::from_value(normalized)
                .map_err(|err| ServiceError::bad_payload(format!("row {}: {}", imported + 1, err)))?;
            self.router
                .execute(Command::Product(ProductCommand::Insert(Box::new(row))))
                .await?;
            imported += 1;
        }

        info!(imported, "import complete");
        Ok(imported)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oprema_store::{DbConfig, DirectBackend, LocalStore, StorageHandle};

    fn sample_product(title_sr: &str, title_en: &str) -> NewProduct {
        NewProduct {
            title: Localized::new(title_sr, title_en),
            price_cents: 149_900,
            old_price_cents: None,
            category: Some("maske".into()),
            stock: 10,
            status: ProductStatus::Active,
            is_new: false,
            is_on_sale: false,
            description: Localized::new("Opis", "Description"),
            image_url: None,
        }
    }

    fn local_service() -> (tempfile::TempDir, ProductService) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::spawn(dir.path());
        let router = QueryRouter::with_backend(StorageHandle::Local(store));
        (dir, ProductService::new(router))
    }

    async fn direct_service() -> ProductService {
        let backend = DirectBackend::connect(DbConfig::in_memory()).await.unwrap();
        ProductService::new(QueryRouter::with_backend(StorageHandle::Direct(backend)))
    }

    #[tokio::test]
    async fn test_draft_products_hidden_from_storefront() {
        let (_dir, service) = local_service();

        let mut draft = sample_product("Nacrt", "Draft");
        draft.status = ProductStatus::Draft;
        let created = service.create_product(draft).await.unwrap();

        let storefront = service.get_products(ProductFilters::default()).await;
        assert!(storefront.iter().all(|p| p.id != created.id));

        let admin = service.list_all().await;
        assert!(admin.iter().any(|p| p.id == created.id));
    }

    #[tokio::test]
    async fn test_empty_update_touches_only_timestamp() {
        let (_dir, service) = local_service();
        let created = service
            .create_product(sample_product("Maska", "Case"))
            .await
            .unwrap();

        let updated = service
            .update_product(&created.id, ProductUpdate::default())
            .await
            .unwrap();

        assert_eq!(updated.title, created.title);
        assert_eq!(updated.price_cents, created.price_cents);
        assert_eq!(updated.old_price_cents, created.old_price_cents);
        assert_eq!(updated.stock, created.stock);
        assert_eq!(updated.status, created.status);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_clears_old_price_via_explicit_null() {
        let (_dir, service) = local_service();
        let mut input = sample_product("Maska", "Case");
        input.old_price_cents = Some(199_900);
        input.is_on_sale = true;
        let created = service.create_product(input).await.unwrap();
        assert_eq!(created.old_price_cents, Some(199_900));

        // Wire payload with an explicit null clears; absent keys don't.
        let update: ProductUpdate =
            serde_json::from_str(r#"{ "oldPriceCents": null, "isOnSale": false }"#).unwrap();
        let updated = service.update_product(&created.id, update).await.unwrap();

        assert_eq!(updated.old_price_cents, None);
        assert!(!updated.is_on_sale);
        assert_eq!(updated.price_cents, created.price_cents);
    }

    #[tokio::test]
    async fn test_bulk_delete_empty_is_noop() {
        let (_dir, service) = local_service();
        let removed = service.bulk_delete(&[]).await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_half_translated_title() {
        let (_dir, service) = local_service();
        let mut input = sample_product("Maska", "Case");
        input.title.en = String::new();

        let err = service.create_product(input).await.unwrap_err();
        assert!(matches!(err.code, ErrorCode::ValidationError));
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let source = direct_service().await;
        source
            .create_product(sample_product("Maska", "Case"))
            .await
            .unwrap();
        let mut charger = sample_product("Punjač", "Charger");
        charger.category = Some("punjaci".into());
        charger.price_cents = 249_900;
        charger.stock = 7;
        source.create_product(charger).await.unwrap();

        let exported = source.export_json().await.unwrap();

        let target = direct_service().await;
        let imported = target.import_json(&exported).await.unwrap();
        assert_eq!(imported, 2);

        let mut original = source.list_all().await;
        let mut round_tripped = target.list_all().await;
        original.sort_by(|a, b| a.title.sr.cmp(&b.title.sr));
        round_tripped.sort_by(|a, b| a.title.sr.cmp(&b.title.sr));

        for (a, b) in original.iter().zip(round_tripped.iter()) {
            assert_eq!(a.price_cents, b.price_cents);
            assert_eq!(a.stock, b.stock);
            assert_eq!(a.category, b.category);
            assert_eq!(a.title, b.title);
        }
    }

    #[tokio::test]
    async fn test_import_accepts_camel_case_rows_without_ids() {
        let service = direct_service().await;

        let payload = r#"[
            {
                "titleSr": "Uvezena maska",
                "titleEn": "Imported case",
                "priceCents": 99900,
                "stock": 3,
                "category": "maske"
            }
        ]"#;

        let imported = service.import_json(payload).await.unwrap();
        assert_eq!(imported, 1);

        let products = service.list_all().await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price_cents, 99_900);
        assert!(!products[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_non_array_payload() {
        let service = direct_service().await;
        let err = service.import_json("{\"not\": \"an array\"}").await.unwrap_err();
        assert!(matches!(err.code, ErrorCode::BadPayload));
    }
}
