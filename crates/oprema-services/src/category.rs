//! # Category Service
//!
//! Category CRUD plus the slug lookups the storefront router uses.
//!
//! ## Deletion Semantics
//! Deleting a category never cascades: children are detached first
//! (`parent_id` set to NULL, `updated_at` stamped), then the category row
//! is removed. Products keep their slug reference; the storefront simply
//! stops resolving it.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use oprema_core::validation::{validate_localized, validate_slug};
use oprema_core::{Category, Localized};
use oprema_store::{
    new_row_id, CategoryCommand, CategoryPatch, CategoryRow, Command, QueryRouter,
};

use crate::error::{ErrorCode, ServiceError, ServiceResult};
use crate::mapping::{category_from_row, double_option, parse_first, parse_rows};

// =============================================================================
// Inputs
// =============================================================================

/// Admin form payload for creating a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub slug: String,
    pub name: Localized,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i64,
}

fn default_active() -> bool {
    true
}

/// Partial category update; `parentId: null` detaches explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryUpdate {
    pub slug: Option<String>,
    pub name: Option<Localized>,
    pub description: Option<Localized>,
    #[serde(deserialize_with = "double_option")]
    pub parent_id: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub display_order: Option<i64>,
}

fn row_from_new(input: NewCategory) -> CategoryRow {
    let now = Utc::now();
    CategoryRow {
        id: new_row_id(),
        slug: input.slug,
        name_sr: input.name.sr,
        name_en: input.name.en,
        description_sr: input.description.sr,
        description_en: input.description.en,
        parent_id: input.parent_id,
        is_active: input.is_active,
        display_order: input.display_order,
        created_at: now,
        updated_at: now,
    }
}

fn patch_from_update(update: CategoryUpdate) -> CategoryPatch {
    let mut patch = CategoryPatch::default();
    patch.slug = update.slug;
    if let Some(name) = update.name {
        patch.name_sr = Some(name.sr);
        patch.name_en = Some(name.en);
    }
    if let Some(description) = update.description {
        patch.description_sr = Some(description.sr);
        patch.description_en = Some(description.en);
    }
    patch.parent_id = update.parent_id;
    patch.is_active = update.is_active;
    patch.display_order = update.display_order;
    patch
}

// =============================================================================
// Service
// =============================================================================

/// Category use cases over the query router.
#[derive(Debug, Clone)]
pub struct CategoryService {
    router: QueryRouter,
}

impl CategoryService {
    pub fn new(router: QueryRouter) -> Self {
        CategoryService { router }
    }

    // -------------------------------------------------------------------------
    // Reads (degrade silently)
    // -------------------------------------------------------------------------

    /// Categories ordered by display order. Pass `Some(true)` for the
    /// storefront (active only); `None` for the admin.
    pub async fn get_categories(&self, active: Option<bool>) -> Vec<Category> {
        let result: ServiceResult<Vec<Category>> = async {
            let rows = self
                .router
                .execute(Command::Category(CategoryCommand::List { active }))
                .await?;
            Ok(parse_rows::<CategoryRow>(rows)?
                .into_iter()
                .map(category_from_row)
                .collect())
        }
        .await;

        match result {
            Ok(categories) => categories,
            Err(err) => {
                warn!(error = %err, "get_categories failed, returning empty list");
                Vec::new()
            }
        }
    }

    pub async fn get_category(&self, id: &str) -> Option<Category> {
        self.lookup(CategoryCommand::Get { id: id.to_string() }, id)
            .await
    }

    /// Storefront routing: resolve `/kategorija/{slug}`.
    pub async fn get_category_by_slug(&self, slug: &str) -> Option<Category> {
        self.lookup(
            CategoryCommand::GetBySlug {
                slug: slug.to_string(),
            },
            slug,
        )
        .await
    }

    async fn lookup(&self, command: CategoryCommand, key: &str) -> Option<Category> {
        let result: ServiceResult<Option<Category>> = async {
            let rows = self.router.execute(Command::Category(command)).await?;
            Ok(parse_first::<CategoryRow>(rows)?.map(category_from_row))
        }
        .await;

        match result {
            Ok(category) => category,
            Err(err) => {
                warn!(key = %key, error = %err, "category lookup failed");
                None
            }
        }
    }

    /// Name projection for breadcrumbs; avoids hauling the whole row.
    pub async fn category_name(&self, id: &str) -> Option<Localized> {
        let result: ServiceResult<Option<Localized>> = async {
            let rows = self
                .router
                .execute(Command::Category(CategoryCommand::NameOf {
                    id: id.to_string(),
                }))
                .await?;
            Ok(rows.into_iter().next().map(|row| {
                Localized::new(
                    row["name_sr"].as_str().unwrap_or_default(),
                    row["name_en"].as_str().unwrap_or_default(),
                )
            }))
        }
        .await;

        match result {
            Ok(name) => name,
            Err(err) => {
                warn!(id = %id, error = %err, "category_name failed");
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Writes (surface errors)
    // -------------------------------------------------------------------------

    pub async fn create_category(&self, input: NewCategory) -> ServiceResult<Category> {
        validate_slug(&input.slug)?;
        validate_localized("name", &input.name)?;

        let row = row_from_new(input);
        info!(id = %row.id, slug = %row.slug, "creating category");

        let rows = self
            .router
            .execute(Command::Category(CategoryCommand::Insert(Box::new(row))))
            .await?;
        let row = parse_first::<CategoryRow>(rows)?
            .ok_or_else(|| ServiceError::new(ErrorCode::Internal, "insert returned no row"))?;
        Ok(category_from_row(row))
    }

    pub async fn update_category(
        &self,
        id: &str,
        update: CategoryUpdate,
    ) -> ServiceResult<Category> {
        if let Some(slug) = &update.slug {
            validate_slug(slug)?;
        }
        if let Some(name) = &update.name {
            validate_localized("name", name)?;
        }

        let rows = self
            .router
            .execute(Command::Category(CategoryCommand::Update {
                id: id.to_string(),
                patch: patch_from_update(update),
            }))
            .await?;
        let row = parse_first::<CategoryRow>(rows)?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        Ok(category_from_row(row))
    }

    /// Detaches children, then deletes the category itself.
    pub async fn delete_category(&self, id: &str) -> ServiceResult<()> {
        let detached = self
            .router
            .execute(Command::Category(CategoryCommand::DetachChildren {
                parent_id: id.to_string(),
            }))
            .await?;
        debug!(id = %id, detached = detached.len(), "detached children");

        let removed = self
            .router
            .execute(Command::Category(CategoryCommand::Delete {
                id: id.to_string(),
            }))
            .await?;
        info!(id = %id, removed = removed.len(), "delete_category");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oprema_store::{LocalStore, StorageHandle};

    fn local_service() -> (tempfile::TempDir, CategoryService) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::spawn(dir.path());
        let router = QueryRouter::with_backend(StorageHandle::Local(store));
        (dir, CategoryService::new(router))
    }

    fn sample_category(slug: &str, parent_id: Option<&str>) -> NewCategory {
        NewCategory {
            slug: slug.to_string(),
            name: Localized::new("Dodaci", "Accessories"),
            description: Localized::default(),
            parent_id: parent_id.map(str::to_string),
            is_active: true,
            display_order: 10,
        }
    }

    #[tokio::test]
    async fn test_slug_lookup_and_name_projection() {
        let (_dir, service) = local_service();

        let category = service.get_category_by_slug("punjaci").await.unwrap();
        assert_eq!(category.name.sr, "Punjači");

        let name = service.category_name(&category.id).await.unwrap();
        assert_eq!(name.en, "Chargers");
    }

    #[tokio::test]
    async fn test_delete_parent_detaches_children() {
        let (_dir, service) = local_service();

        let parent = service
            .create_category(sample_category("dodaci", None))
            .await
            .unwrap();
        let child = service
            .create_category(sample_category("drzaci", Some(&parent.id)))
            .await
            .unwrap();
        assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));

        service.delete_category(&parent.id).await.unwrap();

        assert!(service.get_category(&parent.id).await.is_none());
        let orphan = service.get_category(&child.id).await.unwrap();
        assert_eq!(orphan.parent_id, None);
        assert_eq!(orphan.slug, "drzaci");
        assert!(orphan.updated_at >= child.updated_at);
    }

    #[tokio::test]
    async fn test_update_can_detach_via_explicit_null() {
        let (_dir, service) = local_service();

        let parent = service
            .create_category(sample_category("dodaci", None))
            .await
            .unwrap();
        let child = service
            .create_category(sample_category("drzaci", Some(&parent.id)))
            .await
            .unwrap();

        let update: CategoryUpdate = serde_json::from_str(r#"{ "parentId": null }"#).unwrap();
        let updated = service.update_category(&child.id, update).await.unwrap();
        assert_eq!(updated.parent_id, None);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_slug() {
        let (_dir, service) = local_service();
        let err = service
            .create_category(sample_category("Velika Slova", None))
            .await
            .unwrap_err();
        assert!(matches!(err.code, ErrorCode::ValidationError));
    }
}
